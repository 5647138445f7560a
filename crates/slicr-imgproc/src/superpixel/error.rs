use crate::parallel::ParallelError;
use slicr_image::ImageError;

/// An error type for the superpixel module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SuperpixelError {
    /// The image is empty or the pixel buffer does not match the image size.
    #[error("Invalid dimensions: {width}x{height} image with {len} values, expected {expected}")]
    InvalidDimensions {
        /// Width of the image in pixels.
        width: usize,
        /// Height of the image in pixels.
        height: usize,
        /// Length of the supplied pixel buffer.
        len: usize,
        /// Expected length of the pixel buffer.
        expected: usize,
    },

    /// A segmentation parameter is out of range.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A working buffer could not be allocated.
    #[error("Failed to allocate a buffer of {0} elements")]
    AllocationFailure(usize),

    /// Error from the image containers.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error while setting up parallel execution.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

/// Allocate a buffer of `len` copies of `val`, reporting allocation failure as an error.
pub(crate) fn try_alloc<T: Clone>(len: usize, val: T) -> Result<Vec<T>, SuperpixelError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| SuperpixelError::AllocationFailure(len))?;
    buffer.resize(len, val);
    Ok(buffer)
}
