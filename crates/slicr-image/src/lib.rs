#![deny(missing_docs)]
//! Image types for planar, column-major pixel buffers

/// image representation for superpixel processing.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
