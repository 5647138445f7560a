use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels. It also owns the
/// pixel addressing convention shared by every buffer in this workspace:
/// pixels are flattened column by column, `index = x * height + y`, so `x`
/// is the slow (strip) index and `y` the fast index within a column.
///
/// # Examples
///
/// ```
/// use slicr_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// assert_eq!(image_size.index(1, 2), 22);
/// assert_eq!(image_size.coords(22), (1, 2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

impl ImageSize {
    /// Total number of pixels.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    /// Linear index of the pixel at `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    /// Pixel coordinates `(x, y)` of a linear index.
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.height, index % self.height)
    }

    /// Offset `(x, y)` by `(dx, dy)`, returning `None` when the result leaves the image.
    #[inline]
    pub fn offset(&self, x: usize, y: usize, dx: isize, dy: isize) -> Option<(usize, usize)> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < self.width && ny < self.height).then_some((nx, ny))
    }
}

/// Represents an image with planar pixel data.
///
/// The `CHANNELS` planes are stored back to back, each one holding
/// `width * height` values in the column-major order of [`ImageSize::index`].
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from planar pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data, channel after channel, column-major within a channel.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use slicr_image::{Image, ImageSize};
    ///
    /// let image = Image::<f32, 3>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0f32; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.num_pixels() * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size where every value is `val`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slicr_image::{Image, ImageSize};
    ///
    /// let image = Image::<i32, 1>::from_size_val([4, 5].into(), -1).unwrap();
    ///
    /// assert_eq!(image.as_slice().len(), 20);
    /// assert!(image.as_slice().iter().all(|&v| v == -1));
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let data = vec![val; size.num_pixels() * CHANNELS];
        Image::new(size, data)
    }

    /// Create a planar image from interleaved, row-major pixel data.
    ///
    /// This is the layout produced by most image decoders: `[r, g, b, r, g, b, ...]`
    /// with rows stored one after the other.
    ///
    /// # Examples
    ///
    /// ```
    /// use slicr_image::{Image, ImageSize};
    ///
    /// // 2x1 image: a red pixel followed by a blue one
    /// let image = Image::<u8, 3>::from_interleaved(
    ///     ImageSize { width: 2, height: 1 },
    ///     &[255, 0, 0, 0, 0, 255],
    /// ).unwrap();
    ///
    /// assert_eq!(image.get(0, 0, 0), Some(&255));
    /// assert_eq!(image.get(1, 0, 2), Some(&255));
    /// ```
    pub fn from_interleaved(size: ImageSize, data: &[T]) -> Result<Self, ImageError>
    where
        T: Copy + Default,
    {
        let expected = size.num_pixels() * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        let num_pixels = size.num_pixels();
        let mut planar = vec![T::default(); expected];
        for (i, pixel) in data.chunks_exact(CHANNELS).enumerate() {
            let (x, y) = (i % size.width, i / size.width);
            let dst = size.index(x, y);
            for (c, &v) in pixel.iter().enumerate() {
                planar[c * num_pixels + dst] = v;
            }
        }

        Image::new(size, planar)
    }

    /// Export the pixel data as interleaved, row-major values.
    pub fn to_interleaved(&self) -> Vec<T>
    where
        T: Copy,
    {
        let num_pixels = self.size.num_pixels();
        let mut out = Vec::with_capacity(self.data.len());
        for y in 0..self.height() {
            for x in 0..self.width() {
                let src = self.size.index(x, y);
                for c in 0..CHANNELS {
                    out.push(self.data[c * num_pixels + src]);
                }
            }
        }
        out
    }

    /// Cast the pixel data to a different type and scale it.
    ///
    /// # Errors
    ///
    /// If a pixel value cannot be represented in the new type, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use slicr_image::{Image, ImageSize};
    ///
    /// let image_u8 = Image::<u8, 1>::new([2, 1].into(), vec![0, 255]).unwrap();
    /// let image_f32 = image_u8.cast_and_scale::<f32>(1. / 255.).unwrap();
    ///
    /// assert_eq!(image_f32.as_slice(), &[0.0, 1.0]);
    /// ```
    pub fn cast_and_scale<U>(&self, scale: U) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: num_traits::NumCast + std::ops::Mul<Output = U> + Copy,
        T: num_traits::NumCast + Copy,
    {
        let casted_data = self
            .data
            .iter()
            .map(|&x| {
                let xu = U::from(x).ok_or(ImageError::CastError)?;
                Ok(xu * scale)
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, casted_data)
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Get the raw planar data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the raw planar data mutably.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return the raw planar data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get one channel plane.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn channel(&self, channel: usize) -> Result<&[T], ImageError> {
        if channel >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(channel, CHANNELS));
        }
        let n = self.size.num_pixels();
        Ok(&self.data[channel * n..(channel + 1) * n])
    }

    /// Get all channel planes.
    pub fn channels(&self) -> [&[T]; CHANNELS] {
        let n = self.size.num_pixels();
        std::array::from_fn(|c| &self.data[c * n..(c + 1) * n])
    }

    /// Get all channel planes mutably, in channel order.
    pub fn channels_mut(&mut self) -> Vec<&mut [T]> {
        let n = self.size.num_pixels();
        let mut planes = Vec::with_capacity(CHANNELS);
        let mut rest = self.data.as_mut_slice();
        for _ in 0..CHANNELS {
            let (plane, tail) = std::mem::take(&mut rest).split_at_mut(n);
            planes.push(plane);
            rest = tail;
        }
        planes
    }

    /// Get the value at `(x, y)` in channel `ch`, or `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize, ch: usize) -> Option<&T> {
        if x >= self.width() || y >= self.height() || ch >= CHANNELS {
            return None;
        }
        self.data
            .get(ch * self.size.num_pixels() + self.size.index(x, y))
    }

    /// Get the value at `(x, y)` in channel `ch`.
    ///
    /// # Errors
    ///
    /// If the pixel or the channel is out of bounds, an error is returned.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<T, ImageError>
    where
        T: Copy,
    {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }

        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }

        Ok(self.data[ch * self.size.num_pixels() + self.size.index(x, y)])
    }
}
