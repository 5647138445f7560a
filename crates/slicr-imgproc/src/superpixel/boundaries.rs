use slicr_image::{Image, ImageError};

/// Mark the pixels where a superpixel meets another one.
///
/// A pixel is set to 255 when its label differs from the label of its right or
/// lower neighbor, and to 0 otherwise.
///
/// # Example
///
/// ```
/// use slicr_image::Image;
/// use slicr_imgproc::superpixel::boundary_mask;
///
/// // 3x1 image: labels 0, 0, 1
/// let labels = Image::<i32, 1>::new([3, 1].into(), vec![0, 0, 1]).unwrap();
/// let mask = boundary_mask(&labels).unwrap();
///
/// assert_eq!(mask.as_slice(), &[0, 255, 0]);
/// ```
pub fn boundary_mask(labels: &Image<i32, 1>) -> Result<Image<u8, 1>, ImageError> {
    let size = labels.size();
    let values = labels.as_slice();
    let mut mask = vec![0u8; size.num_pixels()];

    for x in 0..size.width {
        for y in 0..size.height {
            let i = size.index(x, y);
            let differs = [(1, 0), (0, 1)].iter().any(|&(dx, dy)| {
                size.offset(x, y, dx, dy)
                    .is_some_and(|(nx, ny)| values[size.index(nx, ny)] != values[i])
            });
            if differs {
                mask[i] = 255;
            }
        }
    }

    Image::new(size, mask)
}
