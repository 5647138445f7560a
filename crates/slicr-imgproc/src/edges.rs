use crate::parallel::ExecutionStrategy;
use slicr_image::{Image, ImageError};

/// Compute the Lab edge score of every interior pixel.
///
/// For a pixel at `(x, y)` the squared Lab differences between its horizontal
/// neighbors are summed into `dx`, those between its vertical neighbors into `dy`,
/// and the score is `(dx + dy)^2`. Border pixels are set to zero.
///
/// # Arguments
///
/// * `lab` - The planar Lab image.
/// * `dst` - The output edge map.
/// * `strategy` - How to distribute the per-column work.
///
/// # Example
///
/// ```
/// use slicr_image::Image;
/// use slicr_imgproc::edges::lab_edges;
/// use slicr_imgproc::parallel::ExecutionStrategy;
///
/// let lab = Image::<f64, 3>::from_size_val([5, 5].into(), 50.0).unwrap();
/// let mut edges = Image::<f64, 1>::from_size_val(lab.size(), 1.0).unwrap();
///
/// lab_edges(&lab, &mut edges, ExecutionStrategy::Serial).unwrap();
/// assert!(edges.as_slice().iter().all(|&e| e == 0.0));
/// ```
pub fn lab_edges(
    lab: &Image<f64, 3>,
    dst: &mut Image<f64, 1>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if lab.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            lab.width(),
            lab.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let size = lab.size();
    let (width, height) = (size.width, size.height);
    let planes = lab.channels();

    strategy.for_each_chunk_mut(dst.as_slice_mut(), height, |x, column| {
        column.fill(0.0);
        if x == 0 || x + 1 >= width || height < 3 {
            return;
        }
        for (y, edge) in column.iter_mut().enumerate().take(height - 1).skip(1) {
            let i = size.index(x, y);
            let (left, right) = (size.index(x - 1, y), size.index(x + 1, y));
            let (up, down) = (i - 1, i + 1);

            let mut dx = 0.0;
            let mut dy = 0.0;
            for plane in planes.iter() {
                let h = plane[left] - plane[right];
                let v = plane[up] - plane[down];
                dx += h * h;
                dy += v * v;
            }

            let sum = dx + dy;
            *edge = sum * sum;
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicr_image::ImageSize;

    fn lab_from_l(size: ImageSize, l: impl Fn(usize, usize) -> f64) -> Image<f64, 3> {
        let mut data = vec![0.0; size.num_pixels() * 3];
        for x in 0..size.width {
            for y in 0..size.height {
                data[size.index(x, y)] = l(x, y);
            }
        }
        Image::new(size, data).unwrap()
    }

    #[test]
    fn vertical_step_edge() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 6,
            height: 4,
        };
        let lab = lab_from_l(size, |x, _| if x < 3 { 0.0 } else { 10.0 });
        let mut edges = Image::<f64, 1>::from_size_val(size, -1.0)?;

        lab_edges(&lab, &mut edges, ExecutionStrategy::Serial)?;

        // columns 2 and 3 straddle the step: dx = 100, dy = 0
        for y in 1..3 {
            assert_eq!(edges.get_pixel(2, y, 0)?, 10_000.0);
            assert_eq!(edges.get_pixel(3, y, 0)?, 10_000.0);
            assert_eq!(edges.get_pixel(1, y, 0)?, 0.0);
            assert_eq!(edges.get_pixel(4, y, 0)?, 0.0);
        }
        // border stays at zero
        for x in 0..6 {
            assert_eq!(edges.get_pixel(x, 0, 0)?, 0.0);
            assert_eq!(edges.get_pixel(x, 3, 0)?, 0.0);
        }

        Ok(())
    }

    #[test]
    fn score_squares_the_sum() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 3,
        };
        // L = x + 2y: dx = (2)^2 = 4, dy = (4)^2 = 16
        let lab = lab_from_l(size, |x, y| (x + 2 * y) as f64);
        let mut edges = Image::<f64, 1>::from_size_val(size, 0.0)?;

        lab_edges(&lab, &mut edges, ExecutionStrategy::ParallelElements)?;

        assert_eq!(edges.get_pixel(1, 1, 0)?, 400.0);
        assert_eq!(edges.as_slice().iter().filter(|&&e| e != 0.0).count(), 1);

        Ok(())
    }

    #[test]
    fn tiny_images_have_no_interior() -> Result<(), ImageError> {
        for (w, h) in [(1, 1), (2, 5), (5, 2)] {
            let size = ImageSize {
                width: w,
                height: h,
            };
            let lab = lab_from_l(size, |x, y| (x * 7 + y * 3) as f64);
            let mut edges = Image::<f64, 1>::from_size_val(size, 1.0)?;
            lab_edges(&lab, &mut edges, ExecutionStrategy::Serial)?;
            assert!(edges.as_slice().iter().all(|&e| e == 0.0));
        }
        Ok(())
    }
}
