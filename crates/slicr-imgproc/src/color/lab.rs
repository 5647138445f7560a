use crate::parallel::ExecutionStrategy;
use slicr_image::{Image, ImageError};

// CIE standard constants
const EPSILON: f64 = 0.008856;
const KAPPA: f64 = 903.3;

// D65 reference white
const XR: f64 = 0.950456;
const YR: f64 = 1.0;
const ZR: f64 = 1.088754;

#[inline]
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

/// Convert one sRGB pixel with channels in [0, 1] to CIE L*a*b*.
///
/// # Example
///
/// ```
/// use slicr_imgproc::color::rgb_to_lab;
///
/// let [l, a, b] = rgb_to_lab(0.0, 0.0, 0.0);
/// assert_eq!([l, a, b], [0.0, 0.0, 0.0]);
/// ```
#[inline]
pub fn rgb_to_lab(r: f32, g: f32, b: f32) -> [f64; 3] {
    let r = srgb_to_linear(r as f64);
    let g = srgb_to_linear(g as f64);
    let b = srgb_to_linear(b as f64);

    let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
    let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
    let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

    let fx = lab_f(x / XR);
    let fy = lab_f(y / YR);
    let fz = lab_f(z / ZR);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Convert a planar RGB image to a planar CIE L*a*b* image.
///
/// The input channels are expected in [0, 1]; the caller divides by the source
/// maximum (e.g. 255) beforehand.
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `dst` - The output Lab image with channels L, a, b.
/// * `strategy` - How to distribute the per-pixel work.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use slicr_image::{Image, ImageSize};
/// use slicr_imgproc::color::lab_from_rgb;
/// use slicr_imgproc::parallel::ExecutionStrategy;
///
/// let image = Image::<f32, 3>::from_size_val(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     1.0,
/// )
/// .unwrap();
///
/// let mut lab = Image::<f64, 3>::from_size_val(image.size(), 0.0).unwrap();
///
/// lab_from_rgb(&image, &mut lab, ExecutionStrategy::Serial).unwrap();
/// assert!((lab.get(2, 3, 0).unwrap() - 100.0).abs() < 1e-3);
/// ```
pub fn lab_from_rgb(
    src: &Image<f32, 3>,
    dst: &mut Image<f64, 3>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let [r, g, b] = src.channels();
    let mut planes = dst.channels_mut().into_iter();
    let (Some(l_plane), Some(a_plane), Some(b_plane)) =
        (planes.next(), planes.next(), planes.next())
    else {
        return Err(ImageError::ChannelIndexOutOfBounds(0, 3));
    };

    strategy.for_each_zip3_mut(l_plane, a_plane, b_plane, |i, l, a, bb| {
        [*l, *a, *bb] = rgb_to_lab(r[i], g[i], b[i]);
    });

    Ok(())
}
