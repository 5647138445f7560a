//! SLIC superpixel segmentation.
//!
//! The pipeline converts the input to CIE L*a*b*, lays a grid of seeds over the
//! image, nudges every seed off strong edges, runs a windowed k-means in the joint
//! (L, a, b, x, y) space and finally relabels the result so that every superpixel
//! is one 4-connected region of a reasonable size.

mod boundaries;
mod cluster;
mod connectivity;
mod error;
mod seeds;

pub use boundaries::boundary_mask;
pub use cluster::Clusterer;
pub use connectivity::enforce_connectivity;
pub use error::SuperpixelError;
pub use seeds::{perturb_seeds, Seed, SeedGrid, SeedLayout};

use crate::color::lab_from_rgb;
use crate::edges::lab_edges;
use crate::parallel::ExecutionStrategy;
use error::try_alloc;
use slicr_image::{Image, ImageSize};

/// Parameters of a SLIC segmentation.
///
/// # Example
///
/// ```
/// use slicr_imgproc::parallel::ExecutionStrategy;
/// use slicr_imgproc::superpixel::SlicConfig;
///
/// let config = SlicConfig::new(400, 20.0)
///     .with_num_iterations(10)
///     .with_strategy(ExecutionStrategy::Serial);
///
/// assert_eq!(config.num_superpixels, 400);
/// assert_eq!(config.num_iterations, 10);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SlicConfig {
    /// Desired number of superpixels.
    pub num_superpixels: usize,
    /// Weight of spatial proximity against color similarity.
    pub compactness: f64,
    /// Number of assignment/update rounds.
    pub num_iterations: usize,
    /// Stop early once no seed moves more than this many pixels in a round.
    pub convergence_tolerance: Option<f64>,
    /// Layout of the initial seed grid.
    pub seed_layout: SeedLayout,
    /// Move seeds off strong edges before clustering.
    pub perturb_seeds: bool,
    /// How to distribute the work.
    pub strategy: ExecutionStrategy,
}

impl Default for SlicConfig {
    fn default() -> Self {
        Self {
            num_superpixels: 200,
            compactness: 10.0,
            num_iterations: 5,
            convergence_tolerance: None,
            seed_layout: SeedLayout::Regular,
            perturb_seeds: true,
            strategy: ExecutionStrategy::default(),
        }
    }
}

impl SlicConfig {
    /// Create a configuration for `num_superpixels` regions with the given compactness.
    pub fn new(num_superpixels: usize, compactness: f64) -> Self {
        Self {
            num_superpixels,
            compactness,
            ..Default::default()
        }
    }

    /// Set the number of clustering rounds.
    pub fn with_num_iterations(mut self, num_iterations: usize) -> Self {
        self.num_iterations = num_iterations;
        self
    }

    /// Enable the early exit once seeds move less than `tolerance` pixels.
    pub fn with_convergence_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence_tolerance = Some(tolerance);
        self
    }

    /// Set the seed layout.
    pub fn with_seed_layout(mut self, seed_layout: SeedLayout) -> Self {
        self.seed_layout = seed_layout;
        self
    }

    /// Enable or disable the edge-based seed perturbation.
    pub fn with_perturb_seeds(mut self, perturb_seeds: bool) -> Self {
        self.perturb_seeds = perturb_seeds;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn validate(&self) -> Result<(), SuperpixelError> {
        if self.num_superpixels == 0 {
            return Err(SuperpixelError::InvalidParameters(
                "the number of superpixels must be positive".to_string(),
            ));
        }
        if !(self.compactness.is_finite() && self.compactness > 0.0) {
            return Err(SuperpixelError::InvalidParameters(format!(
                "compactness must be positive and finite, got {}",
                self.compactness
            )));
        }
        if self.num_iterations == 0 {
            return Err(SuperpixelError::InvalidParameters(
                "at least one iteration is required".to_string(),
            ));
        }
        if let Some(tol) = self.convergence_tolerance {
            if tol.is_nan() || tol < 0.0 {
                return Err(SuperpixelError::InvalidParameters(format!(
                    "convergence tolerance must be non-negative, got {tol}"
                )));
            }
        }
        Ok(())
    }
}

/// The result of a segmentation.
#[derive(Clone, Debug)]
pub struct Superpixels {
    /// One label per pixel, in `[0, num_labels)`.
    pub labels: Image<i32, 1>,
    /// Number of distinct labels.
    pub num_labels: usize,
    /// Number of seeds the clustering started from.
    pub num_seeds: usize,
    /// Seed spacing in pixels.
    pub step: usize,
    /// Number of clustering rounds that ran.
    pub iterations: usize,
}

fn check_dimensions(size: ImageSize, len: usize) -> Result<(), SuperpixelError> {
    let expected = size
        .width
        .checked_mul(size.height)
        .and_then(|n| n.checked_mul(3));
    let fits_labels = size.num_pixels() <= i32::MAX as usize;
    match expected {
        Some(expected) if size.width > 0 && size.height > 0 && fits_labels && expected == len => {
            Ok(())
        }
        _ => Err(SuperpixelError::InvalidDimensions {
            width: size.width,
            height: size.height,
            len,
            expected: expected.unwrap_or(usize::MAX),
        }),
    }
}

/// Compute SLIC superpixels of an RGB image.
///
/// # Arguments
///
/// * `image` - The planar RGB image with channels in [0, 1].
/// * `config` - The segmentation parameters.
///
/// # Returns
///
/// The label of every pixel and the number of labels.
///
/// # Errors
///
/// Fails on an empty image, on out-of-range parameters, or when a working buffer
/// cannot be allocated. A requested count larger than the number of pixels is
/// clamped to one superpixel per pixel.
///
/// # Example
///
/// ```
/// use slicr_image::Image;
/// use slicr_imgproc::superpixel::{slic, SlicConfig};
///
/// let image = Image::<f32, 3>::from_size_val([16, 16].into(), 0.5).unwrap();
/// let superpixels = slic(&image, &SlicConfig::new(4, 10.0)).unwrap();
///
/// assert_eq!(superpixels.num_seeds, 4);
/// assert!(superpixels.num_labels >= 1);
/// assert!(superpixels
///     .labels
///     .as_slice()
///     .iter()
///     .all(|&l| l >= 0 && (l as usize) < superpixels.num_labels));
/// ```
pub fn slic(image: &Image<f32, 3>, config: &SlicConfig) -> Result<Superpixels, SuperpixelError> {
    check_dimensions(image.size(), image.as_slice().len())?;
    config.validate()?;

    config.strategy.install(|| segment(image, config))?
}

/// Compute SLIC superpixels of a raw planar buffer.
///
/// `data` holds `3 * width * height` values: the R plane, then G, then B, each
/// in column-major order (`x * height + y`) with values in [0, 1]. The labels
/// come back in the same pixel order. Uses the default settings otherwise.
///
/// # Example
///
/// ```
/// use slicr_imgproc::superpixel::slic_planar;
///
/// let labels = slic_planar(8, 8, &vec![0.25f32; 3 * 8 * 8], 4, 10.0).unwrap();
/// assert_eq!(labels.len(), 64);
/// ```
pub fn slic_planar(
    width: usize,
    height: usize,
    data: &[f32],
    num_superpixels: usize,
    compactness: f64,
) -> Result<Vec<i32>, SuperpixelError> {
    let size = ImageSize { width, height };
    check_dimensions(size, data.len())?;

    let image = Image::new(size, data.to_vec())?;
    let superpixels = slic(&image, &SlicConfig::new(num_superpixels, compactness))?;

    Ok(superpixels.labels.into_vec())
}

fn segment(image: &Image<f32, 3>, config: &SlicConfig) -> Result<Superpixels, SuperpixelError> {
    let start = std::time::Instant::now();
    let size = image.size();
    let num_pixels = size.num_pixels();
    let strategy = config.strategy;

    let num_superpixels = if config.num_superpixels > num_pixels {
        log::warn!(
            "Requested {} superpixels for {} pixels, clamping to {}",
            config.num_superpixels,
            num_pixels,
            num_pixels
        );
        num_pixels
    } else {
        config.num_superpixels
    };

    let grid = SeedGrid::new(size, num_superpixels);
    log::debug!(
        "Seed grid: step {} strips {}x{} seeds {}",
        grid.step,
        grid.xstrips,
        grid.ystrips,
        grid.num_seeds()
    );

    let mut lab = Image::new(size, try_alloc(num_pixels * 3, 0.0)?)?;
    lab_from_rgb(image, &mut lab, strategy)?;

    let mut seeds = grid.place_seeds(&lab, config.seed_layout);
    if config.perturb_seeds {
        let mut edges = Image::new(size, try_alloc(num_pixels, 0.0)?)?;
        lab_edges(&lab, &mut edges, strategy)?;
        perturb_seeds(&mut seeds, &lab, &edges);
    }

    let num_seeds = seeds.len();
    let mut clusterer = Clusterer::new(&lab, seeds, grid.step, config.compactness, strategy)?;
    let iterations = clusterer.run(config.num_iterations, config.convergence_tolerance);

    let tentative = clusterer.into_labels()?;
    let (labels, num_labels) = enforce_connectivity(&tentative, grid.expected_count(size))?;

    log::debug!(
        "Segmented {} into {} superpixels in {:?}",
        size,
        num_labels,
        start.elapsed()
    );

    Ok(Superpixels {
        labels,
        num_labels,
        num_seeds,
        step: grid.step,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_image() {
        let res = slic_planar(0, 5, &[], 4, 10.0);
        assert!(matches!(
            res,
            Err(SuperpixelError::InvalidDimensions {
                width: 0,
                height: 5,
                ..
            })
        ));
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let res = slic_planar(4, 4, &[0.0; 47], 4, 10.0);
        assert_eq!(
            res,
            Err(SuperpixelError::InvalidDimensions {
                width: 4,
                height: 4,
                len: 47,
                expected: 48,
            })
        );
    }

    #[test]
    fn rejects_bad_parameters() {
        let data = vec![0.5f32; 3 * 16];
        for (count, compactness) in [
            (0, 10.0),
            (4, 0.0),
            (4, -1.0),
            (4, f64::NAN),
            (4, 1e200),
        ] {
            let res = slic_planar(4, 4, &data, count, compactness);
            assert!(
                matches!(res, Err(SuperpixelError::InvalidParameters(_))),
                "count {count} compactness {compactness}"
            );
        }
    }

    #[test]
    fn rejects_zero_iterations_and_threads() -> Result<(), SuperpixelError> {
        let image = Image::<f32, 3>::from_size_val([4, 4].into(), 0.5)?;

        let config = SlicConfig::new(4, 10.0).with_num_iterations(0);
        assert!(matches!(
            slic(&image, &config),
            Err(SuperpixelError::InvalidParameters(_))
        ));

        let config = SlicConfig::new(4, 10.0).with_strategy(ExecutionStrategy::Fixed(0));
        assert!(matches!(
            slic(&image, &config),
            Err(SuperpixelError::Parallel(_))
        ));

        Ok(())
    }

    #[test]
    fn reports_grid() -> Result<(), SuperpixelError> {
        let image = Image::<f32, 3>::from_size_val([20, 10].into(), 0.3)?;
        let superpixels = slic(&image, &SlicConfig::new(8, 10.0))?;
        assert_eq!(superpixels.step, 5);
        assert_eq!(superpixels.num_seeds, 8);
        assert_eq!(superpixels.iterations, 5);
        Ok(())
    }
}
