use crate::parallel::ExecutionStrategy;
use crate::superpixel::error::{try_alloc, SuperpixelError};
use crate::superpixel::seeds::Seed;
use slicr_image::{Image, ImageSize};

/// Half-open pixel rectangle searched by one seed.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Window {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

impl Window {
    fn around(seed: &Seed, step: usize, size: ImageSize) -> Self {
        let (cx, cy) = (seed.x as usize, seed.y as usize);
        Self {
            x0: cx.saturating_sub(step),
            x1: (cx + step + 1).min(size.width),
            y0: cy.saturating_sub(step),
            y1: (cy + step + 1).min(size.height),
        }
    }
}

/// Running sums of the features of one cluster.
#[derive(Clone, Copy, Debug, Default)]
struct Accumulator {
    l: f64,
    a: f64,
    b: f64,
    x: f64,
    y: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, other: &Accumulator) {
        self.l += other.l;
        self.a += other.a;
        self.b += other.b;
        self.x += other.x;
        self.y += other.y;
        self.count += other.count;
    }
}

/// Iterative local k-means over the joint color and position space.
///
/// The clusterer owns the seeds, the tentative label grid and the per-pixel
/// distance accumulator for the duration of one segmentation.
pub struct Clusterer<'a> {
    lab: &'a Image<f64, 3>,
    seeds: Vec<Seed>,
    labels: Vec<i32>,
    distances: Vec<f64>,
    step: usize,
    invwt: f64,
    strategy: ExecutionStrategy,
}

impl<'a> Clusterer<'a> {
    /// Create a clusterer with every pixel unassigned.
    ///
    /// # Arguments
    ///
    /// * `lab` - The planar Lab image.
    /// * `seeds` - The initial cluster centers.
    /// * `step` - The seed spacing; also the half-width of each search window.
    /// * `compactness` - Weight of the spatial distance against the color distance.
    /// * `strategy` - How to distribute the per-iteration work.
    ///
    /// # Errors
    ///
    /// Fails when the seeds do not fit the label range, when the compactness is so
    /// large that the spatial weight overflows, or when a buffer cannot be allocated.
    pub fn new(
        lab: &'a Image<f64, 3>,
        seeds: Vec<Seed>,
        step: usize,
        compactness: f64,
        strategy: ExecutionStrategy,
    ) -> Result<Self, SuperpixelError> {
        if seeds.len() > i32::MAX as usize {
            return Err(SuperpixelError::InvalidParameters(format!(
                "{} seeds do not fit the label range",
                seeds.len()
            )));
        }

        let num_pixels = lab.size().num_pixels();
        let ratio = step as f64 / compactness;
        let invwt = 1.0 / (ratio * ratio);

        // the spatial term of the farthest pixel in a window must stay finite
        let reach = (step + 1) as f64;
        if !(2.0 * reach * reach * invwt).is_finite() {
            return Err(SuperpixelError::InvalidParameters(format!(
                "compactness {compactness} is too large for a step of {step}"
            )));
        }

        Ok(Self {
            lab,
            seeds,
            labels: try_alloc(num_pixels, -1)?,
            distances: try_alloc(num_pixels, f64::INFINITY)?,
            step,
            invwt,
            strategy,
        })
    }

    /// The current cluster centers.
    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    /// The tentative label of every pixel, `-1` when no window has claimed it.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Run up to `max_iterations` rounds and return how many ran.
    ///
    /// With a tolerance, iteration stops after the first round whose largest
    /// seed displacement falls below it.
    pub fn run(&mut self, max_iterations: usize, tolerance: Option<f64>) -> usize {
        for itr in 0..max_iterations {
            let shift = self.iterate();
            log::debug!("Iteration: {} max seed shift: {:.4}", itr, shift);

            if tolerance.is_some_and(|tol| shift < tol) {
                log::debug!("Clustering converged after {} iterations", itr + 1);
                return itr + 1;
            }
        }
        max_iterations
    }

    /// One assignment and update round. Returns the largest seed displacement.
    pub fn iterate(&mut self) -> f64 {
        let size = self.lab.size();
        let windows = self
            .seeds
            .iter()
            .map(|seed| Window::around(seed, self.step, size))
            .collect::<Vec<_>>();

        self.assign(&windows);
        self.update()
    }

    fn assign(&mut self, windows: &[Window]) {
        let size = self.lab.size();

        // seeds covering each column, ascending, so every pixel sees its
        // candidates in the same order as a seed-by-seed scan
        let mut column_seeds = vec![Vec::new(); size.width];
        for (n, window) in windows.iter().enumerate() {
            for seeds in &mut column_seeds[window.x0..window.x1] {
                seeds.push(n);
            }
        }

        let lab = self.lab;
        let [lvec, avec, bvec] = lab.channels();
        let seeds = &self.seeds;
        let invwt = self.invwt;

        self.strategy.for_each_chunk_pair_mut(
            &mut self.labels,
            &mut self.distances,
            size.height,
            |x, labels, distances| {
                distances.fill(f64::INFINITY);
                let xf = x as f64;
                for &n in &column_seeds[x] {
                    let seed = &seeds[n];
                    let window = &windows[n];
                    let dxs = (xf - seed.x) * (xf - seed.x);

                    for y in window.y0..window.y1 {
                        let i = size.index(x, y);
                        let dl = lvec[i] - seed.l;
                        let da = avec[i] - seed.a;
                        let db = bvec[i] - seed.b;
                        let dy = y as f64 - seed.y;

                        let dist = dl * dl + da * da + db * db;
                        let distxy = dxs + dy * dy;
                        let d = dist + distxy * invwt;

                        if d < distances[y] {
                            distances[y] = d;
                            labels[y] = n as i32;
                        }
                    }
                }
            },
        );
    }

    fn update(&mut self) -> f64 {
        let lab = self.lab;
        let size = lab.size();
        let [lvec, avec, bvec] = lab.channels();
        let labels = &self.labels;

        // per-column partial sums, merged below in column order
        let partials = self.strategy.map_indexed(size.width, |x| {
            let mut sums: Vec<(i32, Accumulator)> = Vec::new();
            let column = &labels[size.index(x, 0)..size.index(x + 1, 0)];
            for (y, &label) in column.iter().enumerate() {
                if label < 0 {
                    continue;
                }
                let pos = match sums.last() {
                    Some((last, _)) if *last == label => sums.len() - 1,
                    _ => match sums.iter().position(|(l, _)| *l == label) {
                        Some(pos) => pos,
                        None => {
                            sums.push((label, Accumulator::default()));
                            sums.len() - 1
                        }
                    },
                };
                let i = size.index(x, y);
                let acc = &mut sums[pos].1;
                acc.l += lvec[i];
                acc.a += avec[i];
                acc.b += bvec[i];
                acc.x += x as f64;
                acc.y += y as f64;
                acc.count += 1;
            }
            sums
        });

        let mut totals = vec![Accumulator::default(); self.seeds.len()];
        for (label, acc) in partials.iter().flatten() {
            totals[*label as usize].add(acc);
        }

        let mut max_shift = 0.0f64;
        for (seed, total) in self.seeds.iter_mut().zip(totals.iter()) {
            if total.count == 0 {
                continue;
            }
            let count = total.count as f64;
            let moved = Seed {
                l: total.l / count,
                a: total.a / count,
                b: total.b / count,
                x: total.x / count,
                y: total.y / count,
            };
            let shift = ((moved.x - seed.x).powi(2) + (moved.y - seed.y).powi(2)).sqrt();
            max_shift = max_shift.max(shift);
            *seed = moved;
        }
        max_shift
    }

    /// Consume the clusterer and return the tentative label grid.
    pub fn into_labels(self) -> Result<Image<i32, 1>, SuperpixelError> {
        Ok(Image::new(self.lab.size(), self.labels)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superpixel::seeds::{SeedGrid, SeedLayout};

    fn lab_from_l(size: ImageSize, l: impl Fn(usize, usize) -> f64) -> Image<f64, 3> {
        let n = size.num_pixels();
        let mut data = vec![0.0; n * 3];
        for (i, v) in data.iter_mut().take(n).enumerate() {
            let (x, y) = size.coords(i);
            *v = l(x, y);
        }
        Image::new(size, data).unwrap()
    }

    #[test]
    fn window_is_clipped() {
        let size: ImageSize = [10, 8].into();
        let seed = Seed {
            x: 1.0,
            y: 6.5,
            ..Default::default()
        };
        assert_eq!(
            Window::around(&seed, 3, size),
            Window {
                x0: 0,
                x1: 5,
                y0: 3,
                y1: 8
            }
        );
    }

    #[test]
    fn constant_image_splits_by_position() -> Result<(), SuperpixelError> {
        let size: ImageSize = [4, 4].into();
        let lab = lab_from_l(size, |_, _| 50.0);
        let grid = SeedGrid::new(size, 4);
        let seeds = grid.place_seeds(&lab, SeedLayout::Regular);

        let mut clusterer = Clusterer::new(&lab, seeds, grid.step, 10.0, ExecutionStrategy::Serial)?;
        assert_eq!(clusterer.run(5, None), 5);

        // ties go to the lowest seed index
        let labels = clusterer.labels();
        let at = |x, y| labels[size.index(x, y)];
        assert_eq!(at(2, 2), 0);
        assert_eq!(at(3, 0), 1);
        assert_eq!(at(0, 3), 2);
        assert_eq!(at(3, 3), 3);
        assert_eq!(labels.iter().filter(|&&l| l == 0).count(), 9);

        let seed0 = clusterer.seeds()[0];
        assert_eq!((seed0.x, seed0.y, seed0.l), (1.0, 1.0, 50.0));

        Ok(())
    }

    #[test]
    fn color_pulls_boundary() -> Result<(), SuperpixelError> {
        // dark left third, bright right two thirds, seeds on a 2x1 grid
        let size: ImageSize = [12, 6].into();
        let lab = lab_from_l(size, |x, _| if x < 4 { 10.0 } else { 90.0 });
        let seeds = vec![Seed::sample(&lab, 3, 3), Seed::sample(&lab, 9, 3)];

        let mut clusterer = Clusterer::new(&lab, seeds, 6, 1.0, ExecutionStrategy::Serial)?;
        clusterer.run(5, None);

        let labels = clusterer.labels();
        for x in 0..size.width {
            for y in 0..size.height {
                let expected = if x < 4 { 0 } else { 1 };
                assert_eq!(labels[size.index(x, y)], expected, "pixel ({x}, {y})");
            }
        }
        assert_eq!(clusterer.seeds()[0].l, 10.0);
        assert_eq!(clusterer.seeds()[1].l, 90.0);

        Ok(())
    }

    #[test]
    fn unreached_pixels_stay_unassigned() -> Result<(), SuperpixelError> {
        let size: ImageSize = [9, 3].into();
        let lab = lab_from_l(size, |_, _| 0.0);
        let seeds = vec![Seed::sample(&lab, 1, 1)];

        let mut clusterer = Clusterer::new(&lab, seeds, 1, 10.0, ExecutionStrategy::Serial)?;
        clusterer.iterate();

        let labels = clusterer.labels();
        assert_eq!(labels.iter().filter(|&&l| l == 0).count(), 9);
        assert_eq!(labels[size.index(5, 1)], -1);

        Ok(())
    }

    #[test]
    fn empty_seed_keeps_features() -> Result<(), SuperpixelError> {
        let size: ImageSize = [3, 3].into();
        let lab = lab_from_l(size, |_, _| 20.0);
        // two seeds on the same pixel: the second never wins a tie
        let seeds = vec![Seed::sample(&lab, 1, 1), Seed::sample(&lab, 1, 1)];
        let before = seeds[1];

        let mut clusterer = Clusterer::new(&lab, seeds, 2, 10.0, ExecutionStrategy::Serial)?;
        clusterer.run(3, None);

        assert!(clusterer.labels().iter().all(|&l| l == 0));
        assert_eq!(clusterer.seeds()[1], before);

        Ok(())
    }

    #[test]
    fn convergence_stops_early() -> Result<(), SuperpixelError> {
        let size: ImageSize = [4, 4].into();
        let lab = lab_from_l(size, |_, _| 50.0);
        let grid = SeedGrid::new(size, 4);
        let seeds = grid.place_seeds(&lab, SeedLayout::Regular);

        let mut clusterer = Clusterer::new(&lab, seeds, grid.step, 10.0, ExecutionStrategy::Serial)?;
        // the grid is already a fixed point, the first round does not move any seed
        assert_eq!(clusterer.run(5, Some(1e-9)), 1);

        Ok(())
    }

    #[test]
    fn rejects_overflowing_compactness() {
        let size: ImageSize = [20, 20].into();
        let lab = lab_from_l(size, |_, _| 50.0);
        let grid = SeedGrid::new(size, 4);
        let seeds = grid.place_seeds(&lab, SeedLayout::Regular);

        for compactness in [1e160, 1e200, f64::MAX] {
            let res = Clusterer::new(
                &lab,
                seeds.clone(),
                grid.step,
                compactness,
                ExecutionStrategy::Serial,
            );
            assert!(
                matches!(res, Err(SuperpixelError::InvalidParameters(_))),
                "compactness {compactness}"
            );
        }
    }

    #[test]
    fn large_compactness_gives_grid_cells() -> Result<(), SuperpixelError> {
        let size: ImageSize = [20, 20].into();
        let lab = lab_from_l(size, |x, y| (x * 7 + y * 3) as f64);
        let grid = SeedGrid::new(size, 4);
        let seeds = grid.place_seeds(&lab, SeedLayout::Regular);

        let mut clusterer =
            Clusterer::new(&lab, seeds, grid.step, 1e150, ExecutionStrategy::Serial)?;
        clusterer.run(5, None);

        // position dominates: every pixel is claimed and every seed keeps a cell
        let labels = clusterer.labels();
        assert!(labels.iter().all(|&l| l >= 0));
        for n in 0..4 {
            assert!(labels.contains(&n), "seed {n} lost its cell");
        }
        Ok(())
    }

    #[test]
    fn strategies_agree() {
        let size: ImageSize = [23, 17].into();
        let lab = lab_from_l(size, |x, y| ((x * 31 + y * 17) % 23) as f64 * 4.0);
        let grid = SeedGrid::new(size, 12);

        let run = |strategy: ExecutionStrategy| {
            let seeds = grid.place_seeds(&lab, SeedLayout::Regular);
            let mut clusterer = Clusterer::new(&lab, seeds, grid.step, 5.0, strategy).unwrap();
            clusterer.run(5, None);
            (clusterer.labels().to_vec(), clusterer.seeds().to_vec())
        };

        let serial = run(ExecutionStrategy::Serial);
        let parallel = run(ExecutionStrategy::ParallelElements);
        assert_eq!(serial, parallel);
    }
}
