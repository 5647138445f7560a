use slicr_image::{Image, ImageSize};

/// A cluster center in the joint (L, a, b, x, y) feature space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Seed {
    /// Lightness.
    pub l: f64,
    /// Green-red component.
    pub a: f64,
    /// Blue-yellow component.
    pub b: f64,
    /// Column of the center.
    pub x: f64,
    /// Row of the center.
    pub y: f64,
}

impl Seed {
    /// Create a seed at pixel `(x, y)` sampling its color from `lab`.
    pub fn sample(lab: &Image<f64, 3>, x: usize, y: usize) -> Self {
        let i = lab.size().index(x, y);
        let [l, a, b] = lab.channels();
        Self {
            l: l[i],
            a: a[i],
            b: b[i],
            x: x as f64,
            y: y as f64,
        }
    }
}

/// How seeds are laid out on the initial grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedLayout {
    /// Square grid, one seed per cell center.
    #[default]
    Regular,
    /// Odd rows shifted right by half a cell.
    Hexagonal,
}

/// The seed grid derived from the image size and the requested region count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedGrid {
    /// Spacing between seeds in pixels.
    pub step: usize,
    /// Number of seed columns.
    pub xstrips: usize,
    /// Number of seed rows.
    pub ystrips: usize,
    /// Leftover width spread over the columns, per column.
    pub xerr_per_strip: f64,
    /// Leftover height spread over the rows, per row.
    pub yerr_per_strip: f64,
}

fn strips(dim: usize, step: usize) -> (usize, f64) {
    let mut strips = (0.5 + dim as f64 / step as f64) as usize;
    if strips > 0 && strips * step > dim {
        strips -= 1;
    }
    let strips = strips.max(1);
    let err = dim as f64 - (strips * step) as f64;
    (strips, err / strips as f64)
}

impl SeedGrid {
    /// Derive the grid for `num_superpixels` regions over an image of `size`.
    ///
    /// `num_superpixels` must be in `1..=size.num_pixels()`.
    ///
    /// # Example
    ///
    /// ```
    /// use slicr_imgproc::superpixel::SeedGrid;
    ///
    /// let grid = SeedGrid::new([100, 100].into(), 4);
    /// assert_eq!(grid.step, 50);
    /// assert_eq!(grid.num_seeds(), 4);
    /// ```
    pub fn new(size: ImageSize, num_superpixels: usize) -> Self {
        let area = (0.5 + size.num_pixels() as f64 / num_superpixels.max(1) as f64) as usize;
        let step = ((0.5 + (area.max(1) as f64).sqrt()) as usize).max(1);

        let (xstrips, xerr_per_strip) = strips(size.width, step);
        let (ystrips, yerr_per_strip) = strips(size.height, step);

        Self {
            step,
            xstrips,
            ystrips,
            xerr_per_strip,
            yerr_per_strip,
        }
    }

    /// Number of seeds on the grid.
    pub fn num_seeds(&self) -> usize {
        self.xstrips * self.ystrips
    }

    /// Region count implied by the step, used to size the smallest kept segment.
    pub fn expected_count(&self, size: ImageSize) -> usize {
        (size.num_pixels() / (self.step * self.step)).max(1)
    }

    /// Pixel position of the seed in grid cell `(x, y)`.
    pub fn position(
        &self,
        size: ImageSize,
        x: usize,
        y: usize,
        layout: SeedLayout,
    ) -> (usize, usize) {
        let offset = self.step / 2;
        let xe = (x as f64 * self.xerr_per_strip) as isize;
        let ye = (y as f64 * self.yerr_per_strip) as isize;

        let xoff = match layout {
            SeedLayout::Regular => offset,
            SeedLayout::Hexagonal => offset << (y & 1),
        };

        let seedx = (x * self.step + xoff) as isize + xe;
        let seedy = (y * self.step + offset) as isize + ye;

        (
            seedx.clamp(0, size.width as isize - 1) as usize,
            seedy.clamp(0, size.height as isize - 1) as usize,
        )
    }

    /// Place one seed per grid cell, rows outer and columns inner.
    pub fn place_seeds(&self, lab: &Image<f64, 3>, layout: SeedLayout) -> Vec<Seed> {
        let size = lab.size();
        let mut seeds = Vec::with_capacity(self.num_seeds());
        for y in 0..self.ystrips {
            for x in 0..self.xstrips {
                let (sx, sy) = self.position(size, x, y, layout);
                seeds.push(Seed::sample(lab, sx, sy));
            }
        }
        seeds
    }
}

// neighbor scan order
const DX8: [isize; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];
const DY8: [isize; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

/// Move every seed to the lowest-edge pixel of its 8-neighborhood.
///
/// Only interior pixels are candidates, the border of the edge map carries no score.
/// A seed moves only when a neighbor is strictly lower than its own pixel.
pub fn perturb_seeds(seeds: &mut [Seed], lab: &Image<f64, 3>, edges: &Image<f64, 1>) {
    let size = lab.size();
    let edges = edges.as_slice();
    let interior =
        |x: usize, y: usize| x >= 1 && y >= 1 && x + 1 < size.width && y + 1 < size.height;

    for seed in seeds.iter_mut() {
        let (ox, oy) = (seed.x as usize, seed.y as usize);
        let mut best = (ox, oy);
        let mut best_edge = edges[size.index(ox, oy)];

        for (&dx, &dy) in DX8.iter().zip(DY8.iter()) {
            let Some((nx, ny)) = size.offset(ox, oy, dx, dy) else {
                continue;
            };
            if !interior(nx, ny) {
                continue;
            }
            let e = edges[size.index(nx, ny)];
            if e < best_edge {
                best_edge = e;
                best = (nx, ny);
            }
        }

        if best != (ox, oy) {
            *seed = Seed::sample(lab, best.0, best.1);
        }
    }
}
