use crate::superpixel::error::{try_alloc, SuperpixelError};
use slicr_image::Image;

// 4-neighborhood scan order
const DX4: [isize; 4] = [-1, 0, 1, 0];
const DY4: [isize; 4] = [0, -1, 0, 1];

/// Relabel a tentative label grid into connected, contiguous superpixels.
///
/// Pixels are visited in linear order. Each unvisited pixel starts a new segment that
/// is flood filled through 4-connected pixels sharing its tentative label (`-1`
/// included). A segment of at most `(num_pixels / expected_count) / 4` pixels is
/// merged into a label adjacent to its first pixel instead of getting its own.
///
/// # Arguments
///
/// * `labels` - The tentative labels, `-1` for unassigned pixels.
/// * `expected_count` - The number of regions the segmentation aims for.
///
/// # Returns
///
/// The final labels, in `[0, num_labels)`, and `num_labels`.
///
/// # Example
///
/// ```
/// use slicr_image::Image;
/// use slicr_imgproc::superpixel::enforce_connectivity;
///
/// // two columns of label 7 separated by a column of label 3
/// let labels = Image::<i32, 1>::new([3, 2].into(), vec![7, 7, 3, 3, 7, 7]).unwrap();
/// let (relabeled, num_labels) = enforce_connectivity(&labels, 1).unwrap();
///
/// assert_eq!(num_labels, 3);
/// assert_eq!(relabeled.as_slice(), &[0, 0, 1, 1, 2, 2]);
/// ```
pub fn enforce_connectivity(
    labels: &Image<i32, 1>,
    expected_count: usize,
) -> Result<(Image<i32, 1>, usize), SuperpixelError> {
    let size = labels.size();
    let num_pixels = size.num_pixels();
    let min_size = (num_pixels / expected_count.max(1)) >> 2;
    let labels = labels.as_slice();

    let mut nlabels = try_alloc(num_pixels, -1i32)?;
    let mut segment = try_alloc(num_pixels, 0usize)?;
    segment.clear();

    let mut label = 0i32;
    let mut adjlabel = 0i32;

    for oindex in 0..num_pixels {
        if nlabels[oindex] >= 0 {
            continue;
        }
        nlabels[oindex] = label;
        let (sx, sy) = size.coords(oindex);

        // fallback target in case the segment turns out too small
        for (&dx, &dy) in DX4.iter().zip(DY4.iter()) {
            if let Some((nx, ny)) = size.offset(sx, sy, dx, dy) {
                let nindex = size.index(nx, ny);
                if nlabels[nindex] >= 0 {
                    adjlabel = nlabels[nindex];
                }
            }
        }

        segment.clear();
        segment.push(oindex);
        let target = labels[oindex];
        let mut c = 0;
        while c < segment.len() {
            let (x, y) = size.coords(segment[c]);
            c += 1;
            for (&dx, &dy) in DX4.iter().zip(DY4.iter()) {
                let Some((nx, ny)) = size.offset(x, y, dx, dy) else {
                    continue;
                };
                let nindex = size.index(nx, ny);
                if nlabels[nindex] < 0 && labels[nindex] == target {
                    nlabels[nindex] = label;
                    segment.push(nindex);
                }
            }
        }

        if segment.len() <= min_size {
            for &i in &segment {
                nlabels[i] = adjlabel;
            }
        } else {
            label += 1;
        }
    }

    // every segment was merged: the whole image is one region
    if label == 0 && num_pixels > 0 {
        label = 1;
    }

    Ok((Image::new(size, nlabels)?, label as usize))
}
