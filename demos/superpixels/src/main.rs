use argh::FromArgs;
use std::path::PathBuf;

use slicr::{
    image::{Image, ImageSize},
    imgproc::{
        parallel::ExecutionStrategy,
        superpixel::{boundary_mask, slic, SeedLayout, SlicConfig},
    },
};

#[derive(FromArgs)]
/// Segment an image into SLIC superpixels and draw their boundaries
struct Args {
    /// path to the input image
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// path to the output image
    #[argh(option, short = 'o')]
    output: PathBuf,

    /// the desired number of superpixels
    #[argh(option, short = 'n', default = "200")]
    num_superpixels: usize,

    /// the compactness weight
    #[argh(option, short = 'm', default = "10.0")]
    compactness: f64,

    /// the number of clustering iterations
    #[argh(option, default = "5")]
    iterations: usize,

    /// use a hexagonal seed grid
    #[argh(switch)]
    hexagonal: bool,

    /// number of worker threads, all cores if unset
    #[argh(option)]
    threads: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let rgb = image::open(&args.input)?.to_rgb8();
    let size: ImageSize = [rgb.width() as usize, rgb.height() as usize].into();

    // interleaved bytes to planar floats in [0, 1]
    let img_u8 = Image::<u8, 3>::from_interleaved(size, rgb.as_raw())?;
    let img_f32 = img_u8.cast_and_scale::<f32>(1. / 255.)?;

    let strategy = match args.threads {
        Some(n) => ExecutionStrategy::Fixed(n),
        None => ExecutionStrategy::ParallelElements,
    };
    let layout = if args.hexagonal {
        SeedLayout::Hexagonal
    } else {
        SeedLayout::Regular
    };
    let config = SlicConfig::new(args.num_superpixels, args.compactness)
        .with_num_iterations(args.iterations)
        .with_seed_layout(layout)
        .with_strategy(strategy);

    let superpixels = slic(&img_f32, &config)?;
    log::info!(
        "{}: {} superpixels from {} seeds (step {}, {} iterations)",
        args.input.display(),
        superpixels.num_labels,
        superpixels.num_seeds,
        superpixels.step,
        superpixels.iterations
    );

    // paint the boundaries in red
    let mask = boundary_mask(&superpixels.labels)?;
    let mut out = img_u8;
    {
        let mask = mask.as_slice();
        let mut planes = out.channels_mut();
        for (i, &m) in mask.iter().enumerate() {
            if m > 0 {
                planes[0][i] = 255;
                planes[1][i] = 0;
                planes[2][i] = 0;
            }
        }
    }

    let buf = image::RgbImage::from_raw(
        size.width as u32,
        size.height as u32,
        out.to_interleaved(),
    )
    .ok_or("failed to build the output image")?;
    buf.save(&args.output)?;

    Ok(())
}
