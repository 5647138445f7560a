use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use slicr_image::Image;
use slicr_imgproc::color::{lab_from_rgb, rgb_to_lab};
use slicr_imgproc::parallel::ExecutionStrategy;

// vanilla version
fn lab_vanilla_get_pixel(
    src: &Image<f32, 3>,
    dst: &mut Image<f64, 3>,
) -> Result<(), Box<dyn std::error::Error>> {
    let n = src.size().num_pixels();
    let (width, height) = (src.width(), src.height());
    let data = dst.as_slice_mut();

    for x in 0..width {
        for y in 0..height {
            let r = src.get_pixel(x, y, 0)?;
            let g = src.get_pixel(x, y, 1)?;
            let b = src.get_pixel(x, y, 2)?;
            let [l, a, bb] = rgb_to_lab(r, g, b);
            let i = x * height + y;
            data[i] = l;
            data[n + i] = a;
            data[2 * n + i] = bb;
        }
    }
    Ok(())
}

fn bench_lab(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lab");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        // input image
        let image_size = [*width, *height].into();
        let image_data = (0..width * height * 3)
            .map(|i| (i % 256) as f32 / 255.0)
            .collect();
        let image = Image::<f32, 3>::new(image_size, image_data).unwrap();

        // output image
        let lab = Image::<f64, 3>::from_size_val(image_size, 0.0).unwrap();

        group.bench_with_input(
            BenchmarkId::new("vanilla_get_pixel", &parameter_string),
            &(&image, &lab),
            |b, i| {
                let (src, mut dst) = (i.0, i.1.clone());
                b.iter(|| black_box(lab_vanilla_get_pixel(src, &mut dst)))
            },
        );

        for (name, strategy) in [
            ("serial", ExecutionStrategy::Serial),
            ("parallel_elements", ExecutionStrategy::ParallelElements),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, &parameter_string),
                &(&image, &lab),
                |b, i| {
                    let (src, mut dst) = (i.0, i.1.clone());
                    b.iter(|| black_box(lab_from_rgb(src, &mut dst, strategy)))
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_lab);
criterion_main!(benches);
