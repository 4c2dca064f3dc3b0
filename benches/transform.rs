use std::hint::black_box;

use alprep::dataset::ImageTransform;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

fn source_image(side: u32) -> DynamicImage {
    let img = RgbImage::from_fn(side, side, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

fn bench_transform(c: &mut Criterion) {
    let transform = ImageTransform::new(64, [0.5; 3], [0.5; 3]).expect("transform");
    for side in [64u32, 256, 512] {
        let image = source_image(side);
        c.bench_with_input(
            BenchmarkId::new("resize_normalize_64", side),
            &image,
            |b, image| b.iter(|| black_box(transform.apply(black_box(image)))),
        );
    }
}

criterion_group!(benches, bench_transform);
criterion_main!(benches);
