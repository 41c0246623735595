//! Benchmarks for the cleanup stages
//!
//! Run with: cargo bench --bench pipeline_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use std::time::Duration;

use lus_preprocess::{
    inpaint_telea, DotClusterOptions, DotClusterRemover, ImageCleaner, RoiCropOptions,
    RoiCropper, SmallBlobOptions, SmallBlobRemover, TextDetection, TextDetector,
};

struct NoTextDetector;

impl TextDetector for NoTextDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextDetection>> {
        Ok(Vec::new())
    }
}

/// Synthetic frame: textured scan area, a dot column and a marker
fn create_frame(width: u32, height: u32) -> DynamicImage {
    let mut rgb = RgbImage::new(width, height);
    let (x0, y0) = (width / 8, height / 8);
    let (x1, y1) = (width - width / 8, height - height / 8);

    for y in y0..y1 {
        for x in x0..x1 {
            let speckle = ((x * 31 + y * 17) % 40) as u8;
            rgb.put_pixel(x, y, Rgb([70 + speckle; 3]));
        }
    }
    for i in 0..10 {
        let y = y0 + 10 + i * 12;
        if y + 2 < y1 {
            for dy in 0..2 {
                for dx in 0..2 {
                    rgb.put_pixel(x0 + 12 + dx, y + dy, Rgb([255, 255, 255]));
                }
            }
        }
    }
    for y in y0 + 20..y0 + 45 {
        for x in x1 - 60..x1 - 35 {
            rgb.put_pixel(x, y, Rgb([250, 250, 250]));
        }
    }
    DynamicImage::ImageRgb8(rgb)
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stages");
    group.measurement_time(Duration::from_secs(5));

    let frame = create_frame(640, 480);
    group.throughput(Throughput::Elements((640 * 480) as u64));

    group.bench_function("roi_crop", |b| {
        b.iter(|| RoiCropper::crop(black_box(&frame), &RoiCropOptions::default()).unwrap())
    });
    group.bench_function("small_blob", |b| {
        b.iter(|| SmallBlobRemover::remove(black_box(&frame), &SmallBlobOptions::default()).unwrap())
    });
    group.bench_function("dot_cluster", |b| {
        b.iter(|| DotClusterRemover::remove(black_box(&frame), &DotClusterOptions::default()).unwrap())
    });

    group.finish();
}

fn bench_inpaint(c: &mut Criterion) {
    let mut group = c.benchmark_group("Inpaint");

    let frame = create_frame(320, 240);
    for &hole in &[8u32, 32, 64] {
        let mut mask = GrayImage::new(320, 240);
        for y in 120 - hole / 2..120 + hole / 2 {
            for x in 160 - hole / 2..160 + hole / 2 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        group.bench_with_input(BenchmarkId::new("telea", hole), &mask, |b, mask| {
            b.iter(|| {
                let mut image = frame.clone();
                inpaint_telea(&mut image, black_box(mask), 4).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Full Pipeline");
    group.measurement_time(Duration::from_secs(10));

    let cleaner = ImageCleaner::new(NoTextDetector);
    for &(width, height) in &[(320u32, 240u32), (640, 480), (1024, 768)] {
        let frame = create_frame(width, height);
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(
            BenchmarkId::new("clean", format!("{width}x{height}")),
            &frame,
            |b, frame| b.iter(|| cleaner.clean(black_box(frame)).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_stages, bench_inpaint, bench_full_pipeline);
criterion_main!(benches);
