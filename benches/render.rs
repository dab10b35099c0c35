//! Render Benchmarks
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --bench render
//! ```
//!
//! # Metrics Measured
//! - Crop rectangle computation
//! - Full render (crop, resample, filter, logo, JPEG) per catalog format

use std::time::Duration;

use asset_studio::geometry::{compute_crop_rect, FocalPoint};
use asset_studio::render::{Adjustments, CompositeRenderer, GlobalStyle, CATALOG};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Synthetic screenshot with some variation
fn create_test_screenshot(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 7 + y * 11) % 256) as u8,
            ((x * 13 + y * 17) % 256) as u8,
            ((x * 19 + y * 23) % 256) as u8,
        ])
    }))
}

fn bench_crop_rect(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop_rect");

    for format in CATALOG.iter() {
        group.bench_function(format.id, |b| {
            b.iter(|| {
                compute_crop_rect(
                    black_box(2560),
                    black_box(1600),
                    format.width,
                    format.height,
                    black_box(FocalPoint::new(72.0, 18.0)),
                )
            })
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    let source = create_test_screenshot(1920, 1200);
    let renderer = CompositeRenderer::default();
    let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(256, 128, Rgba([255, 255, 255, 200])));
    let style = GlobalStyle::new().with_logo(logo);
    let adjustments = Adjustments::new(110.0, 125.0);

    for format in CATALOG.iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("format", format.id), format, |b, format| {
            b.iter(|| {
                let bytes = renderer
                    .render(black_box(&source), format, FocalPoint::CENTER, &style, adjustments)
                    .unwrap();
                black_box(bytes)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_crop_rect, bench_render);
criterion_main!(benches);
