//! Performance benchmarks for matte-refine
//!
//! Measures each refinement stage and the full pipeline across image sizes
//! to track regressions.

use criterion::*;
use image::{Luma, Rgb};
use itertools::iproduct;
use matte_refine::{
    build_trimap, mask_to_alpha, normalize_mask, CompositeExt, CutoutPipeline, DecontaminateExt,
    EdgeFeather, FeatherEdgesExt, GammaCompensation, HardenAlphaExt, Image, MaskTensor,
    RefinementProfile, ToneCorrectExt, TrimapRadii,
};
use std::hint::black_box;

const SIZES: [(u32, u32); 3] = [
    (256, 256),  // Small
    (640, 480),  // Medium
    (1280, 720), // HD
];

/// Helper function to create a test RGB image with a gradient pattern
fn create_rgb_image(width: u32, height: u32) -> Image<Rgb<u8>> {
    let mut image: Image<Rgb<u8>> = Image::new(width, height);

    iproduct!(0..height, 0..width).for_each(|(y, x)| {
        let r = ((x * 255) / width) as u8;
        let g = ((y * 255) / height) as u8;
        let b = ((x + y) * 255 / (width + height)) as u8;
        image.put_pixel(x, y, Rgb([r, g, b]));
    });

    image
}

/// Helper function to create a soft elliptical score map at model resolution
fn create_raw_mask(side: u32) -> MaskTensor {
    let mut mask: MaskTensor = Image::new(side, side);
    let center = side as f32 / 2.0;
    let radius = side as f32 / 3.0;

    iproduct!(0..side, 0..side).for_each(|(y, x)| {
        let distance = (x as f32 - center).hypot(y as f32 - center);
        // Logit-like falloff around the silhouette
        let score = (radius - distance) / 4.0;
        mask.put_pixel(x, y, Luma([score]));
    });

    mask
}

fn full_resolution_alpha(width: u32, height: u32) -> Image<Luma<u8>> {
    let mask = normalize_mask(create_raw_mask(320), (width, height), None)
        .expect("benchmark mask is not empty");
    mask_to_alpha(&mask)
}

/// Benchmark mask normalization and Lanczos resize
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_mask");
    group.sample_size(10);

    let raw = create_raw_mask(320);
    for (width, height) in SIZES {
        group.throughput(Throughput::Elements(u64::from(width * height)));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &raw,
            |b, raw| {
                b.iter(|| black_box(normalize_mask(raw.clone(), (width, height), None).unwrap()))
            },
        );
    }

    group.finish();
}

/// Benchmark trimap construction and alpha hardening
fn bench_trimap_and_harden(c: &mut Criterion) {
    let mut group = c.benchmark_group("trimap_and_harden");
    group.sample_size(10);

    let profile = RefinementProfile::standard();
    for (width, height) in SIZES {
        group.throughput(Throughput::Elements(u64::from(width * height)));
        let alpha = full_resolution_alpha(width, height);

        group.bench_with_input(
            BenchmarkId::new("build_trimap", format!("{width}x{height}")),
            &alpha,
            |b, alpha| b.iter(|| black_box(build_trimap(alpha, TrimapRadii::default()))),
        );
        group.bench_with_input(
            BenchmarkId::new("harden_alpha", format!("{width}x{height}")),
            &alpha,
            |b, alpha| b.iter(|| black_box(alpha.clone().harden_alpha(&profile.hardening()))),
        );

        let trimap = build_trimap(&alpha, TrimapRadii::default());
        group.bench_with_input(
            BenchmarkId::new("feather_edges", format!("{width}x{height}")),
            &(alpha, trimap),
            |b, (alpha, trimap)| {
                b.iter(|| {
                    black_box(
                        alpha
                            .clone()
                            .feather_edges(trimap, EdgeFeather::default())
                            .unwrap(),
                    )
                })
            },
        );
    }

    group.finish();
}

/// Benchmark both decontamination strategies on a soft alpha
fn bench_decontaminate(c: &mut Criterion) {
    let mut group = c.benchmark_group("decontaminate");
    group.sample_size(10);

    let strategies = [
        ("boundary_inpaint", RefinementProfile::standard()),
        ("interior_expansion", RefinementProfile::aggressive()),
    ];

    for ((width, height), (name, profile)) in iproduct!(SIZES, strategies) {
        group.throughput(Throughput::Elements(u64::from(width * height)));
        let image = create_rgb_image(width, height);
        let alpha = full_resolution_alpha(width, height);
        let params = profile.decontamination_params();

        group.bench_with_input(
            BenchmarkId::new(name, format!("{width}x{height}")),
            &(image, alpha),
            |b, (img, alpha)| {
                b.iter(|| black_box(img.clone().decontaminate(alpha, &params).unwrap()))
            },
        );
    }

    group.finish();
}

/// Benchmark tone correction and compositing
fn bench_tone_and_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("tone_and_composite");
    group.sample_size(10);

    for (width, height) in SIZES {
        group.throughput(Throughput::Elements(u64::from(width * height)));
        let image = create_rgb_image(width, height);
        let alpha = full_resolution_alpha(width, height);

        group.bench_with_input(
            BenchmarkId::new("gamma_compensate", format!("{width}x{height}")),
            &(image.clone(), alpha.clone()),
            |b, (img, alpha)| {
                b.iter(|| {
                    black_box(
                        img.clone()
                            .gamma_compensate(alpha, GammaCompensation::default())
                            .unwrap(),
                    )
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("composite", format!("{width}x{height}")),
            &(image, alpha),
            |b, (img, alpha)| b.iter(|| black_box(img.composite(alpha).unwrap())),
        );
    }

    group.finish();
}

/// Benchmark the full pipeline per preset
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let presets = [
        ("standard", RefinementProfile::standard()),
        ("aggressive", RefinementProfile::aggressive()),
        ("soft", RefinementProfile::soft()),
    ];
    let (width, height) = (640, 480);
    let image = create_rgb_image(width, height);
    let raw = create_raw_mask(320);

    for (name, profile) in presets {
        let pipeline = CutoutPipeline::new(profile).expect("preset is valid");
        group.throughput(Throughput::Elements(u64::from(width * height)));
        group.bench_with_input(BenchmarkId::new("refine", name), &raw, |b, raw| {
            b.iter(|| black_box(pipeline.refine(&image, raw.clone()).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_normalize,
    bench_trimap_and_harden,
    bench_decontaminate,
    bench_tone_and_composite,
    bench_pipeline,
);
criterion_main!(benches);
