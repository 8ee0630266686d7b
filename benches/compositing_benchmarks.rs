use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use banner_compositor::{
    BannerConfig, BannerCopy, BannerPipeline, BitmapFont, CanvasSize, Compositor, GeometryPlanner,
    GradientBackground, GradientPreset, TextAnchor, TextSpec,
};
use image::{Rgba, RgbaImage};

const CANVASES: [(&str, CanvasSize); 3] = [
    ("classic", CanvasSize::CLASSIC),
    ("social", CanvasSize::SOCIAL),
    ("wide", CanvasSize::WIDE),
];

/// Product with a soft alpha ramp so blending is not short-circuited
fn product(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        let alpha = ((x + y) * 255 / (2 * size)) as u8;
        Rgba([200, 40, 40, alpha])
    })
}

fn bench_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient_render");
    let gradient = GradientBackground::from_preset(GradientPreset::Modern);

    for (name, canvas) in CANVASES {
        group.bench_with_input(BenchmarkId::from_parameter(name), &canvas, |b, canvas| {
            b.iter(|| gradient.render(black_box(*canvas)));
        });
    }
    group.finish();
}

fn bench_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");
    let foreground = product(1024);

    group.bench_function("plan_and_mask", |b| {
        b.iter(|| {
            let placement = GeometryPlanner::plan(CanvasSize::SOCIAL, black_box((1024, 1024)), 0.35)
                .unwrap();
            GeometryPlanner::derive_mask(CanvasSize::SOCIAL, &placement, 20).unwrap()
        });
    });

    let placement = GeometryPlanner::plan(CanvasSize::SOCIAL, (1024, 1024), 0.35).unwrap();
    group.bench_function("resize_foreground", |b| {
        b.iter(|| GeometryPlanner::resize_foreground(black_box(&foreground), &placement));
    });
    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let font = BitmapFont::new();
    let compositor = Compositor::new(&font);
    let background = GradientBackground::from_preset(GradientPreset::Ocean).render(CanvasSize::SOCIAL);
    let placement = GeometryPlanner::plan(CanvasSize::SOCIAL, (420, 420), 0.35).unwrap();
    let foreground = product(420);
    let texts = [
        TextSpec::new("Summer Collection", 60.0).with_anchor(TextAnchor::TopCenter { y: 50 }),
        TextSpec::new("Free shipping on every order", 36.0)
            .with_anchor(TextAnchor::TopCenter { y: 126 }),
    ];

    group.bench_function("layers_only", |b| {
        b.iter(|| compositor.compose(&background, black_box(&foreground), &placement, &[]).unwrap());
    });
    group.bench_function("with_text", |b| {
        b.iter(|| compositor.compose(&background, black_box(&foreground), &placement, &texts).unwrap());
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    let config = BannerConfig::builder().canvas(CanvasSize::SOCIAL).build().unwrap();
    let pipeline = BannerPipeline::builder()
        .config(config)
        .rasterizer(Box::new(BitmapFont::new()))
        .build()
        .unwrap();
    let foreground = product(800);
    let copy = BannerCopy::new("Trail Shoe")
        .with_title("Run Further")
        .with_subtitle("Light on every mile")
        .with_cta("SHOP NOW");

    group.bench_function("gradient_banner", |b| {
        b.iter(|| pipeline.create(black_box(&foreground), &copy).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_gradient, bench_planning, bench_compose, bench_pipeline);
criterion_main!(benches);
