//! End-to-end banner workflows
//!
//! Exercises planning, backgrounds, compositing and output together through
//! the public API, with mock generators standing in for remote services.

use banner_compositor::{
    test_utils::{MockImageGenerator, MockTextGenerator},
    BackgroundMode, BannerConfig, BannerCopy, BannerPipeline, BitmapFont, CanvasSize, Compositor,
    GeneratedBackground, GeometryPlanner, GradientBackground, GradientPreset, ImageIOService,
    OutputFormat, ProductAnchor, Result, RgbColor, TextAnchor, TextColorAdvisor, TextEffect,
    TextPalette, TextRasterizer, TextSpec,
};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

fn product(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([0, 200, 0, 255]))
}

fn pipeline_with(config: BannerConfig, generator: Option<MockImageGenerator>) -> BannerPipeline {
    let mut builder = BannerPipeline::builder()
        .config(config)
        .rasterizer(Box::new(BitmapFont::new()));
    if let Some(generator) = generator {
        builder = builder.background(Box::new(GeneratedBackground::new(generator)));
    }
    builder.build().unwrap()
}

#[test]
fn test_centered_square_product() -> Result<()> {
    let placement = GeometryPlanner::plan(CanvasSize::CLASSIC, (400, 400), 0.35)?;
    assert_eq!(placement.size(), (280, 280));
    assert_eq!(placement.offset(), (260, 160));
    Ok(())
}

#[test]
fn test_gradient_rows_match_endpoints() {
    let top = RgbColor::new(100, 150, 200);
    let bottom = RgbColor::new(150, 230, 100);
    let gradient = GradientBackground::new(top, bottom);
    let image = gradient.render(CanvasSize::CLASSIC);

    assert_eq!(image.dimensions(), (800, 600));
    for x in [0, 399, 799] {
        assert_eq!(image.get_pixel(x, 0), &Rgb([100, 150, 200]));
        let last = image.get_pixel(x, 599).0;
        for (channel, expected) in last.iter().zip(bottom.0) {
            assert!(channel.abs_diff(expected) <= 1, "{last:?} vs {bottom}");
        }
    }
    assert_eq!(image, gradient.render(CanvasSize::CLASSIC));
}

#[test]
fn test_transparent_product_leaves_background_untouched() -> Result<()> {
    let font = BitmapFont::new();
    let background = RgbImage::from_pixel(300, 200, Rgb([255, 0, 0]));
    let foreground = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 0]));
    let placement = GeometryPlanner::plan(CanvasSize::new(300, 200), (100, 100), 1.0)?;

    let banner = Compositor::new(&font).compose(&background, &foreground, &placement, &[])?;
    assert_eq!(banner.image, background);
    Ok(())
}

#[test]
fn test_failing_generator_falls_back_to_gradient() -> Result<()> {
    let generator = MockImageGenerator::new_failing();
    let config = BannerConfig::builder()
        .canvas(CanvasSize::CLASSIC)
        .mode(BackgroundMode::Generate)
        .build()?;
    let pipeline = pipeline_with(config, Some(generator.clone()));

    let banner = pipeline.create(&product(400, 400), &BannerCopy::new("Shoe").with_title("Go"))?;

    assert_eq!(banner.dimensions(), (800, 600));
    assert!(banner.metadata.used_fallback());
    assert_eq!(banner.metadata.background_source, "gradient");
    assert_eq!(generator.get_call_history().len(), 1);
    let (top, _) = GradientPreset::Modern.colors();
    assert_eq!(banner.image.get_pixel(0, 0).0, top.0);
    Ok(())
}

#[test]
fn test_inpainting_keeps_product_region() -> Result<()> {
    let generator = MockImageGenerator::solid([30, 30, 30]).preserving_mask();
    let config = BannerConfig::builder()
        .canvas(CanvasSize::CLASSIC)
        .mode(BackgroundMode::Inpaint)
        .anchor(ProductAnchor::Right { margin: 40 })
        .build()?;
    let pipeline = pipeline_with(config, Some(generator.clone()));

    let output = pipeline.create_with_mask(&product(200, 200), &BannerCopy::new("Cup").with_title(""))?;

    assert!(generator.last_request_was_inpainting());
    assert!(!output.banner.metadata.used_fallback());
    let placement = output.banner.metadata.placement.unwrap();
    assert_eq!(placement.size(), (200, 200));
    assert_eq!(placement.offset(), (560, 200));
    assert_eq!(
        output.banner.image.get_pixel(placement.x + 100, placement.y + 100),
        &Rgb([0, 200, 0])
    );
    assert_eq!(output.banner.image.get_pixel(10, 590), &Rgb([30, 30, 30]));

    let preserved = output.mask.preserved_rect().unwrap();
    assert!(preserved.contains_rect(&placement.rect()));
    Ok(())
}

#[test]
fn test_generated_title_is_drawn_and_recorded() -> Result<()> {
    let writer = MockTextGenerator::returning("  \"Brew Better\"\n");
    let pipeline = BannerPipeline::builder()
        .config(BannerConfig::builder().canvas(CanvasSize::CLASSIC).build()?)
        .copywriter(Box::new(writer.clone()))
        .rasterizer(Box::new(BitmapFont::new()))
        .build()?;

    let banner = pipeline.create(&product(100, 100), &BannerCopy::new("Coffee Mug"))?;
    assert_eq!(banner.metadata.title.as_deref(), Some("Brew Better"));
    assert_eq!(writer.get_call_history(), vec!["generate:Coffee Mug"]);
    Ok(())
}

#[test]
fn test_advisor_picks_contrasting_text() {
    assert_eq!(TextColorAdvisor::palette_for_luminance(200.0), TextPalette::DARK_ON_LIGHT);
    assert_eq!(TextColorAdvisor::palette_for_luminance(50.0), TextPalette::LIGHT_ON_DARK);

    let advisor = TextColorAdvisor::default();
    let bright = RgbImage::from_pixel(10, 10, Rgb([230, 230, 230]));
    let dark = RgbImage::from_pixel(10, 10, Rgb([20, 20, 20]));
    assert_eq!(advisor.pick_color(&bright).text, RgbColor::BLACK);
    assert_eq!(advisor.pick_color(&dark).text, RgbColor::WHITE);
}

#[test]
fn test_wide_text_is_clipped_not_dropped() -> Result<()> {
    let font = BitmapFont::new();
    let background = RgbImage::from_pixel(100, 60, Rgb([0, 0, 0]));
    let foreground = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
    let placement = GeometryPlanner::plan(CanvasSize::new(100, 60), (1, 1), 0.5)?;
    let spec = TextSpec::new("WIDE TEXT EXAMPLE HERE", 16.0)
        .with_anchor(TextAnchor::TopCenter { y: 10 })
        .with_fill(RgbColor::new(255, 0, 0))
        .with_effect(TextEffect::None);

    assert!(font.measure(&spec.content, spec.font_size).0 > 100);
    let banner = Compositor::new(&font).compose(&background, &foreground, &placement, &[spec])?;

    let red = banner
        .image
        .pixels()
        .filter(|pixel| pixel.0 == [255, 0, 0])
        .count();
    assert!(red > 0);
    assert_eq!(banner.metadata.text_colors.len(), 1);
    Ok(())
}

#[test]
fn test_bitmap_font_keeps_every_character() {
    let font = BitmapFont::new();
    assert_eq!(font.measure("✓€", 16.0), font.measure("AB", 16.0));
    let coverage = font.render("✓", 16.0);
    assert!(coverage.pixels().any(|pixel| pixel.0[0] > 0));
}

#[test]
fn test_banner_written_to_disk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("nested").join("banner.jpg");
    let pipeline = pipeline_with(
        BannerConfig::builder().canvas(CanvasSize::new(320, 200)).build()?,
        None,
    );

    let banner = pipeline.create_to_path(
        &product(50, 50),
        &BannerCopy::new("Lamp").with_cta("BUY"),
        &path,
        OutputFormat::Jpeg,
    )?;

    assert!(banner.metadata.timings.encode_ms.is_some());
    let reloaded = ImageIOService::load_image(&path)?;
    assert_eq!(reloaded.width(), 320);
    assert_eq!(reloaded.height(), 200);
    Ok(())
}

#[test]
fn test_failed_save_leaves_nothing_behind() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let blocker = temp_dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory")?;
    let pipeline = pipeline_with(BannerConfig::builder().canvas(CanvasSize::new(64, 64)).build()?, None);
    let mut banner = pipeline.create(&product(10, 10), &BannerCopy::new("x"))?;

    let target = blocker.join("banner.png");
    assert!(banner.save(&target, OutputFormat::Png, 90).is_err());
    assert!(!target.exists());

    let entries: Vec<_> = std::fs::read_dir(temp_dir.path())?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<_>>()?;
    assert_eq!(entries, vec![std::ffi::OsString::from("occupied")]);
    Ok(())
}

#[test]
fn test_config_from_json_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("banner.json");
    std::fs::write(
        &path,
        r#"{
            "canvas": { "width": 1200, "height": 640 },
            "mode": "inpaint",
            "anchor": { "kind": "right", "margin": 30 },
            "gradient": "dark-premium",
            "width_fraction": 0.4
        }"#,
    )?;

    let config = BannerConfig::from_json_file(&path)?;
    assert_eq!(config.canvas, CanvasSize::WIDE);
    assert_eq!(config.mode, BackgroundMode::Inpaint);
    assert_eq!(config.anchor, ProductAnchor::Right { margin: 30 });
    assert_eq!(config.gradient_colors(), GradientPreset::DarkPremium.colors());
    assert_eq!(config.mask_padding, 20);

    std::fs::write(&path, r#"{ "width_fraction": 1.5 }"#)?;
    assert!(BannerConfig::from_json_file(&path).is_err());
    Ok(())
}
