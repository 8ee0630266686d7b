//! CLI-specific configuration builder
//!
//! Converts CLI arguments into a [`BannerConfig`]. A `--config` file provides
//! the base; every flag that was given overrides it.

use super::main_impl::Cli;
use crate::config::{BannerConfig, BannerConfigBuilder};
use crate::types::CanvasSize;
use anyhow::{Context, Result};

/// CLI-specific configuration builder
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Convert CLI arguments to a `BannerConfig`
    pub(crate) fn from_cli(cli: &Cli) -> Result<BannerConfig> {
        let base = match &cli.config {
            Some(path) => BannerConfig::from_json_file(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?,
            None => BannerConfig::default(),
        };
        let mut builder = BannerConfigBuilder::from_config(base);

        let canvas = cli.canvas.or_else(|| cli.preset.map(CanvasSize::from));
        if let Some(canvas) = canvas {
            builder = builder.canvas(canvas);
        }
        if let Some(percent) = cli.width_percent {
            builder = builder.width_fraction(percent / 100.0);
        }
        if let Some(anchor) = cli.anchor {
            builder = builder.anchor(anchor);
        }
        if let Some(padding) = cli.padding {
            builder = builder.mask_padding(padding);
        }
        if let Some(mode) = cli.mode {
            builder = builder.mode(mode.into());
        }
        if let Some(preset) = cli.gradient {
            builder = builder.gradient(preset);
        }
        if let Some(top) = cli.gradient_top {
            builder = builder.gradient_top(top);
        }
        if let Some(bottom) = cli.gradient_bottom {
            builder = builder.gradient_bottom(bottom);
        }
        if let Some(prompt) = &cli.prompt {
            builder = builder.background_prompt(prompt.clone());
        }
        if let Some(path) = &cli.background_image {
            builder = builder.background_image(path.clone());
        }
        if let Some(prompt) = &cli.copy_prompt {
            builder = builder.copy_prompt(prompt.clone());
        }
        if let Some(font) = &cli.font {
            builder = builder.font_path(font.clone());
        }
        if let Some(size) = cli.font_size {
            builder = builder.title_font_size(size);
        }
        if cli.title_backdrop {
            builder = builder.title_backdrop(true);
        }
        if let Some(format) = cli.format {
            builder = builder.output_format(format.into());
        }
        if let Some(quality) = cli.jpeg_quality {
            builder = builder.jpeg_quality(quality);
        }

        builder.build().context("Invalid configuration")
    }

    /// Validate CLI arguments before processing
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if let Some(percent) = cli.width_percent {
            if !(percent > 0.0 && percent <= 100.0) {
                anyhow::bail!("Width percent must be in (0, 100], got {}", percent);
            }
        }

        if let Some(quality) = cli.jpeg_quality {
            if quality > 100 {
                anyhow::bail!("JPEG quality must be between 0-100, got {}", quality);
            }
        }

        if let Some(size) = cli.font_size {
            if !(size.is_finite() && size > 0.0) {
                anyhow::bail!("Font size must be positive, got {}", size);
            }
        }

        for (flag, path) in [
            ("--config", &cli.config),
            ("--background-image", &cli.background_image),
            ("--font", &cli.font),
        ] {
            if let Some(path) = path {
                if !path.is_file() {
                    anyhow::bail!("{} file not found: {}", flag, path.display());
                }
            }
        }

        if cli.sd_url.trim().is_empty() {
            anyhow::bail!("--sd-url must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::GradientPreset;
    use crate::config::{BackgroundMode, OutputFormat};
    use crate::geometry::ProductAnchor;
    use crate::types::RgbColor;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["banner-compositor", "product.png"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = CliConfigBuilder::from_cli(&parse(&[])).unwrap();
        assert_eq!(config, BannerConfig::default());
    }

    #[test]
    fn test_cli_config_conversion() {
        let cli = parse(&[
            "--canvas", "800x600",
            "--width-percent", "50",
            "--anchor", "right:40",
            "--mode", "inpaint",
            "--padding", "10",
            "--gradient", "sunset",
            "--top", "#000000",
            "--format", "jpeg",
            "--jpeg-quality", "70",
            "--font-size", "30",
            "--title-backdrop",
        ]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();

        assert_eq!(config.canvas, CanvasSize::CLASSIC);
        assert!((config.width_fraction - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.anchor, ProductAnchor::Right { margin: 40 });
        assert_eq!(config.mode, BackgroundMode::Inpaint);
        assert_eq!(config.mask_padding, 10);
        assert_eq!(
            config.gradient_colors(),
            (RgbColor([0, 0, 0]), GradientPreset::Sunset.colors().1)
        );
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.jpeg_quality, 70);
        assert!((config.title_font_size - 30.0).abs() < f32::EPSILON);
        assert!(config.title_backdrop);
    }

    #[test]
    fn test_canvas_preset() {
        let config = CliConfigBuilder::from_cli(&parse(&["--preset", "classic"])).unwrap();
        assert_eq!(config.canvas, CanvasSize::CLASSIC);

        let conflict = Cli::try_parse_from([
            "banner-compositor",
            "product.png",
            "--preset",
            "wide",
            "--canvas",
            "800x600",
        ]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_config_file_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.json");
        std::fs::write(&path, r#"{ "mask_padding": 5, "jpeg_quality": 50 }"#).unwrap();

        let cli = parse(&["--config", path.to_str().unwrap(), "--jpeg-quality", "80"]);
        CliConfigBuilder::validate_cli(&cli).unwrap();
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.mask_padding, 5);
        assert_eq!(config.jpeg_quality, 80);
    }

    #[test]
    fn test_image_mode_requires_backdrop() {
        let cli = parse(&["--mode", "image"]);
        assert!(CliConfigBuilder::from_cli(&cli).is_err());
    }

    #[test]
    fn test_cli_validation() {
        assert!(CliConfigBuilder::validate_cli(&parse(&[])).is_ok());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--width-percent", "0"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--width-percent", "150"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--jpeg-quality", "150"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--font-size", "0"])).is_err());
        assert!(
            CliConfigBuilder::validate_cli(&parse(&["--background-image", "/nonexistent/bg.png"]))
                .is_err()
        );
    }
}
