//! Configuration types for banner compositing operations

use crate::{
    background::GradientPreset,
    error::{BannerError, Result},
    geometry::ProductAnchor,
    text::{advisor::LuminanceModel, TextEffect},
    types::{CanvasSize, RgbColor},
    utils::NumericValidator,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default fraction of the canvas width the product may occupy
pub const DEFAULT_WIDTH_FRACTION: f32 = 0.35;
/// Default padding around the product that the generator must preserve
pub const DEFAULT_MASK_PADDING: u32 = 20;
/// Default margin kept between a height-capped product and the canvas edges
pub const DEFAULT_SAFETY_MARGIN: u32 = 50;

/// Where the banner background comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    /// Deterministic vertical gradient, no external calls
    Gradient,
    /// Text-to-image generation of the whole canvas
    Generate,
    /// Masked generation around the preserved product region
    Inpaint,
    /// User supplied backdrop image resized to the canvas
    Image,
}

impl Default for BackgroundMode {
    fn default() -> Self {
        Self::Gradient
    }
}

impl std::fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gradient => write!(f, "gradient"),
            Self::Generate => write!(f, "generate"),
            Self::Inpaint => write!(f, "inpaint"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless RGB PNG
    Png,
    /// JPEG with configurable quality
    Jpeg,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl OutputFormat {
    /// File extension without the leading dot
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Guess from a path extension; unknown extensions yield `None`
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// Configuration for one banner layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    /// Output frame
    pub canvas: CanvasSize,

    /// Fraction of the canvas width the product may occupy, in (0, 1]
    pub width_fraction: f32,

    /// Where the product sits on the canvas
    pub anchor: ProductAnchor,

    /// Extra preserved pixels around the product in the inpainting mask
    pub mask_padding: u32,

    /// Margin applied when the product has to be capped by canvas height
    pub safety_margin: u32,

    /// Background source
    pub mode: BackgroundMode,

    /// Gradient used in gradient mode and as the fallback for every other mode
    pub gradient: GradientPreset,

    /// Explicit gradient top color, overrides the preset
    pub gradient_top: Option<RgbColor>,

    /// Explicit gradient bottom color, overrides the preset
    pub gradient_bottom: Option<RgbColor>,

    /// Prompt sent to the image generator
    pub background_prompt: String,

    /// Backdrop file for image mode
    pub background_image: Option<PathBuf>,

    /// Style hint sent to the copy generator
    pub copy_prompt: String,

    /// TrueType font; `None` searches the system font directories
    pub font_path: Option<PathBuf>,

    pub title_font_size: f32,
    pub subtitle_font_size: f32,
    pub cta_font_size: f32,

    /// Distance of the title from the top edge
    pub title_top: u32,

    /// Readability pass drawn under every text layer
    pub text_effect: TextEffect,

    /// Draw a translucent box behind the title
    pub title_backdrop: bool,

    /// How the text color advisor measures brightness
    pub luminance_model: LuminanceModel,

    /// Output format
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            width_fraction: DEFAULT_WIDTH_FRACTION,
            anchor: ProductAnchor::default(),
            mask_padding: DEFAULT_MASK_PADDING,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            mode: BackgroundMode::default(),
            gradient: GradientPreset::default(),
            gradient_top: None,
            gradient_bottom: None,
            background_prompt: "Modern minimalist background, professional design, clean".to_string(),
            background_image: None,
            copy_prompt: "Generate a SHORT catchy marketing title for this product".to_string(),
            font_path: None,
            title_font_size: 60.0,
            subtitle_font_size: 36.0,
            cta_font_size: 28.0,
            title_top: 50,
            text_effect: TextEffect::Shadow,
            title_backdrop: false,
            luminance_model: LuminanceModel::default(),
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
        }
    }
}

impl BannerConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use banner_compositor::{BannerConfig, BackgroundMode, CanvasSize};
    ///
    /// let config = BannerConfig::builder()
    ///     .canvas(CanvasSize::CLASSIC)
    ///     .mode(BackgroundMode::Gradient)
    ///     .width_fraction(0.35)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.canvas.width, 800);
    /// ```
    #[must_use]
    pub fn builder() -> BannerConfigBuilder {
        BannerConfigBuilder::default()
    }

    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BannerError::file_io_error("read config", path, &e))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            BannerError::invalid_config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolved gradient endpoints, explicit colors taking precedence over the preset
    #[must_use]
    pub fn gradient_colors(&self) -> (RgbColor, RgbColor) {
        let (top, bottom) = self.gradient.colors();
        (
            self.gradient_top.unwrap_or(top),
            self.gradient_bottom.unwrap_or(bottom),
        )
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Non-positive canvas dimensions
    /// - Width fraction outside (0, 1] or not finite
    /// - Non-positive font sizes, or sizes taller than the canvas
    /// - JPEG quality above 100
    /// - Image mode without a backdrop file
    pub fn validate(&self) -> Result<()> {
        self.canvas.validate()?;

        if !self.width_fraction.is_finite()
            || self.width_fraction <= 0.0
            || self.width_fraction > 1.0
        {
            return Err(BannerError::config_value_error(
                "width fraction",
                self.width_fraction,
                "(0, 1]",
                Some(DEFAULT_WIDTH_FRACTION),
            ));
        }

        for (name, size) in [
            ("title font size", self.title_font_size),
            ("subtitle font size", self.subtitle_font_size),
            ("call-to-action font size", self.cta_font_size),
        ] {
            if !size.is_finite() {
                return Err(BannerError::invalid_config(format!("{name} must be finite")));
            }
            NumericValidator::validate_positive(size, name)?;
            let max = self.canvas.height as f32;
            if size > max {
                return Err(BannerError::config_value_error(
                    name,
                    size,
                    &format!("at most the canvas height ({max})"),
                    None::<f32>,
                ));
            }
        }

        NumericValidator::validate_range(self.jpeg_quality, 0, 100, "JPEG quality").map_err(
            |_| BannerError::config_value_error("JPEG quality", self.jpeg_quality, "0-100", Some(90)),
        )?;

        if self.mode == BackgroundMode::Image && self.background_image.is_none() {
            return Err(BannerError::invalid_config(
                "image background mode requires a background image path",
            ));
        }

        Ok(())
    }
}

/// Builder for `BannerConfig`
#[derive(Debug, Default)]
pub struct BannerConfigBuilder {
    config: BannerConfig,
}

impl BannerConfigBuilder {
    /// Start from an existing configuration, e.g. one loaded from a file
    #[must_use]
    pub fn from_config(config: BannerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn canvas(mut self, canvas: CanvasSize) -> Self {
        self.config.canvas = canvas;
        self
    }

    #[must_use]
    pub fn width_fraction(mut self, fraction: f32) -> Self {
        self.config.width_fraction = fraction;
        self
    }

    #[must_use]
    pub fn anchor(mut self, anchor: ProductAnchor) -> Self {
        self.config.anchor = anchor;
        self
    }

    #[must_use]
    pub fn mask_padding(mut self, padding: u32) -> Self {
        self.config.mask_padding = padding;
        self
    }

    #[must_use]
    pub fn safety_margin(mut self, margin: u32) -> Self {
        self.config.safety_margin = margin;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: BackgroundMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Select a preset; clears explicit gradient colors
    #[must_use]
    pub fn gradient(mut self, preset: GradientPreset) -> Self {
        self.config.gradient = preset;
        self.config.gradient_top = None;
        self.config.gradient_bottom = None;
        self
    }

    #[must_use]
    pub fn gradient_top(mut self, color: RgbColor) -> Self {
        self.config.gradient_top = Some(color);
        self
    }

    #[must_use]
    pub fn gradient_bottom(mut self, color: RgbColor) -> Self {
        self.config.gradient_bottom = Some(color);
        self
    }

    /// Set explicit gradient endpoints
    #[must_use]
    pub fn gradient_colors(mut self, top: RgbColor, bottom: RgbColor) -> Self {
        self.config.gradient_top = Some(top);
        self.config.gradient_bottom = Some(bottom);
        self
    }

    #[must_use]
    pub fn background_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.config.background_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn background_image<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.background_image = Some(path.into());
        self
    }

    #[must_use]
    pub fn copy_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.config.copy_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn font_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    /// Set the title size; subtitle and call-to-action keep their ratio to it
    #[must_use]
    pub fn title_font_size(mut self, size: f32) -> Self {
        let defaults = BannerConfig::default();
        let scale = size / defaults.title_font_size;
        self.config.title_font_size = size;
        self.config.subtitle_font_size = (defaults.subtitle_font_size * scale).max(1.0);
        self.config.cta_font_size = (defaults.cta_font_size * scale).max(1.0);
        self
    }

    #[must_use]
    pub fn title_top(mut self, top: u32) -> Self {
        self.config.title_top = top;
        self
    }

    #[must_use]
    pub fn text_effect(mut self, effect: TextEffect) -> Self {
        self.config.text_effect = effect;
        self
    }

    #[must_use]
    pub fn title_backdrop(mut self, enabled: bool) -> Self {
        self.config.title_backdrop = enabled;
        self
    }

    #[must_use]
    pub fn luminance_model(mut self, model: LuminanceModel) -> Self {
        self.config.luminance_model = model;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<BannerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
