//! End-to-end banner creation
//!
//! [`BannerPipeline`] is the one compositing API front-ends consume. Every
//! collaborator is injected through [`BannerPipelineBuilder`]; nothing is
//! global.

use crate::{
    background::{
        generate_with_fallback, BackgroundProvider, BackgroundRequest, GradientBackground,
        StaticImageBackground,
    },
    compositor::Compositor,
    config::{BackgroundMode, BannerConfig, OutputFormat},
    error::{BannerError, Result},
    geometry::GeometryPlanner,
    services::{NoOpProgressReporter, ProcessingStage, ProgressReporter, ProgressUpdate},
    text::{
        CallToAction, FontLocator, TextAnchor, TextBackdrop, TextColorAdvisor, TextRasterizer,
        TextSpec,
    },
    text_gen::{generate_or_fallback, CopyRequest, TextGenerator},
    types::{Banner, PaintMask, RgbColor},
};
use image::{Rgb, RgbImage, RgbaImage};
use instant::Instant;
use std::path::Path;
use tracing::{info, instrument, span, Level};

/// Vertical gap between title and subtitle
const SUBTITLE_GAP: i64 = 20;
/// Distance of the call-to-action button from the bottom edge
const CTA_BOTTOM_MARGIN: i64 = 40;

/// Words drawn on one banner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerCopy {
    /// Used for title generation and as the fallback title
    pub product_name: String,
    /// Fixed title; skips the text generator when set
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Call-to-action button label
    pub cta: Option<String>,
}

impl BannerCopy {
    pub fn new<S: Into<String>>(product_name: S) -> Self {
        Self {
            product_name: product_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_subtitle<S: Into<String>>(mut self, subtitle: S) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    #[must_use]
    pub fn with_cta<S: Into<String>>(mut self, cta: S) -> Self {
        self.cta = Some(cta.into());
        self
    }
}

/// Banner plus the mask that drove background generation
#[derive(Debug, Clone)]
pub struct BannerOutput {
    pub banner: Banner,
    pub mask: PaintMask,
}

/// Plans, generates and composes banners from product cutouts
pub struct BannerPipeline {
    config: BannerConfig,
    background: Box<dyn BackgroundProvider>,
    fallback: GradientBackground,
    copywriter: Option<Box<dyn TextGenerator>>,
    rasterizer: Box<dyn TextRasterizer>,
    reporter: Box<dyn ProgressReporter>,
}

impl BannerPipeline {
    /// Create a new pipeline builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use banner_compositor::{BannerConfig, BannerCopy, BannerPipeline, BitmapFont, CanvasSize};
    /// use image::{Rgba, RgbaImage};
    ///
    /// let config = BannerConfig::builder().canvas(CanvasSize::CLASSIC).build().unwrap();
    /// let pipeline = BannerPipeline::builder()
    ///     .config(config)
    ///     .rasterizer(Box::new(BitmapFont::new()))
    ///     .build()
    ///     .unwrap();
    ///
    /// let product = RgbaImage::from_pixel(400, 400, Rgba([200, 30, 30, 255]));
    /// let banner = pipeline.create(&product, &BannerCopy::new("Sneakers")).unwrap();
    /// assert_eq!(banner.dimensions(), (800, 600));
    /// ```
    #[must_use]
    pub fn builder() -> BannerPipelineBuilder {
        BannerPipelineBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &BannerConfig {
        &self.config
    }

    /// Name of the primary background provider
    #[must_use]
    pub fn background_name(&self) -> &str {
        self.background.name()
    }

    /// Produce a banner in memory
    pub fn create(&self, foreground: &RgbaImage, copy: &BannerCopy) -> Result<Banner> {
        self.create_with_mask(foreground, copy).map(|output| output.banner)
    }

    /// Produce a banner and keep the inpainting mask
    #[instrument(
        skip(self, foreground, copy),
        fields(
            mode = %self.config.mode,
            canvas = %self.config.canvas,
            foreground = %format!("{}x{}", foreground.width(), foreground.height()),
            product = %copy.product_name
        )
    )]
    pub fn create_with_mask(&self, foreground: &RgbaImage, copy: &BannerCopy) -> Result<BannerOutput> {
        let total_start = Instant::now();
        let config = &self.config;

        self.report(ProcessingStage::Validation, total_start);
        config
            .validate()
            .map_err(|e| self.fail(ProcessingStage::Validation, e))?;

        // Placement, resized product and mask
        let stage_start = Instant::now();
        let (placement, product, mask) = {
            let _span = span!(Level::DEBUG, "planning", canvas = %config.canvas).entered();
            self.report(ProcessingStage::Planning, total_start);
            let placement = GeometryPlanner::plan_with(
                config.canvas,
                foreground.dimensions(),
                config.width_fraction,
                config.anchor,
                config.safety_margin,
            )
            .map_err(|e| self.fail(ProcessingStage::Planning, e))?;
            let product = GeometryPlanner::resize_foreground(foreground, &placement);

            self.report(ProcessingStage::MaskDerivation, total_start);
            let mask = GeometryPlanner::derive_mask(config.canvas, &placement, config.mask_padding)
                .map_err(|e| self.fail(ProcessingStage::MaskDerivation, e))?;
            (placement, product, mask)
        };
        let planning_ms = stage_start.elapsed().as_millis() as u64;

        // Background with gradient fallback
        let stage_start = Instant::now();
        let outcome = {
            let _span = span!(
                Level::INFO,
                "background",
                provider = self.background.name(),
                mode = %config.mode
            )
            .entered();
            self.report(ProcessingStage::BackgroundGeneration, total_start);
            let request = self.background_request(&mask);
            generate_with_fallback(self.background.as_ref(), &self.fallback, &request)
                .map_err(|e| self.fail(ProcessingStage::BackgroundGeneration, e))?
        };
        let background_ms = stage_start.elapsed().as_millis() as u64;

        // Title copy
        let stage_start = Instant::now();
        self.report(ProcessingStage::CopyGeneration, total_start);
        let title = match &copy.title {
            Some(title) => title.clone(),
            None => generate_or_fallback(
                self.copywriter.as_deref(),
                &CopyRequest::new(copy.product_name.clone(), config.copy_prompt.clone()),
            ),
        };
        let copy_ms = stage_start.elapsed().as_millis() as u64;

        // Layers
        self.report(ProcessingStage::Compositing, total_start);
        let (text_specs, buttons) = self.layout_text(&title, copy);
        let compositor = Compositor::new(self.rasterizer.as_ref())
            .with_advisor(TextColorAdvisor::new(config.luminance_model));
        let mut banner = compositor
            .compose_with(&outcome.image, &product, &placement, &text_specs, &buttons)
            .map_err(|e| self.fail(ProcessingStage::Compositing, e))?;

        let metadata = &mut banner.metadata;
        metadata.background_source = outcome.source;
        metadata.fallback_reason = outcome.fallback_reason;
        metadata.title = (!title.trim().is_empty()).then_some(title);
        metadata.timings.planning_ms = planning_ms;
        metadata.timings.background_ms = background_ms;
        metadata.timings.copy_ms = copy_ms;
        metadata.timings.total_ms = total_start.elapsed().as_millis() as u64;

        info!(
            placement = %placement,
            background = %metadata.background_source,
            fallback = metadata.used_fallback(),
            total_ms = metadata.timings.total_ms,
            "Banner created"
        );
        self.reporter.report_completion(&metadata.timings);

        Ok(BannerOutput { banner, mask })
    }

    /// Create a banner and persist it atomically
    ///
    /// Nothing is written at `path` unless the whole banner was produced and
    /// encoded.
    #[instrument(skip(self, foreground, copy, path), fields(path = %path.as_ref().display()))]
    pub fn create_to_path<P: AsRef<Path>>(
        &self,
        foreground: &RgbaImage,
        copy: &BannerCopy,
        path: P,
        format: OutputFormat,
    ) -> Result<Banner> {
        let mut banner = self.create(foreground, copy)?;
        let start = Instant::now();
        self.report(ProcessingStage::FileSaving, start);
        banner
            .save(path.as_ref(), format, self.config.jpeg_quality)
            .map_err(|e| self.fail(ProcessingStage::FileSaving, e))?;
        banner.metadata.timings.total_ms += banner.metadata.timings.encode_ms.unwrap_or(0);
        Ok(banner)
    }

    fn background_request(&self, mask: &PaintMask) -> BackgroundRequest {
        let config = &self.config;
        let request =
            BackgroundRequest::new(config.canvas).with_prompt(config.background_prompt.clone());
        if config.mode == BackgroundMode::Inpaint {
            let base = RgbImage::from_pixel(
                config.canvas.width,
                config.canvas.height,
                Rgb(RgbColor::WHITE.0),
            );
            request.with_inpaint(base, mask.clone())
        } else {
            request
        }
    }

    /// Title at the top, subtitle below it, button at the bottom
    fn layout_text(&self, title: &str, copy: &BannerCopy) -> (Vec<TextSpec>, Vec<CallToAction>) {
        let config = &self.config;
        let title_top = i64::from(config.title_top);
        let mut specs = Vec::with_capacity(2);

        let mut title_spec = TextSpec::new(title, config.title_font_size)
            .with_anchor(TextAnchor::TopCenter { y: title_top })
            .with_effect(config.text_effect);
        if config.title_backdrop {
            title_spec = title_spec.with_backdrop(TextBackdrop::default());
        }
        specs.push(title_spec);

        if let Some(subtitle) = copy.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
            let title_height = if title.trim().is_empty() {
                0
            } else {
                i64::from(self.rasterizer.measure(title, config.title_font_size).1)
            };
            specs.push(
                TextSpec::new(subtitle, config.subtitle_font_size)
                    .with_anchor(TextAnchor::TopCenter {
                        y: title_top + title_height + SUBTITLE_GAP,
                    })
                    .with_effect(config.text_effect),
            );
        }

        let buttons = copy
            .cta
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .map(|label| {
                CallToAction::new(
                    label,
                    config.cta_font_size,
                    TextAnchor::BottomCenter {
                        margin: CTA_BOTTOM_MARGIN,
                    },
                )
            })
            .into_iter()
            .collect();

        (specs, buttons)
    }

    fn report(&self, stage: ProcessingStage, start: Instant) {
        self.reporter.report_progress(ProgressUpdate::new(stage, start));
    }

    fn fail(&self, stage: ProcessingStage, error: BannerError) -> BannerError {
        self.reporter.report_error(stage, &error.to_string());
        error
    }
}

/// Builder for [`BannerPipeline`]
///
/// Unset collaborators are derived from the configuration: the gradient
/// fallback from its gradient colors, the primary background from its mode
/// (gradient or backdrop file), and the rasterizer from the font path or a
/// system font search.
#[derive(Default)]
pub struct BannerPipelineBuilder {
    config: BannerConfig,
    background: Option<Box<dyn BackgroundProvider>>,
    fallback: Option<GradientBackground>,
    copywriter: Option<Box<dyn TextGenerator>>,
    rasterizer: Option<Box<dyn TextRasterizer>>,
    reporter: Option<Box<dyn ProgressReporter>>,
}

impl BannerPipelineBuilder {
    #[must_use]
    pub fn config(mut self, config: BannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Primary background provider
    #[must_use]
    pub fn background(mut self, provider: Box<dyn BackgroundProvider>) -> Self {
        self.background = Some(provider);
        self
    }

    /// Gradient used whenever the primary provider fails
    #[must_use]
    pub fn fallback(mut self, gradient: GradientBackground) -> Self {
        self.fallback = Some(gradient);
        self
    }

    /// Title generator; without one the product name is the title
    #[must_use]
    pub fn copywriter(mut self, generator: Box<dyn TextGenerator>) -> Self {
        self.copywriter = Some(generator);
        self
    }

    #[must_use]
    pub fn rasterizer(mut self, rasterizer: Box<dyn TextRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    #[must_use]
    pub fn progress_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Validate the configuration and assemble the pipeline
    ///
    /// # Errors
    /// - Invalid configuration values
    /// - Generate or inpaint mode without a background provider
    pub fn build(self) -> Result<BannerPipeline> {
        let config = self.config;
        config.validate()?;

        let (top, bottom) = config.gradient_colors();
        let fallback = self
            .fallback
            .unwrap_or_else(|| GradientBackground::new(top, bottom));

        let background = match self.background {
            Some(provider) => provider,
            None => Self::default_background(&config, &fallback)?,
        };

        let rasterizer = self
            .rasterizer
            .unwrap_or_else(|| FontLocator::default().locate(config.font_path.as_deref()));

        info!(
            mode = %config.mode,
            background = background.name(),
            font = rasterizer.name(),
            copywriter = self.copywriter.as_ref().map_or("none", |c| c.name()),
            "Banner pipeline ready"
        );

        Ok(BannerPipeline {
            config,
            background,
            fallback,
            copywriter: self.copywriter,
            rasterizer,
            reporter: self
                .reporter
                .unwrap_or_else(|| Box::new(NoOpProgressReporter)),
        })
    }

    fn default_background(
        config: &BannerConfig,
        fallback: &GradientBackground,
    ) -> Result<Box<dyn BackgroundProvider>> {
        match config.mode {
            BackgroundMode::Gradient => Ok(Box::new(fallback.clone())),
            BackgroundMode::Image => {
                let path = config.background_image.clone().ok_or_else(|| {
                    BannerError::invalid_config("image mode requires background_image")
                })?;
                Ok(Box::new(StaticImageBackground::new(path)))
            },
            BackgroundMode::Generate | BackgroundMode::Inpaint => {
                Err(BannerError::invalid_config(format!(
                    "{} mode requires a background provider",
                    config.mode
                )))
            },
        }
    }
}
