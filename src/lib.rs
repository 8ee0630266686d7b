#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Banner Compositor Library
//!
//! A Rust library for composing marketing banners from a product photo with a
//! transparent background, a generated or gradient backdrop and readable text.
//!
//! The pipeline scales and places the product on a fixed canvas, derives an
//! inpainting mask that protects the product region, asks a background
//! provider for the backdrop, picks text colors from the luminance underneath
//! and draws the title, subtitle and call-to-action button.
//!
//! ## Features
//!
//! - **Geometry Planning**: Width-first scaling with a height cap, anchors and padded inpainting masks
//! - **Backgrounds**: Gradient presets, user images, and Stable Diffusion text-to-image or inpainting
//! - **Fallback First**: Any background or copy generation failure degrades to a gradient or the product name
//! - **Readable Text**: Luminance-based text colors with shadow or outline passes and optional backdrops
//! - **Fonts**: TrueType rendering via `rusttype` with a built-in bitmap font when no font is installed
//! - **Atomic Output**: PNG or JPEG written through a temporary file and renamed into place
//! - **CLI Integration**: Optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use banner_compositor::{
//!     BannerConfig, BannerCopy, BannerPipeline, CanvasSize, GradientPreset, ImageIOService,
//!     OutputFormat,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = BannerConfig::builder()
//!     .canvas(CanvasSize::SOCIAL)
//!     .gradient(GradientPreset::Sunset)
//!     .build()?;
//! let pipeline = BannerPipeline::builder().config(config).build()?;
//!
//! let product = ImageIOService::load_foreground("shoe.png")?;
//! let copy = BannerCopy::new("Trail Shoe")
//!     .with_subtitle("Built for the long run")
//!     .with_cta("SHOP NOW");
//! let banner = pipeline.create_to_path(&product, &copy, "banner.png", OutputFormat::Png)?;
//! println!("{}", banner.metadata.timings.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Library vs CLI Usage
//!
//! - **Library Usage**: Planning, compositing and I/O are always available and fully synchronous
//! - **CLI Usage**: Enable the `cli` feature for the command-line interface and progress reporting
//!
//! ### Feature Flags
//!
//! - `remote` (default): Stable Diffusion WebUI image generator and chat-completion copywriter over HTTP
//! - `cli` (default): Command-line interface and progress reporting (optional for library usage)
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! To use only as a library without CLI or network dependencies:
//!
//! ```toml
//! [dependencies]
//! banner-compositor = { version = "0.1", default-features = false }
//! ```
//!
//! ## Custom Collaborators
//!
//! Background providers and copy generators are traits, so tests and
//! applications can plug in their own:
//!
//! ```rust
//! use banner_compositor::{
//!     test_utils::MockImageGenerator, BannerConfig, BannerCopy, BannerPipeline, BackgroundMode,
//!     BitmapFont, CanvasSize, GeneratedBackground,
//! };
//!
//! let config = BannerConfig::builder()
//!     .canvas(CanvasSize::new(400, 200))
//!     .mode(BackgroundMode::Generate)
//!     .build()
//!     .unwrap();
//! let pipeline = BannerPipeline::builder()
//!     .config(config)
//!     .background(Box::new(GeneratedBackground::new(MockImageGenerator::solid([10, 10, 10]))))
//!     .rasterizer(Box::new(BitmapFont::new()))
//!     .build()
//!     .unwrap();
//!
//! let product = image::RgbaImage::from_pixel(50, 50, image::Rgba([255, 0, 0, 255]));
//! let banner = pipeline.create(&product, &BannerCopy::new("Mug")).unwrap();
//! assert_eq!(banner.dimensions(), (400, 200));
//! assert_eq!(banner.metadata.background_source, "mock-generator");
//! ```

pub mod background;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod services;
pub mod test_utils;
pub mod text;
pub mod text_gen;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

// Public API exports
#[cfg(feature = "remote")]
pub use background::StableDiffusionHttp;
pub use background::{
    generate_with_fallback, BackgroundOutcome, BackgroundProvider, BackgroundRequest,
    GeneratedBackground, GenerationRequest, GradientBackground, GradientPreset, ImageGenerator,
    StaticImageBackground,
};
pub use compositor::Compositor;
pub use config::{BackgroundMode, BannerConfig, BannerConfigBuilder, OutputFormat};
pub use error::{BannerError, Result};
pub use geometry::{GeometryPlanner, ProductAnchor};
pub use pipeline::{BannerCopy, BannerOutput, BannerPipeline, BannerPipelineBuilder};
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, ProcessingStage,
    ProgressReporter, ProgressUpdate,
};
pub use text::{
    BitmapFont, CallToAction, FontLocator, LuminanceModel, TextAnchor, TextBackdrop,
    TextColorAdvisor, TextEffect, TextFill, TextPalette, TextRasterizer, TextSpec, TrueTypeFont,
};
#[cfg(feature = "remote")]
pub use text_gen::ChatCompletionCopywriter;
pub use text_gen::{CopyRequest, StaticCopy, TextGenerator, UnavailableCopy};
pub use types::{
    Banner, BannerMetadata, CanvasSize, LayerImage, PaintMask, Placement, Rect, RgbColor,
    StageTimings,
};
pub use utils::NumericValidator;

#[cfg(feature = "cli")]
pub use tracing_config::{
    events, init_cli_tracing, init_library_tracing, spans, TracingConfig, TracingFormat,
};
