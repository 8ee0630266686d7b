//! Background providers and the generation fallback policy
//!
//! Every provider returns an RGB image exactly the size of the canvas. A
//! provider that fails, or returns the wrong size, is replaced by a gradient
//! through [`generate_with_fallback`].

pub mod generated;
pub mod gradient;
#[cfg(feature = "remote")]
pub mod http;
pub mod static_image;

pub use generated::{GeneratedBackground, GenerationRequest, ImageGenerator};
pub use gradient::{GradientBackground, GradientPreset};
#[cfg(feature = "remote")]
pub use http::StableDiffusionHttp;
pub use static_image::StaticImageBackground;

use crate::{
    error::{BannerError, Result},
    types::{CanvasSize, PaintMask},
};
use image::RgbImage;
use tracing::{info, warn};

/// Base image and mask for inpainting requests
#[derive(Debug, Clone)]
pub struct InpaintInput {
    /// Pixels outside the paint region are expected to survive unchanged
    pub base: RgbImage,
    pub mask: PaintMask,
}

/// What a background provider is asked to produce
#[derive(Debug, Clone)]
pub struct BackgroundRequest {
    pub canvas: CanvasSize,
    pub prompt: Option<String>,
    pub inpaint: Option<InpaintInput>,
}

impl BackgroundRequest {
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            prompt: None,
            inpaint: None,
        }
    }

    #[must_use]
    pub fn with_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn with_inpaint(mut self, base: RgbImage, mask: PaintMask) -> Self {
        self.inpaint = Some(InpaintInput { base, mask });
        self
    }
}

/// Source of a canvas-sized background layer
pub trait BackgroundProvider: Send + Sync {
    /// Short identifier recorded in banner metadata
    fn name(&self) -> &str;

    /// Produce the background layer
    ///
    /// # Errors
    /// - Generator or transport failures
    /// - Returned image does not match the canvas size
    fn generate(&self, request: &BackgroundRequest) -> Result<RgbImage>;
}

/// Background actually used for a banner
#[derive(Debug, Clone)]
pub struct BackgroundOutcome {
    pub image: RgbImage,
    /// Name of the provider that produced `image`
    pub source: String,
    /// Error of the primary provider when the fallback was used
    pub fallback_reason: Option<String>,
}

impl BackgroundOutcome {
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Reject images whose size differs from the canvas
pub fn ensure_canvas_size(provider: &str, image: &RgbImage, canvas: CanvasSize) -> Result<()> {
    if image.dimensions() != (canvas.width, canvas.height) {
        return Err(BannerError::generation_error_with_source(
            provider,
            "Background generation",
            &format!(
                "returned {}x{}, expected {}",
                image.width(),
                image.height(),
                canvas
            ),
        ));
    }
    Ok(())
}

/// Ask `primary` for a background and substitute the gradient on any failure
///
/// Errors from the primary are logged at WARN and recorded in the outcome;
/// only a failure of the gradient itself is returned.
pub fn generate_with_fallback(
    primary: &dyn BackgroundProvider,
    fallback: &GradientBackground,
    request: &BackgroundRequest,
) -> Result<BackgroundOutcome> {
    let attempt = primary
        .generate(request)
        .and_then(|image| ensure_canvas_size(primary.name(), &image, request.canvas).map(|()| image));

    match attempt {
        Ok(image) => {
            info!(source = primary.name(), "Background ready");
            Ok(BackgroundOutcome {
                image,
                source: primary.name().to_string(),
                fallback_reason: None,
            })
        },
        Err(e) => {
            warn!(
                source = primary.name(),
                error = %e,
                "Background generation failed, falling back to gradient"
            );
            let image = fallback.generate(request)?;
            Ok(BackgroundOutcome {
                image,
                source: fallback.name().to_string(),
                fallback_reason: Some(e.to_string()),
            })
        },
    }
}
