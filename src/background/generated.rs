//! Backgrounds delegated to an external image generator

use super::{ensure_canvas_size, BackgroundProvider, BackgroundRequest};
use crate::{
    error::{BannerError, Result},
    types::LayerImage,
};
use image::{DynamicImage, GrayImage, RgbImage};
use tracing::{debug, instrument};

/// Request crossing the image generation boundary
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    /// Base image for inpainting; pixels where `mask` is 0 should survive
    pub init_image: Option<RgbImage>,
    /// 255 = paint, 0 = preserve
    pub mask: Option<GrayImage>,
}

impl GenerationRequest {
    #[must_use]
    pub fn is_inpainting(&self) -> bool {
        self.init_image.is_some() && self.mask.is_some()
    }
}

/// External text-to-image or inpainting model
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Produce an image for the request; alpha is dropped by the caller
    fn generate(&self, request: &GenerationRequest) -> Result<DynamicImage>;
}

/// Background produced by an [`ImageGenerator`]
pub struct GeneratedBackground<G: ImageGenerator> {
    generator: G,
    default_prompt: String,
}

impl<G: ImageGenerator> GeneratedBackground<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            default_prompt: "professional marketing banner background, clean, modern".to_string(),
        }
    }

    /// Prompt used when the request carries none
    #[must_use]
    pub fn with_default_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.default_prompt = prompt.into();
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G: ImageGenerator> BackgroundProvider for GeneratedBackground<G> {
    fn name(&self) -> &str {
        self.generator.name()
    }

    #[instrument(skip(self, request), fields(generator = self.generator.name(), canvas = %request.canvas))]
    fn generate(&self, request: &BackgroundRequest) -> Result<RgbImage> {
        request.canvas.validate()?;
        let prompt = request
            .prompt
            .clone()
            .unwrap_or_else(|| self.default_prompt.clone());

        let (init_image, mask) = match &request.inpaint {
            Some(inpaint) => (
                Some(inpaint.base.clone()),
                Some(inpaint.mask.as_image().clone()),
            ),
            None => (None, None),
        };

        let generation = GenerationRequest {
            prompt,
            width: request.canvas.width,
            height: request.canvas.height,
            init_image,
            mask,
        };
        debug!(inpainting = generation.is_inpainting(), "Requesting background");

        let image = self.generator.generate(&generation).map_err(|e| match e {
            BannerError::BackgroundGeneration(_) => e,
            other => BannerError::generation_error_with_source(
                self.generator.name(),
                if generation.is_inpainting() {
                    "Inpainting"
                } else {
                    "Background generation"
                },
                &other.to_string(),
            ),
        })?;

        let image = LayerImage::from_dynamic(image).into_rgb();
        ensure_canvas_size(self.generator.name(), &image, request.canvas)?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::GeometryPlanner,
        test_utils::MockImageGenerator,
        types::{CanvasSize, Placement},
    };
    use image::Rgb;

    #[test]
    fn test_default_prompt_used() {
        let generator = MockImageGenerator::solid([0, 0, 0]);
        let background = GeneratedBackground::new(generator.clone()).with_default_prompt("neon city");
        background
            .generate(&BackgroundRequest::new(CanvasSize::new(8, 8)))
            .unwrap();
        assert_eq!(generator.get_call_history(), vec!["generate:neon city"]);
    }

    #[test]
    fn test_inpainting_request_carries_base_and_mask() {
        let canvas = CanvasSize::new(40, 20);
        let placement = Placement {
            width: 10,
            height: 10,
            x: 15,
            y: 5,
        };
        let mask = GeometryPlanner::derive_mask(canvas, &placement, 2).unwrap();
        let base = RgbImage::from_pixel(40, 20, Rgb([255, 255, 255]));

        let generator = MockImageGenerator::solid([9, 9, 9]).preserving_mask();
        let background = GeneratedBackground::new(generator.clone());
        let request = BackgroundRequest::new(canvas)
            .with_prompt("beach")
            .with_inpaint(base.clone(), mask.clone());
        let image = background.generate(&request).unwrap();

        assert!(generator.last_request_was_inpainting());
        assert!(mask.preserved_pixels_match(&base, &image));
        assert_eq!(image.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_errors_are_background_generation() {
        let background = GeneratedBackground::new(MockImageGenerator::new_failing());
        let err = background
            .generate(&BackgroundRequest::new(CanvasSize::new(8, 8)))
            .unwrap_err();
        assert!(matches!(err, BannerError::BackgroundGeneration(_)));
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let background = GeneratedBackground::new(MockImageGenerator::solid([0, 0, 0]).with_size(4, 4));
        let err = background
            .generate(&BackgroundRequest::new(CanvasSize::new(8, 8)))
            .unwrap_err();
        assert!(matches!(err, BannerError::BackgroundGeneration(_)));
    }
}
