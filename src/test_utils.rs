//! Test utilities and mock collaborators
//!
//! Mock implementations of [`ImageGenerator`] and [`TextGenerator`] make the
//! pipeline testable without a Stable Diffusion server or an LLM API key.
//! Clones share their call history, so a test can keep one handle while the
//! pipeline owns another.

use crate::{
    background::{GenerationRequest, ImageGenerator},
    error::{BannerError, Result},
    text_gen::{CopyRequest, TextGenerator},
    types::MASK_PRESERVE,
};
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock image generator returning a solid color
#[derive(Debug, Clone)]
pub struct MockImageGenerator {
    /// Fill of every generated image
    color: [u8; 3],
    /// Forced output size; `None` follows the request
    size: Option<(u32, u32)>,
    /// Copy base pixels where the mask says preserve
    preserve_mask: bool,
    /// Whether to simulate a generation failure
    should_fail: bool,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    last_inpainting: Arc<AtomicBool>,
}

impl MockImageGenerator {
    /// Create a mock generator producing `color` at the requested size
    #[must_use]
    pub fn solid(color: [u8; 3]) -> Self {
        Self {
            color,
            size: None,
            preserve_mask: false,
            should_fail: false,
            call_history: Arc::new(Mutex::new(Vec::new())),
            last_inpainting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a mock generator that fails every request
    #[must_use]
    pub fn new_failing() -> Self {
        let mut generator = Self::solid([0, 0, 0]);
        generator.should_fail = true;
        generator
    }

    /// Always answer with a `width` x `height` image
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Behave like a well-mannered inpainting model
    #[must_use]
    pub fn preserving_mask(mut self) -> Self {
        self.preserve_mask = true;
        self
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    /// Clear the call history
    pub fn clear_call_history(&self) {
        self.call_history.lock().unwrap().clear();
    }

    /// Whether the most recent request carried a base image and mask
    pub fn last_request_was_inpainting(&self) -> bool {
        self.last_inpainting.load(Ordering::SeqCst)
    }

    /// Record a method call for testing verification
    fn record_call(&self, call: String) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(call);
        }
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::solid([128, 128, 128])
    }
}

impl ImageGenerator for MockImageGenerator {
    fn name(&self) -> &str {
        "mock-generator"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<DynamicImage> {
        self.record_call(format!("generate:{}", request.prompt));
        self.last_inpainting
            .store(request.is_inpainting(), Ordering::SeqCst);

        if self.should_fail {
            return Err(BannerError::http("Mock generator connection refused"));
        }

        let (width, height) = self.size.unwrap_or((request.width, request.height));
        let mut image = RgbImage::from_pixel(width, height, Rgb(self.color));

        if self.preserve_mask {
            if let (Some(base), Some(mask)) = (&request.init_image, &request.mask) {
                for (x, y, pixel) in image.enumerate_pixels_mut() {
                    let preserved = mask
                        .get_pixel_checked(x, y)
                        .is_some_and(|value| value.0[0] == MASK_PRESERVE);
                    if let (true, Some(source)) = (preserved, base.get_pixel_checked(x, y)) {
                        *pixel = *source;
                    }
                }
            }
        }

        Ok(DynamicImage::ImageRgb8(image))
    }
}

/// Mock copy generator returning a fixed string
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    response: Option<String>,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockTextGenerator {
    #[must_use]
    pub fn returning<S: Into<String>>(response: S) -> Self {
        Self {
            response: Some(response.into()),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock generator that fails every request
    #[must_use]
    pub fn new_failing() -> Self {
        Self {
            response: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }
}

impl TextGenerator for MockTextGenerator {
    fn name(&self) -> &str {
        "mock-copywriter"
    }

    fn generate(&self, request: &CopyRequest) -> Result<String> {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(format!("generate:{}", request.product_name));
        }
        self.response
            .clone()
            .ok_or_else(|| BannerError::text_generation("Mock copywriter rate limited"))
    }
}
