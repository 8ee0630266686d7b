//! Stable Diffusion WebUI compatible image generator over HTTP

use super::generated::{GenerationRequest, ImageGenerator};
use crate::error::{BannerError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SD_URL: &str = "http://127.0.0.1:7860";
const DEFAULT_STEPS: u32 = 50;
const DEFAULT_CFG_SCALE: f32 = 7.5;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the `/sdapi/v1/txt2img` and `/sdapi/v1/img2img` endpoints
#[derive(Debug, Clone)]
pub struct StableDiffusionHttp {
    http: HttpClient,
    base_url: String,
    steps: u32,
    cfg_scale: f32,
    negative_prompt: String,
}

impl StableDiffusionHttp {
    /// Client with the default 300 s request timeout
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout<S: Into<String>>(base_url: S, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BannerError::http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            negative_prompt: "text, watermark, blurry, low quality".to_string(),
        })
    }

    #[must_use]
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = steps.max(1);
        self
    }

    #[must_use]
    pub fn cfg_scale(mut self, cfg_scale: f32) -> Self {
        self.cfg_scale = cfg_scale;
        self
    }

    #[must_use]
    pub fn negative_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.negative_prompt = prompt.into();
        self
    }

    fn endpoint(&self, inpainting: bool) -> String {
        let path = if inpainting { "img2img" } else { "txt2img" };
        format!("{}/sdapi/v1/{}", self.base_url, path)
    }

    fn encode_png(image: &DynamicImage) -> Result<String> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(BASE64.encode(bytes))
    }

    /// JSON body for a generation request
    pub fn build_payload(&self, request: &GenerationRequest) -> Result<Value> {
        let mut payload = json!({
            "prompt": request.prompt,
            "negative_prompt": self.negative_prompt,
            "width": request.width,
            "height": request.height,
            "steps": self.steps,
            "cfg_scale": self.cfg_scale,
            "batch_size": 1,
        });

        if let (Some(base), Some(mask), Some(object)) =
            (&request.init_image, &request.mask, payload.as_object_mut())
        {
            let base = Self::encode_png(&DynamicImage::ImageRgb8(base.clone()))?;
            let mask = Self::encode_png(&DynamicImage::ImageLuma8(mask.clone()))?;
            object.insert("init_images".to_string(), json!([base]));
            object.insert("mask".to_string(), json!(mask));
            object.insert("denoising_strength".to_string(), json!(1.0));
            object.insert("inpainting_fill".to_string(), json!(1));
            object.insert("inpaint_full_res".to_string(), json!(false));
        }
        Ok(payload)
    }

    /// Decode the first base64 image of a WebUI response
    pub fn decode_response(payload: &Value) -> Result<DynamicImage> {
        let encoded = payload
            .get("images")
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(Value::as_str)
            .ok_or_else(|| BannerError::background_generation("response contains no images"))?;
        // Some servers prefix a data URL header
        let encoded = encoded.rsplit_once(',').map_or(encoded, |(_, data)| data);
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| BannerError::background_generation(format!("image base64 decode failed: {e}")))?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

impl ImageGenerator for StableDiffusionHttp {
    fn name(&self) -> &str {
        "stable-diffusion"
    }

    fn generate(&self, request: &GenerationRequest) -> Result<DynamicImage> {
        let endpoint = self.endpoint(request.is_inpainting());
        let payload = self.build_payload(request)?;
        info!(endpoint = %endpoint, width = request.width, height = request.height, "Requesting image generation");

        let response = self
            .http
            .post(&endpoint)
            .json(&payload)
            .send()
            .map_err(|e| BannerError::http(format!("request to {endpoint} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BannerError::background_generation(format!(
                "{endpoint} returned {status}: {}",
                crate::text::truncate_chars(&body, 200)
            )));
        }

        let parsed: Value = response
            .json()
            .map_err(|e| BannerError::http(format!("invalid JSON from {endpoint}: {e}")))?;
        let image = Self::decode_response(&parsed)?;
        debug!(width = image.width(), height = image.height(), "Decoded generated image");
        Ok(image)
    }
}
