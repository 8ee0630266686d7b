//! Marketing copy generation
//!
//! Titles come from a [`TextGenerator`]. Whatever it returns is cleaned and
//! truncated; any failure falls back to the product name.

use crate::{
    error::{BannerError, Result},
    text::truncate_chars,
};
use tracing::warn;

/// Longest title accepted from a generator, in characters
pub const MAX_COPY_CHARS: usize = 50;

/// Request crossing the text generation boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub product_name: String,
    /// Free-form instruction such as "Generate a SHORT catchy luxury title"
    pub style_hint: String,
}

impl CopyRequest {
    pub fn new<N: Into<String>, S: Into<String>>(product_name: N, style_hint: S) -> Self {
        Self {
            product_name: product_name.into(),
            style_hint: style_hint.into(),
        }
    }

    /// Single user message sent to chat models
    #[must_use]
    pub fn message(&self) -> String {
        format!("{}\nProduct: {}", self.style_hint, self.product_name)
    }
}

/// Source of short marketing strings
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, request: &CopyRequest) -> Result<String>;
}

/// Returns the product name unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCopy;

impl TextGenerator for StaticCopy {
    fn name(&self) -> &str {
        "static"
    }

    fn generate(&self, request: &CopyRequest) -> Result<String> {
        Ok(request.product_name.clone())
    }
}

/// Trim whitespace and surrounding quotes, keep the first line, cap the length
#[must_use]
pub fn clean_copy(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or_default();
    let unquoted = first_line
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '«' | '»'))
        .trim();
    truncate_chars(unquoted, MAX_COPY_CHARS).trim_end().to_string()
}

/// Ask `generator` for a title, falling back to the product name
///
/// Errors and empty results are logged at WARN, never returned.
pub fn generate_or_fallback(generator: Option<&dyn TextGenerator>, request: &CopyRequest) -> String {
    let Some(generator) = generator else {
        return request.product_name.clone();
    };
    match generator.generate(request) {
        Ok(raw) => {
            let cleaned = clean_copy(&raw);
            if cleaned.is_empty() {
                warn!(generator = generator.name(), "Copy generator returned nothing usable, using product name");
                request.product_name.clone()
            } else {
                cleaned
            }
        },
        Err(e) => {
            warn!(generator = generator.name(), error = %e, "Copy generation failed, using product name");
            request.product_name.clone()
        },
    }
}

#[cfg(feature = "remote")]
pub use remote::{ChatCompletionCopywriter, GROQ_BASE_URL};

#[cfg(feature = "remote")]
mod remote {
    use super::{CopyRequest, TextGenerator};
    use crate::error::{BannerError, Result};
    use reqwest::blocking::Client as HttpClient;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tracing::{debug, info};

    pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
    const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
    const MAX_TOKENS: u32 = 100;

    /// OpenAI-compatible `/chat/completions` client, Groq by default
    #[derive(Debug, Clone)]
    pub struct ChatCompletionCopywriter {
        http: HttpClient,
        base_url: String,
        api_key: String,
        model: String,
    }

    impl ChatCompletionCopywriter {
        pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
            let http = HttpClient::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| BannerError::http(format!("failed to build HTTP client: {e}")))?;
            Ok(Self {
                http,
                base_url: GROQ_BASE_URL.to_string(),
                api_key: api_key.into(),
                model: DEFAULT_MODEL.to_string(),
            })
        }

        #[must_use]
        pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
            self.base_url = url.into().trim_end_matches('/').to_string();
            self
        }

        #[must_use]
        pub fn model<S: Into<String>>(mut self, model: S) -> Self {
            self.model = model.into();
            self
        }

        pub fn build_payload(&self, request: &CopyRequest) -> Value {
            json!({
                "model": self.model,
                "max_tokens": MAX_TOKENS,
                "messages": [{ "role": "user", "content": request.message() }],
            })
        }

        /// Text of the first choice
        pub fn extract_content(payload: &Value) -> Result<String> {
            payload
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| BannerError::text_generation("response has no message content"))
        }
    }

    impl TextGenerator for ChatCompletionCopywriter {
        fn name(&self) -> &str {
            "chat-completion"
        }

        fn generate(&self, request: &CopyRequest) -> Result<String> {
            let endpoint = format!("{}/chat/completions", self.base_url);
            info!(endpoint = %endpoint, model = %self.model, "Requesting marketing copy");

            let response = self
                .http
                .post(&endpoint)
                .bearer_auth(&self.api_key)
                .json(&self.build_payload(request))
                .send()
                .map_err(|e| BannerError::http(format!("request to {endpoint} failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(BannerError::text_generation(format!("{endpoint} returned {status}")));
            }
            let parsed: Value = response
                .json()
                .map_err(|e| BannerError::http(format!("invalid JSON from {endpoint}: {e}")))?;
            let content = Self::extract_content(&parsed)?;
            debug!(chars = content.chars().count(), "Received marketing copy");
            Ok(content)
        }
    }

}

/// Fails on every call; used when a remote generator was requested but cannot be built
#[derive(Debug, Clone)]
pub struct UnavailableCopy {
    reason: String,
}

impl UnavailableCopy {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextGenerator for UnavailableCopy {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn generate(&self, _request: &CopyRequest) -> Result<String> {
        Err(BannerError::text_generation(self.reason.clone()))
    }
}
