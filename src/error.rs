//! Error types for banner compositing operations

use thiserror::Error;

/// Result type alias for banner compositing operations
pub type Result<T> = std::result::Result<T, BannerError>;

/// Comprehensive error types for banner compositing operations
#[derive(Error, Debug)]
pub enum BannerError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format, decoding or encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Canvas or foreground dimensions are non-positive, or the width budget is out of (0, 1]
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The background generator failed or returned an image of the wrong size
    #[error("Background generation failed: {0}")]
    BackgroundGeneration(String),

    /// The copy generator failed or returned nothing usable
    #[error("Text generation failed: {0}")]
    TextGeneration(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Font loading or glyph rasterization errors
    #[error("Font error: {0}")]
    Font(String),

    /// Transport-level failures talking to a remote collaborator
    #[error("HTTP error: {0}")]
    Http(String),

    /// Pixel processing errors
    #[error("Processing error: {0}")]
    Processing(String),
}

impl BannerError {
    /// Create a new invalid geometry error
    pub fn invalid_geometry<S: Into<String>>(msg: S) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a new background generation error
    pub fn background_generation<S: Into<String>>(msg: S) -> Self {
        Self::BackgroundGeneration(msg.into())
    }

    /// Create a new text generation error
    pub fn text_generation<S: Into<String>>(msg: S) -> Self {
        Self::TextGeneration(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new font error
    pub fn font<S: Into<String>>(msg: S) -> Self {
        Self::Font(msg.into())
    }

    /// Create a new HTTP error
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Whether the pipeline may recover from this error by falling back
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::BackgroundGeneration(_) | Self::TextGeneration(_) | Self::Http(_)
        )
    }

    // Enhanced contextual error creators

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create image loading error with format context
    pub fn image_load_error<P: AsRef<std::path::Path>>(path: P, error: &image::ImageError) -> Self {
        let path_display = path.as_ref().display();
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        Self::Image(image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Failed to load image '{}' (format: {}): {}. Supported formats: PNG, JPEG, TIFF",
                path_display, extension, error
            ),
        )))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create background generation error with generator context
    pub fn generation_error_with_source(source: &str, operation: &str, error: &str) -> Self {
        Self::BackgroundGeneration(format!(
            "{} failed using '{}' generator: {}",
            operation, source, error
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = BannerError::invalid_geometry("canvas width is zero");
        assert!(matches!(err, BannerError::InvalidGeometry(_)));

        let err = BannerError::background_generation("timeout");
        assert!(matches!(err, BannerError::BackgroundGeneration(_)));
    }

    #[test]
    fn test_error_display() {
        let err = BannerError::invalid_config("bad padding");
        assert_eq!(err.to_string(), "Invalid configuration: bad padding");

        let err = BannerError::invalid_geometry("fraction 1.5 outside (0, 1]");
        assert_eq!(
            err.to_string(),
            "Invalid geometry: fraction 1.5 outside (0, 1]"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(BannerError::background_generation("x").is_recoverable());
        assert!(BannerError::text_generation("x").is_recoverable());
        assert!(BannerError::http("x").is_recoverable());
        assert!(!BannerError::invalid_geometry("x").is_recoverable());
        assert!(!BannerError::font("x").is_recoverable());
    }

    #[test]
    fn test_enhanced_error_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = BannerError::file_io_error("write banner", Path::new("/out/banner.png"), &io_error);
        let error_string = err.to_string();
        assert!(error_string.contains("write banner"));
        assert!(error_string.contains("/out/banner.png"));

        let err = BannerError::config_value_error("JPEG quality", 150, "0-100", Some(90));
        let error_string = err.to_string();
        assert!(error_string.contains("JPEG quality"));
        assert!(error_string.contains("150"));
        assert!(error_string.contains("Recommended: 90"));

        let err = BannerError::generation_error_with_source("sd-webui", "Inpainting", "connection refused");
        let error_string = err.to_string();
        assert!(error_string.contains("sd-webui"));
        assert!(error_string.contains("Inpainting"));

        let err = BannerError::processing_stage_error("compose", "buffer mismatch", Some("800x600"));
        let error_string = err.to_string();
        assert!(error_string.contains("compose"));
        assert!(error_string.contains("800x600"));
    }
}
