//! User supplied backdrop images

use super::{BackgroundProvider, BackgroundRequest};
use crate::{error::Result, services::ImageIOService, types::LayerImage};
use image::{imageops::FilterType, RgbImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Backdrop file stretched to the canvas with Lanczos3
#[derive(Debug, Clone)]
pub struct StaticImageBackground {
    path: PathBuf,
}

impl StaticImageBackground {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackgroundProvider for StaticImageBackground {
    fn name(&self) -> &str {
        "image"
    }

    fn generate(&self, request: &BackgroundRequest) -> Result<RgbImage> {
        request.canvas.validate()?;
        let image = LayerImage::from_dynamic(ImageIOService::load_image(&self.path)?).into_rgb();
        if image.dimensions() == (request.canvas.width, request.canvas.height) {
            return Ok(image);
        }
        debug!(
            from = ?image.dimensions(),
            to = %request.canvas,
            "Resizing backdrop to canvas"
        );
        Ok(image::imageops::resize(
            &image,
            request.canvas.width,
            request.canvas.height,
            FilterType::Lanczos3,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanvasSize;
    use image::Rgb;

    #[test]
    fn test_backdrop_is_resized_to_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backdrop.png");
        RgbImage::from_pixel(30, 10, Rgb([40, 80, 120])).save(&path).unwrap();

        let background = StaticImageBackground::new(&path);
        let image = background
            .generate(&BackgroundRequest::new(CanvasSize::new(60, 40)))
            .unwrap();
        assert_eq!(image.dimensions(), (60, 40));
        assert_eq!(image.get_pixel(30, 20), &Rgb([40, 80, 120]));
    }

    #[test]
    fn test_missing_backdrop_fails() {
        let background = StaticImageBackground::new("/nonexistent/backdrop.png");
        assert!(background
            .generate(&BackgroundRequest::new(CanvasSize::new(10, 10)))
            .is_err());
    }
}
