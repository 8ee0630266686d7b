//! Image I/O operations service
//!
//! This module separates file I/O operations from business logic,
//! making the system more testable and maintainable. Foreground assets are
//! converted to RGBA exactly once here; banners are written atomically.

use crate::{
    config::OutputFormat,
    error::{BannerError, Result},
    types::{Banner, LayerImage},
};
use chrono::{DateTime, Local};
use image::{DynamicImage, RgbaImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Extension-based decoding is tried first, then content sniffing.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use banner_compositor::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("product.png")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(BannerError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                debug!(
                    path = %path_ref.display(),
                    error = %e,
                    "Extension-based loading failed, attempting content-based detection"
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    BannerError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data).map_err(|content_err| {
                    warn!(
                        path = %path_ref.display(),
                        bytes = data.len(),
                        extension_error = %e,
                        "Image could not be decoded"
                    );
                    BannerError::image_load_error(path_ref, &content_err)
                })
            },
        }
    }

    /// Load an image and tag it by alpha presence
    pub fn load_layer<P: AsRef<Path>>(path: P) -> Result<LayerImage> {
        Self::load_image(path).map(LayerImage::from_dynamic)
    }

    /// Load a background-removed product photo as RGBA
    ///
    /// Opaque inputs are accepted with a warning; they cover their whole
    /// placement box.
    pub fn load_foreground<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
        let path_ref = path.as_ref();
        let layer = Self::load_layer(path_ref)?;
        if !layer.has_alpha() {
            warn!(
                path = %path_ref.display(),
                "Foreground has no alpha channel; it will be pasted as an opaque box"
            );
        }
        let rgba = layer.into_rgba();
        debug!(
            path = %path_ref.display(),
            width = rgba.width(),
            height = rgba.height(),
            "Loaded foreground"
        );
        Ok(rgba)
    }

    /// Encode and atomically persist a banner
    ///
    /// # Examples
    /// ```rust,no_run
    /// use banner_compositor::{services::ImageIOService, Banner, BannerMetadata, CanvasSize, OutputFormat};
    /// use image::RgbImage;
    ///
    /// let banner = Banner::new(RgbImage::new(800, 600), BannerMetadata::new(CanvasSize::CLASSIC));
    /// ImageIOService::save_banner(&banner, "banner.jpg", OutputFormat::Jpeg, 90)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save_banner<P: AsRef<Path>>(
        banner: &Banner,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();
        let bytes = banner.to_bytes(format, quality).map_err(|e| {
            BannerError::processing_stage_error(
                "banner encoding",
                &e.to_string(),
                Some(&format!("format: {:?}, path: {}", format, path_ref.display())),
            )
        })?;
        Self::write_atomic(path_ref, &bytes)?;
        debug!(path = %path_ref.display(), bytes = bytes.len(), "Banner written");
        Ok(())
    }

    /// Write `bytes` to a temp file beside `path`, then rename over it
    ///
    /// The temp file is removed on any failure, so `path` either holds the
    /// complete new content or is untouched.
    pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
        let path_ref = path.as_ref();
        let parent = match path_ref.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        std::fs::create_dir_all(&parent)
            .map_err(|e| BannerError::file_io_error("create output directory", &parent, &e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)
            .map_err(|e| BannerError::file_io_error("create temporary file in", &parent, &e))?;
        temp.write_all(bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| BannerError::file_io_error("write temporary file for", path_ref, &e))?;
        temp.persist(path_ref)
            .map_err(|e| BannerError::file_io_error("persist", path_ref, &e.error))?;
        Ok(())
    }

    /// `banner_YYYYMMDD_HHMMSS.<ext>` in `dir`, suffixed `_n` when taken
    pub fn timestamped_output_path<P: AsRef<Path>>(
        dir: P,
        format: OutputFormat,
        now: DateTime<Local>,
    ) -> PathBuf {
        let dir = dir.as_ref();
        let stem = format!("banner_{}", now.format("%Y%m%d_%H%M%S"));
        let extension = format.extension();

        let first = dir.join(format!("{}.{}", stem, extension));
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| dir.join(format!("{}_{}.{}", stem, n, extension)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    /// Check if a file path has a decodable image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| {
                matches!(
                    ext.as_str(),
                    "jpg" | "jpeg" | "png" | "tiff" | "tif"
                )
            })
    }
}
