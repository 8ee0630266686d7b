//! Glyph rasterization and font discovery

use super::bitmap::BitmapFont;
use crate::error::{BannerError, Result};
use image::{GrayImage, Luma};
use rusttype::{point, Font, Scale};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Largest pixel size either rasterizer will honor; larger requests are clamped
pub const MAX_FONT_PX: f32 = 2048.0;

/// Turns a string into a coverage mask (0 = empty, 255 = fully inked)
pub trait TextRasterizer: Send + Sync {
    /// Human readable font name for logs
    fn name(&self) -> &str;

    /// Size of the box `render` produces for the same arguments
    fn measure(&self, text: &str, px: f32) -> (u32, u32);

    /// Rasterize `text` at `px` pixel height
    fn render(&self, text: &str, px: f32) -> GrayImage;
}

/// TrueType/OpenType font backed by `rusttype`
pub struct TrueTypeFont {
    font: Font<'static>,
    name: String,
}

impl std::fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeFont").field("name", &self.name).finish()
    }
}

impl TrueTypeFont {
    /// Parse font data already in memory
    pub fn from_bytes<S: Into<String>>(data: Vec<u8>, name: S) -> Result<Self> {
        let name = name.into();
        let font = Font::try_from_vec(data)
            .ok_or_else(|| BannerError::font(format!("'{}' is not a valid TrueType font", name)))?;
        Ok(Self { font, name })
    }

    /// Load a font file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data =
            std::fs::read(path).map_err(|e| BannerError::file_io_error("read font", path, &e))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("truetype")
            .to_string();
        Self::from_bytes(data, name)
    }

    fn layout(&self, text: &str, px: f32) -> (Vec<rusttype::PositionedGlyph<'_>>, u32, u32) {
        let scale = Scale::uniform(px.max(1.0).min(MAX_FONT_PX));
        let v_metrics = self.font.v_metrics(scale);
        let glyphs: Vec<_> = self
            .font
            .layout(text, scale, point(0.0, v_metrics.ascent))
            .collect();

        let mut width: f32 = 0.0;
        for glyph in &glyphs {
            let advance_end = glyph.position().x + glyph.unpositioned().h_metrics().advance_width;
            width = width.max(advance_end);
            if let Some(bb) = glyph.pixel_bounding_box() {
                width = width.max(bb.max.x as f32);
            }
        }
        let height = (v_metrics.ascent - v_metrics.descent).ceil();
        (glyphs, width.ceil().max(0.0) as u32, height.max(0.0) as u32)
    }
}

impl TextRasterizer for TrueTypeFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        if text.is_empty() {
            return (0, 0);
        }
        let (_, width, height) = self.layout(text, px);
        (width, height)
    }

    fn render(&self, text: &str, px: f32) -> GrayImage {
        if text.is_empty() {
            return GrayImage::new(0, 0);
        }
        let (glyphs, width, height) = self.layout(text, px);
        let mut coverage = GrayImage::new(width, height);

        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let x = gx as i32 + bb.min.x;
                let y = gy as i32 + bb.min.y;
                if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
                    return;
                }
                let value = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = coverage.get_pixel_mut(x as u32, y as u32);
                *pixel = Luma([pixel[0].max(value)]);
            });
        }
        coverage
    }
}

/// Font file names tried in order when no explicit font is configured
pub const DEFAULT_FONT_CANDIDATES: [&str; 5] = [
    "DejaVuSans-Bold.ttf",
    "DejaVuSans.ttf",
    "Arial.ttf",
    "arial.ttf",
    "LiberationSans-Regular.ttf",
];

const MAX_SEARCH_DEPTH: usize = 6;

/// Finds a usable TrueType font, falling back to the built-in bitmap font
#[derive(Debug, Clone)]
pub struct FontLocator {
    candidates: Vec<String>,
    search_dirs: Vec<PathBuf>,
}

impl Default for FontLocator {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_FONT_CANDIDATES.iter().map(|s| (*s).to_string()).collect(),
            search_dirs: Self::system_font_dirs(),
        }
    }
}

impl FontLocator {
    /// Locator over explicit directories only
    #[must_use]
    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            ..Self::default()
        }
    }

    /// Replace the candidate file names
    #[must_use]
    pub fn candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// User font directory followed by the usual platform locations
    #[must_use]
    pub fn system_font_dirs() -> Vec<PathBuf> {
        let mut dirs_found = Vec::new();
        if let Some(user) = dirs::font_dir() {
            dirs_found.push(user);
        }
        if let Some(home) = dirs::home_dir() {
            dirs_found.push(home.join(".fonts"));
        }
        for system in [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
            "C:\\Windows\\Fonts",
        ] {
            dirs_found.push(PathBuf::from(system));
        }
        dirs_found
    }

    /// Path of the highest priority candidate present in the search dirs
    #[must_use]
    pub fn find(&self) -> Option<PathBuf> {
        let mut found: HashMap<String, PathBuf> = HashMap::new();
        for dir in self.search_dirs.iter().filter(|d| d.is_dir()) {
            for entry in WalkDir::new(dir)
                .max_depth(MAX_SEARCH_DEPTH)
                .follow_links(true)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file())
            {
                if let Some(name) = entry.file_name().to_str() {
                    if self.candidates.iter().any(|c| c == name) {
                        found
                            .entry(name.to_string())
                            .or_insert_with(|| entry.path().to_path_buf());
                    }
                }
            }
        }
        self.candidates.iter().find_map(|c| found.remove(c))
    }

    /// Load `explicit` if given, otherwise search; never fails
    ///
    /// Unreadable or missing fonts are logged and the built-in bitmap font
    /// is returned instead.
    #[must_use]
    pub fn locate(&self, explicit: Option<&Path>) -> Box<dyn TextRasterizer> {
        if let Some(path) = explicit {
            match TrueTypeFont::from_path(path) {
                Ok(font) => {
                    info!(font = %path.display(), "Loaded font");
                    return Box::new(font);
                },
                Err(e) => warn!(font = %path.display(), error = %e, "Configured font unusable, searching system fonts"),
            }
        }

        if let Some(path) = self.find() {
            match TrueTypeFont::from_path(&path) {
                Ok(font) => {
                    debug!(font = %path.display(), "Using system font");
                    return Box::new(font);
                },
                Err(e) => warn!(font = %path.display(), error = %e, "System font unusable"),
            }
        }

        warn!("No TrueType font found, using built-in bitmap font");
        Box::new(BitmapFont::new())
    }
}
