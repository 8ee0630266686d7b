//! Core types for banner compositing operations

use crate::{
    config::OutputFormat,
    error::{BannerError, Result},
};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Fixed output frame of a banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Social media link preview (1200x630)
    pub const SOCIAL: Self = Self::new(1200, 630);
    /// Classic web banner (800x600)
    pub const CLASSIC: Self = Self::new(800, 600);
    /// Wide banner used by inpainting layouts (1200x640)
    pub const WIDE: Self = Self::new(1200, 640);

    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reject non-positive dimensions
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BannerError::invalid_geometry(format!(
                "canvas dimensions must be positive, got {}",
                self
            )));
        }
        Ok(())
    }

    /// Full-canvas rectangle
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::SOCIAL
    }
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for CanvasSize {
    type Err = BannerError;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| BannerError::invalid_config(format!("canvas '{s}' is not WIDTHxHEIGHT")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| BannerError::invalid_config(format!("canvas '{s}': {e}")))
        };
        let canvas = Self::new(parse(w)?, parse(h)?);
        canvas.validate()?;
        Ok(canvas)
    }
}

impl From<(u32, u32)> for CanvasSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// 8-bit RGB color, written as `#rrggbb` in configuration files and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbColor(pub [u8; 3]);

impl RgbColor {
    pub const BLACK: Self = Self([0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255]);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    #[must_use]
    pub fn to_rgba(self, alpha: u8) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, alpha])
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for RgbColor {
    type Err = BannerError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(BannerError::invalid_config(format!(
                "color '{s}' is not in #rrggbb form"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|part| u8::from_str_radix(part, 16).ok())
                .ok_or_else(|| BannerError::invalid_config(format!("color '{s}' is not valid hex")))
        };
        Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

impl TryFrom<String> for RgbColor {
    type Error = BannerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RgbColor> for String {
    fn from(color: RgbColor) -> Self {
        color.to_string()
    }
}

impl From<[u8; 3]> for RgbColor {
    fn from(channels: [u8; 3]) -> Self {
        Self(channels)
    }
}

impl From<RgbColor> for Rgb<u8> {
    fn from(color: RgbColor) -> Self {
        Rgb(color.0)
    }
}

/// Axis-aligned rectangle; the origin may lie outside the canvas before clipping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from inclusive-exclusive corner coordinates
    #[must_use]
    pub fn from_corners(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        let width = (right - left).max(0) as u32;
        let height = (bottom - top).max(0) as u32;
        Self::new(left, top, width, height)
    }

    #[must_use]
    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    #[must_use]
    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Grow by `amount` on every side
    #[must_use]
    pub fn expand(&self, amount: u32) -> Self {
        let amount_i = i64::from(amount);
        Self::from_corners(
            self.x - amount_i,
            self.y - amount_i,
            self.right() + amount_i,
            self.bottom() + amount_i,
        )
    }

    /// Intersection with the canvas, `None` when nothing remains
    #[must_use]
    pub fn clip_to(&self, canvas: CanvasSize) -> Option<Self> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.right().min(i64::from(canvas.width));
        let bottom = self.bottom().min(i64::from(canvas.height));
        let clipped = Self::from_corners(left, top, right, bottom);
        (!clipped.is_empty()).then_some(clipped)
    }

    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    #[must_use]
    pub fn fits_within(&self, canvas: CanvasSize) -> bool {
        canvas.rect().contains_rect(self)
    }
}

/// Scaled foreground size plus its top-left offset on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl Placement {
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn offset(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(i64::from(self.x), i64::from(self.y), self.width, self.height)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({},{})", self.width, self.height, self.x, self.y)
    }
}

/// Value marking pixels the generator may repaint
pub const MASK_PAINT: u8 = 255;
/// Value marking pixels that must be preserved
pub const MASK_PRESERVE: u8 = 0;

/// Canvas-sized single channel inpainting mask (255 = paint, 0 = preserve)
#[derive(Debug, Clone)]
pub struct PaintMask {
    image: GrayImage,
    preserved: Option<Rect>,
}

impl PaintMask {
    /// Mask that allows painting everywhere
    #[must_use]
    pub fn paint_all(canvas: CanvasSize) -> Self {
        Self {
            image: ImageBuffer::from_pixel(canvas.width, canvas.height, Luma([MASK_PAINT])),
            preserved: None,
        }
    }

    /// Mark `rect` (clipped to the canvas) as preserved
    pub(crate) fn preserve(&mut self, rect: Rect) {
        let canvas = self.canvas();
        let Some(clipped) = rect.clip_to(canvas) else {
            return;
        };
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                self.image.put_pixel(x as u32, y as u32, Luma([MASK_PRESERVE]));
            }
        }
        self.preserved = Some(clipped);
    }

    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.image.width(), self.image.height())
    }

    /// Mask value at a pixel, `None` outside the canvas
    #[must_use]
    pub fn value_at(&self, x: u32, y: u32) -> Option<u8> {
        self.image.get_pixel_checked(x, y).map(|p| p[0])
    }

    /// Clipped preserved rectangle, if any
    #[must_use]
    pub fn preserved_rect(&self) -> Option<Rect> {
        self.preserved
    }

    /// Fraction of the canvas the generator may repaint
    #[must_use]
    pub fn paint_ratio(&self) -> f32 {
        let total = self.image.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        let paint = self.image.as_raw().iter().filter(|&&v| v == MASK_PAINT).count();
        paint as f32 / total as f32
    }

    #[must_use]
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Whether every preserved pixel of `generated` equals `base`
    ///
    /// Generators are trusted to honour the mask; callers that need the
    /// guarantee can check it here.
    #[must_use]
    pub fn preserved_pixels_match(&self, base: &RgbImage, generated: &RgbImage) -> bool {
        if base.dimensions() != self.image.dimensions()
            || generated.dimensions() != self.image.dimensions()
        {
            return false;
        }
        self.image
            .enumerate_pixels()
            .filter(|(_, _, v)| v[0] == MASK_PRESERVE)
            .all(|(x, y, _)| base.get_pixel(x, y) == generated.get_pixel(x, y))
    }

    /// Save mask as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        crate::services::ImageIOService::write_atomic(path, &bytes)
    }
}

/// Raster tagged with whether it carries an alpha channel
///
/// Conversion happens once at ingestion; downstream code matches on the tag
/// instead of inspecting pixel formats.
#[derive(Debug, Clone)]
pub enum LayerImage {
    Opaque(RgbImage),
    Alpha(RgbaImage),
}

impl LayerImage {
    #[must_use]
    pub fn from_dynamic(image: DynamicImage) -> Self {
        if image.color().has_alpha() {
            Self::Alpha(image.into_rgba8())
        } else {
            Self::Opaque(image.into_rgb8())
        }
    }

    #[must_use]
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Alpha(_))
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Opaque(img) => img.dimensions(),
            Self::Alpha(img) => img.dimensions(),
        }
    }

    /// RGBA view; opaque layers become fully opaque
    #[must_use]
    pub fn into_rgba(self) -> RgbaImage {
        match self {
            Self::Opaque(img) => DynamicImage::ImageRgb8(img).into_rgba8(),
            Self::Alpha(img) => img,
        }
    }

    /// RGB view; alpha is discarded
    #[must_use]
    pub fn into_rgb(self) -> RgbImage {
        match self {
            Self::Opaque(img) => img,
            Self::Alpha(img) => DynamicImage::ImageRgba8(img).into_rgb8(),
        }
    }
}

/// Per-stage timing breakdown for one banner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub planning_ms: u64,
    pub background_ms: u64,
    pub copy_ms: u64,
    pub compositing_ms: u64,
    pub encode_ms: Option<u64>,
    pub total_ms: u64,
}

impl StageTimings {
    /// Get timing summary for display
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Total: {}ms | Planning: {}ms | Background: {}ms | Copy: {}ms | Compositing: {}ms",
            self.total_ms, self.planning_ms, self.background_ms, self.copy_ms, self.compositing_ms
        );
        if let Some(encode_ms) = self.encode_ms {
            summary.push_str(&format!(" | Encode: {}ms", encode_ms));
        }
        summary
    }
}

/// What happened while producing a banner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerMetadata {
    pub canvas: CanvasSize,
    pub placement: Option<Placement>,
    /// Name of the background provider whose image was used
    pub background_source: String,
    /// Why the primary background provider was replaced, if it was
    pub fallback_reason: Option<String>,
    /// Title text actually drawn
    pub title: Option<String>,
    /// Resolved fill color of every drawn text layer, in drawing order
    pub text_colors: Vec<String>,
    pub timings: StageTimings,
}

impl BannerMetadata {
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            placement: None,
            background_source: "none".to_string(),
            fallback_reason: None,
            title: None,
            text_colors: Vec::new(),
            timings: StageTimings::default(),
        }
    }

    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Final composed RGB banner
#[derive(Debug, Clone)]
pub struct Banner {
    pub image: RgbImage,
    pub metadata: BannerMetadata,
}

impl Banner {
    #[must_use]
    pub fn new(image: RgbImage, metadata: BannerMetadata) -> Self {
        Self { image, metadata }
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Encode into memory in the given format
    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        match format {
            OutputFormat::Png => {
                self.image.write_to(&mut cursor, image::ImageFormat::Png)?;
            },
            OutputFormat::Jpeg => {
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
                encoder.encode_image(&self.image)?;
            },
        }
        Ok(buffer)
    }

    /// Encode as PNG into memory
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes(OutputFormat::Png, 100)
    }

    /// Atomically write the banner; on failure no file is left at `path`
    pub fn save<P: AsRef<Path>>(&mut self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        let encode_start = instant::Instant::now();
        crate::services::ImageIOService::save_banner(self, path, format, quality)?;
        let encode_ms = encode_start.elapsed().as_millis() as u64;
        self.metadata.timings.encode_ms = Some(encode_ms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_parsing() {
        let canvas: CanvasSize = "800x600".parse().unwrap();
        assert_eq!(canvas, CanvasSize::CLASSIC);
        let canvas: CanvasSize = " 1200X630 ".parse().unwrap();
        assert_eq!(canvas, CanvasSize::SOCIAL);

        assert!("800".parse::<CanvasSize>().is_err());
        assert!("0x600".parse::<CanvasSize>().is_err());
        assert!("axb".parse::<CanvasSize>().is_err());
        assert_eq!(CanvasSize::CLASSIC.to_string(), "800x600");
    }

    #[test]
    fn test_color_parsing() {
        let color: RgbColor = "#667eea".parse().unwrap();
        assert_eq!(color, RgbColor::new(102, 126, 234));
        assert_eq!(color.to_string(), "#667eea");
        assert_eq!("FFFFFF".parse::<RgbColor>().unwrap(), RgbColor::WHITE);

        assert!("#12345".parse::<RgbColor>().is_err());
        assert!("#gg0000".parse::<RgbColor>().is_err());

        let json = serde_json::to_string(&RgbColor::BLACK).unwrap();
        assert_eq!(json, "\"#000000\"");
        let back: RgbColor = serde_json::from_str("\"#ff5722\"").unwrap();
        assert_eq!(back, RgbColor::new(255, 87, 34));
    }

    #[test]
    fn test_rect_clipping() {
        let canvas = CanvasSize::new(100, 50);
        let rect = Rect::new(-10, -5, 30, 20);
        let clipped = rect.clip_to(canvas).unwrap();
        assert_eq!(clipped, Rect::new(0, 0, 20, 15));

        let outside = Rect::new(200, 0, 10, 10);
        assert!(outside.clip_to(canvas).is_none());

        let inside = Rect::new(10, 10, 5, 5);
        assert_eq!(inside.clip_to(canvas), Some(inside));
        assert!(inside.fits_within(canvas));
        assert!(!rect.fits_within(canvas));
    }

    #[test]
    fn test_rect_expand_and_contain() {
        let rect = Rect::new(10, 10, 20, 20);
        let grown = rect.expand(5);
        assert_eq!(grown, Rect::new(5, 5, 30, 30));
        assert!(grown.contains_rect(&rect));
        assert!(!rect.contains_rect(&grown));
    }

    #[test]
    fn test_paint_mask_preserve() {
        let mut mask = PaintMask::paint_all(CanvasSize::new(10, 10));
        assert_eq!(mask.paint_ratio(), 1.0);
        mask.preserve(Rect::new(-2, -2, 6, 6));

        assert_eq!(mask.preserved_rect(), Some(Rect::new(0, 0, 4, 4)));
        assert_eq!(mask.value_at(0, 0), Some(MASK_PRESERVE));
        assert_eq!(mask.value_at(3, 3), Some(MASK_PRESERVE));
        assert_eq!(mask.value_at(4, 4), Some(MASK_PAINT));
        assert_eq!(mask.value_at(10, 0), None);
        assert!((mask.paint_ratio() - 0.84).abs() < 1e-6);
    }

    #[test]
    fn test_preserved_pixels_match() {
        let mut mask = PaintMask::paint_all(CanvasSize::new(4, 4));
        mask.preserve(Rect::new(1, 1, 2, 2));

        let base = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let mut generated = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        for (x, y) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            generated.put_pixel(x, y, Rgb([255, 255, 255]));
        }
        assert!(mask.preserved_pixels_match(&base, &generated));

        generated.put_pixel(2, 2, Rgb([0, 0, 0]));
        assert!(!mask.preserved_pixels_match(&base, &generated));
    }

    #[test]
    fn test_layer_image_tagging() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        let layer = LayerImage::from_dynamic(rgba);
        assert!(layer.has_alpha());
        assert_eq!(layer.clone().into_rgb().get_pixel(0, 0), &Rgb([1, 2, 3]));

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 8, 7])));
        let layer = LayerImage::from_dynamic(rgb);
        assert!(!layer.has_alpha());
        assert_eq!(layer.dimensions(), (2, 2));
        assert_eq!(layer.into_rgba().get_pixel(1, 1), &Rgba([9, 8, 7, 255]));
    }

    #[test]
    fn test_timing_summary() {
        let timings = StageTimings {
            planning_ms: 1,
            background_ms: 20,
            copy_ms: 0,
            compositing_ms: 5,
            encode_ms: Some(7),
            total_ms: 33,
        };
        let summary = timings.summary();
        assert!(summary.starts_with("Total: 33ms"));
        assert!(summary.contains("Encode: 7ms"));
    }

    #[test]
    fn test_banner_png_bytes() {
        let banner = Banner::new(
            RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])),
            BannerMetadata::new(CanvasSize::new(3, 2)),
        );
        let bytes = banner.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.to_rgb8().get_pixel(2, 1), &Rgb([1, 2, 3]));
        assert!(!banner.metadata.used_fallback());
    }
}
