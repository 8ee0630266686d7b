//! Layer compositing: background, product, text and call-to-action overlays
//!
//! All operations are pure pixel transformations on buffers owned by a single
//! `compose` call. Nothing here touches the filesystem.

use crate::{
    error::{BannerError, Result},
    text::{CallToAction, TextColorAdvisor, TextFill, TextPalette, TextRasterizer, TextSpec},
    types::{Banner, BannerMetadata, CanvasSize, Placement, Rect, RgbColor},
};
use image::{DynamicImage, GrayImage, RgbImage, Rgba, RgbaImage};
use instant::Instant;
use tracing::{debug, instrument};

/// Blend `color` over `dst` with coverage `alpha`, rounding to nearest
///
/// `alpha == 255` yields exactly `color`, `alpha == 0` leaves `dst` untouched.
#[inline]
pub fn blend_pixel(dst: &mut Rgba<u8>, color: [u8; 3], alpha: u8) {
    if alpha == 0 {
        return;
    }
    let a = u32::from(alpha);
    let inv = 255 - a;
    for (d, s) in dst.0.iter_mut().zip(color.iter()) {
        *d = ((u32::from(*s) * a + u32::from(*d) * inv + 127) / 255) as u8;
    }
    dst.0[3] = 255;
}

/// Alpha-over paste of `foreground` at (`x`, `y`), using its own alpha as the mask
pub fn alpha_over(base: &mut RgbaImage, foreground: &RgbaImage, x: u32, y: u32) {
    for (fx, fy, pixel) in foreground.enumerate_pixels() {
        let (bx, by) = (x + fx, y + fy);
        if let Some(dst) = base.get_pixel_mut_checked(bx, by) {
            blend_pixel(dst, [pixel[0], pixel[1], pixel[2]], pixel[3]);
        }
    }
}

/// Blend a coverage mask in a solid color with its top-left at (`x`, `y`), clipped
pub fn draw_coverage(canvas: &mut RgbaImage, coverage: &GrayImage, x: i64, y: i64, color: RgbColor) {
    let (width, height) = canvas.dimensions();
    for (cx, cy, value) in coverage.enumerate_pixels() {
        let px = x + i64::from(cx);
        let py = y + i64::from(cy);
        if px < 0 || py < 0 || px >= i64::from(width) || py >= i64::from(height) {
            continue;
        }
        blend_pixel(canvas.get_pixel_mut(px as u32, py as u32), color.0, value[0]);
    }
}

/// Blend a rectangle of solid color, clipped to the canvas
pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: RgbColor, alpha: u8) {
    let size = CanvasSize::new(canvas.width(), canvas.height());
    let Some(clipped) = rect.clip_to(size) else {
        return;
    };
    for y in clipped.y..clipped.bottom() {
        for x in clipped.x..clipped.right() {
            blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color.0, alpha);
        }
    }
}

/// One pixel wide opaque border along the inside of `rect`
pub fn stroke_rect(canvas: &mut RgbaImage, rect: Rect, color: RgbColor) {
    if rect.is_empty() {
        return;
    }
    let right = rect.right() - 1;
    let bottom = rect.bottom() - 1;
    for edge in [
        Rect::from_corners(rect.x, rect.y, rect.right(), rect.y + 1),
        Rect::from_corners(rect.x, bottom, rect.right(), bottom + 1),
        Rect::from_corners(rect.x, rect.y, rect.x + 1, rect.bottom()),
        Rect::from_corners(right, rect.y, right + 1, rect.bottom()),
    ] {
        fill_rect(canvas, edge, color, 255);
    }
}

/// Text never renders taller than the canvas
fn text_px(px: f32, canvas: CanvasSize) -> f32 {
    px.min(canvas.height as f32)
}

/// Move a box so as much of it as possible lies on the canvas
fn keep_on_canvas(origin: (i64, i64), size: (u32, u32), canvas: CanvasSize) -> (i64, i64) {
    let clamp_axis = |pos: i64, len: u32, limit: u32| {
        let slack = i64::from(limit) - i64::from(len);
        pos.clamp(slack.min(0), slack.max(0))
    };
    (
        clamp_axis(origin.0, size.0, canvas.width),
        clamp_axis(origin.1, size.1, canvas.height),
    )
}

/// Stacks layers into the final banner raster
pub struct Compositor<'a> {
    rasterizer: &'a dyn TextRasterizer,
    advisor: TextColorAdvisor,
}

impl<'a> Compositor<'a> {
    pub fn new(rasterizer: &'a dyn TextRasterizer) -> Self {
        Self {
            rasterizer,
            advisor: TextColorAdvisor::default(),
        }
    }

    #[must_use]
    pub fn with_advisor(mut self, advisor: TextColorAdvisor) -> Self {
        self.advisor = advisor;
        self
    }

    /// Composite background, product and text layers
    ///
    /// # Errors
    /// - Foreground larger than its placement
    /// - Placement not inside the background
    pub fn compose(
        &self,
        background: &RgbImage,
        foreground: &RgbaImage,
        placement: &Placement,
        text_specs: &[TextSpec],
    ) -> Result<Banner> {
        self.compose_with(background, foreground, placement, text_specs, &[])
    }

    /// [`Self::compose`] plus call-to-action buttons drawn after the text
    #[instrument(skip_all, fields(canvas = ?background.dimensions(), texts = text_specs.len(), buttons = buttons.len()))]
    pub fn compose_with(
        &self,
        background: &RgbImage,
        foreground: &RgbaImage,
        placement: &Placement,
        text_specs: &[TextSpec],
        buttons: &[CallToAction],
    ) -> Result<Banner> {
        let start = Instant::now();
        let canvas = CanvasSize::new(background.width(), background.height());
        canvas.validate()?;

        if foreground.width() > placement.width || foreground.height() > placement.height {
            return Err(BannerError::invalid_geometry(format!(
                "foreground {}x{} is larger than its placement {}",
                foreground.width(),
                foreground.height(),
                placement
            )));
        }
        if !placement.rect().fits_within(canvas) {
            return Err(BannerError::invalid_geometry(format!(
                "placement {} does not fit canvas {}",
                placement, canvas
            )));
        }

        let mut working = DynamicImage::ImageRgb8(background.clone()).into_rgba8();
        alpha_over(&mut working, foreground, placement.x, placement.y);

        let mut metadata = BannerMetadata::new(canvas);
        metadata.placement = Some(*placement);

        for spec in text_specs {
            if let Some(palette) = self.draw_text(&mut working, spec) {
                metadata.text_colors.push(palette.text.to_string());
            }
        }
        for button in buttons {
            self.draw_button(&mut working, button);
            metadata.text_colors.push(button.label_color.to_string());
        }

        let image = DynamicImage::ImageRgba8(working).into_rgb8();
        metadata.timings.compositing_ms = start.elapsed().as_millis() as u64;
        Ok(Banner::new(image, metadata))
    }

    /// Resolve the palette for a text layer from what is currently underneath
    fn resolve_palette(&self, working: &RgbaImage, spec: &TextSpec, region: Rect) -> TextPalette {
        let mut palette = match spec.fill {
            TextFill::Fixed(color) => TextPalette {
                text: color,
                shadow: self.advisor.contrasting(color),
            },
            TextFill::Auto => self.advisor.pick_for_region(working, region),
        };
        if let Some(shadow) = spec.shadow {
            palette.shadow = shadow;
        }
        palette
    }

    /// Draw one text layer; returns `None` when there was nothing to draw
    fn draw_text(&self, working: &mut RgbaImage, spec: &TextSpec) -> Option<TextPalette> {
        if spec.content.trim().is_empty() {
            debug!("Skipping empty text layer");
            return None;
        }
        let canvas = CanvasSize::new(working.width(), working.height());
        let px = text_px(spec.font_size, canvas);
        let coverage = self.rasterizer.render(&spec.content, px);
        let size = coverage.dimensions();

        let requested = spec.anchor.resolve(canvas, size);
        let (x, y) = keep_on_canvas(requested, size, canvas);
        if (x, y) != requested {
            debug!(requested = ?requested, placed = ?(x, y), "Moved text box onto canvas");
        }
        let text_box = Rect::new(x, y, size.0, size.1);

        // The backdrop is what the text will sit on, so sample after drawing it
        if let Some(backdrop) = spec.backdrop {
            fill_rect(working, text_box.expand(backdrop.padding), backdrop.color, backdrop.alpha);
        }
        let palette = self.resolve_palette(working, spec, text_box);
        for (dx, dy) in spec.effect.offsets(px) {
            draw_coverage(working, &coverage, x + dx, y + dy, palette.shadow);
        }
        draw_coverage(working, &coverage, x, y, palette.text);

        debug!(
            text = %spec.content,
            font = self.rasterizer.name(),
            color = %palette.text,
            shadow = %palette.shadow,
            x,
            y,
            "Drew text layer"
        );
        Some(palette)
    }

    fn draw_button(&self, working: &mut RgbaImage, button: &CallToAction) {
        let canvas = CanvasSize::new(working.width(), working.height());
        let size = (button.width, button.height);
        let (x, y) = keep_on_canvas(button.anchor.resolve(canvas, size), size, canvas);
        let rect = Rect::new(x, y, button.width, button.height);

        fill_rect(working, rect, button.fill, 255);
        stroke_rect(working, rect, button.outline);

        if button.label.trim().is_empty() {
            return;
        }
        let coverage = self.rasterizer.render(&button.label, text_px(button.font_size, canvas));
        let (lw, lh) = coverage.dimensions();
        let label_x = x + (i64::from(button.width) - i64::from(lw)).div_euclid(2);
        let label_y = y + (i64::from(button.height) - i64::from(lh)).div_euclid(2);
        draw_coverage(working, &coverage, label_x, label_y, button.label_color);
        debug!(label = %button.label, x, y, "Drew call-to-action");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{BitmapFont, TextAnchor, TextBackdrop, TextEffect};
    use image::Rgb;

    fn placement(x: u32, y: u32, size: u32) -> Placement {
        Placement {
            width: size,
            height: size,
            x,
            y,
        }
    }

    #[test]
    fn test_blend_pixel_extremes() {
        let mut dst = Rgba([10, 20, 30, 255]);
        blend_pixel(&mut dst, [200, 100, 50], 255);
        assert_eq!(dst, Rgba([200, 100, 50, 255]));

        let mut dst = Rgba([10, 20, 30, 255]);
        blend_pixel(&mut dst, [200, 100, 50], 0);
        assert_eq!(dst, Rgba([10, 20, 30, 255]));

        let mut dst = Rgba([0, 0, 0, 255]);
        blend_pixel(&mut dst, [255, 255, 255], 128);
        assert_eq!(dst, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_alpha_correctness() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(20, 20, Rgb([0, 0, 255]));

        let mut foreground = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        foreground.put_pixel(0, 0, Rgba([12, 34, 56, 255]));
        foreground.put_pixel(1, 0, Rgba([255, 255, 255, 0]));

        let banner = compositor
            .compose(&background, &foreground, &placement(5, 5, 10), &[])
            .unwrap();
        assert_eq!(banner.image.get_pixel(5, 5), &Rgb([12, 34, 56]));
        assert_eq!(banner.image.get_pixel(6, 5), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_transparent_foreground_leaves_background() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(300, 200, Rgb([255, 0, 0]));
        let foreground = RgbaImage::from_pixel(100, 100, Rgba([0, 255, 0, 0]));

        for (x, y) in [(0, 0), (150, 37), (200, 100)] {
            let banner = compositor
                .compose(&background, &foreground, &placement(x, y, 100), &[])
                .unwrap();
            assert_eq!(banner.image, background);
        }
    }

    #[test]
    fn test_oversized_foreground_is_rejected() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::new(100, 100);
        let foreground = RgbaImage::new(60, 60);
        let result = compositor.compose(&background, &foreground, &placement(0, 0, 50), &[]);
        assert!(matches!(result, Err(BannerError::InvalidGeometry(_))));

        let result = compositor.compose(&background, &RgbaImage::new(50, 50), &placement(60, 0, 50), &[]);
        assert!(matches!(result, Err(BannerError::InvalidGeometry(_))));
    }

    #[test]
    fn test_auto_color_follows_background() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let foreground = RgbaImage::new(1, 1);
        let spec = TextSpec::new("HI", 16.0).with_effect(TextEffect::None);

        let bright = RgbImage::from_pixel(100, 60, Rgb([230, 230, 230]));
        let banner = compositor
            .compose(&bright, &foreground, &placement(0, 0, 1), &[spec.clone()])
            .unwrap();
        assert_eq!(banner.metadata.text_colors, vec!["#000000".to_string()]);
        assert!(banner.image.pixels().any(|p| *p == Rgb([0, 0, 0])));

        let dark = RgbImage::from_pixel(100, 60, Rgb([20, 20, 20]));
        let banner = compositor
            .compose(&dark, &foreground, &placement(0, 0, 1), &[spec])
            .unwrap();
        assert_eq!(banner.metadata.text_colors, vec!["#ffffff".to_string()]);
    }

    #[test]
    fn test_shadow_drawn_in_contrasting_color() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(120, 60, Rgb([100, 100, 100]));
        let spec = TextSpec::new("I", 8.0)
            .with_fill(RgbColor::WHITE)
            .with_anchor(TextAnchor::At { x: 10, y: 10 });
        let banner = compositor
            .compose(&background, &RgbaImage::new(1, 1), &placement(0, 0, 1), &[spec])
            .unwrap();

        // top bar of "I" starts at column 1 of the cell
        assert_eq!(banner.image.get_pixel(11, 10), &Rgb([255, 255, 255]));
        // (2, 2) shadow pass below the last row
        assert_eq!(banner.image.get_pixel(13, 18), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_text_is_clipped_not_dropped() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(40, 20, Rgb([0, 0, 0]));
        let spec = TextSpec::new("A VERY LONG HEADLINE", 16.0)
            .with_fill(RgbColor::WHITE)
            .with_effect(TextEffect::None)
            .with_anchor(TextAnchor::At { x: 500, y: 500 });

        let banner = compositor
            .compose(&background, &RgbaImage::new(1, 1), &placement(0, 0, 1), &[spec])
            .unwrap();
        assert_eq!(banner.dimensions(), (40, 20));
        assert!(banner.image.pixels().any(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(40, 20, Rgb([5, 5, 5]));
        let banner = compositor
            .compose(&background, &RgbaImage::new(1, 1), &placement(0, 0, 1), &[TextSpec::new("  ", 20.0)])
            .unwrap();
        assert!(banner.metadata.text_colors.is_empty());
        assert_eq!(banner.image, background);
    }

    #[test]
    fn test_backdrop_darkens_region() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(100, 60, Rgb([200, 200, 200]));
        let spec = TextSpec::new("X", 8.0)
            .with_anchor(TextAnchor::At { x: 40, y: 20 })
            .with_effect(TextEffect::None)
            .with_backdrop(TextBackdrop::default());
        let banner = compositor
            .compose(&background, &RgbaImage::new(1, 1), &placement(0, 0, 1), &[spec])
            .unwrap();

        // inside the padding, outside the glyph: (200 * 75 + 127) / 255 = 59
        assert_eq!(banner.image.get_pixel(32, 12), &Rgb([59, 59, 59]));
        assert_eq!(banner.image.get_pixel(5, 5), &Rgb([200, 200, 200]));
        // sampled on the darkened backdrop, not the bright background
        assert_eq!(banner.metadata.text_colors, vec!["#ffffff".to_string()]);
    }

    #[test]
    fn test_call_to_action_button() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(400, 300, Rgb([0, 0, 0]));
        let button = CallToAction::new("BUY NOW", 16.0, TextAnchor::At { x: 50, y: 200 });

        let banner = compositor
            .compose_with(&background, &RgbaImage::new(1, 1), &placement(0, 0, 1), &[], &[button])
            .unwrap();
        assert_eq!(banner.image.get_pixel(50, 200), &Rgb([255, 255, 255]));
        assert_eq!(banner.image.get_pixel(52, 202), &Rgb([0xff, 0x6b, 0x6b]));
        assert_eq!(banner.image.get_pixel(249, 259), &Rgb([255, 255, 255]));
        assert_eq!(banner.image.get_pixel(250, 260), &Rgb([0, 0, 0]));
        assert_eq!(banner.metadata.text_colors, vec!["#ffffff".to_string()]);
    }

    #[test]
    fn test_oversized_text_is_clamped_to_canvas_height() {
        let font = BitmapFont::new();
        let compositor = Compositor::new(&font);
        let background = RgbImage::from_pixel(80, 40, Rgb([0, 0, 0]));
        let spec = TextSpec::new("SNEAKERS", 1.0e10)
            .with_fill(RgbColor::new(255, 0, 0))
            .with_effect(TextEffect::None);
        let button = CallToAction::new("GO", f32::MAX, TextAnchor::At { x: 0, y: 0 });

        let banner = compositor
            .compose_with(&background, &RgbaImage::new(1, 1), &placement(0, 0, 1), &[spec], &[button])
            .unwrap();
        assert_eq!(banner.dimensions(), (80, 40));
        assert!((text_px(1.0e10, CanvasSize::new(80, 40)) - 40.0).abs() < f32::EPSILON);
        assert!((text_px(16.0, CanvasSize::new(80, 40)) - 16.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_keep_on_canvas() {
        let canvas = CanvasSize::new(100, 50);
        assert_eq!(keep_on_canvas((10, 10), (20, 20), canvas), (10, 10));
        assert_eq!(keep_on_canvas((95, -5), (20, 20), canvas), (80, 0));
        // wider than the canvas: stays between overhang and origin
        assert_eq!(keep_on_canvas((-200, 0), (150, 20), canvas), (-50, 0));
        assert_eq!(keep_on_canvas((30, 0), (150, 20), canvas), (0, 0));
    }
}
