//! Text layer descriptions, readability color advice and glyph rasterization

pub mod advisor;
pub mod bitmap;
pub mod font;

pub use advisor::{LuminanceModel, TextColorAdvisor, TextPalette};
pub use bitmap::BitmapFont;
pub use font::{FontLocator, TextRasterizer, TrueTypeFont};

use crate::types::{CanvasSize, RgbColor};
use serde::{Deserialize, Serialize};

/// Offsets of the drop shadow passes, drawn before the main text
pub const SHADOW_OFFSETS: [(i64, i64); 3] = [(1, 1), (2, 2), (-1, -1)];

/// How the fill color of a text layer is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFill {
    /// Let the advisor choose from the luminance underneath
    Auto,
    Fixed(RgbColor),
}

impl Default for TextFill {
    fn default() -> Self {
        Self::Auto
    }
}

/// Readability pass drawn in the contrasting color before the main text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEffect {
    None,
    /// Text re-drawn at [`SHADOW_OFFSETS`]
    Shadow,
    /// Text re-drawn at the 8 neighbouring positions, 1 or 2 px away
    Outline,
}

impl Default for TextEffect {
    fn default() -> Self {
        Self::Shadow
    }
}

impl TextEffect {
    /// Pixel offsets of the contrasting passes for a given font size
    #[must_use]
    pub fn offsets(&self, font_size: f32) -> Vec<(i64, i64)> {
        match self {
            Self::None => Vec::new(),
            Self::Shadow => SHADOW_OFFSETS.to_vec(),
            Self::Outline => {
                let d = if font_size >= 40.0 { 2 } else { 1 };
                let mut offsets = Vec::with_capacity(8);
                for dy in [-d, 0, d] {
                    for dx in [-d, 0, d] {
                        if dx != 0 || dy != 0 {
                            offsets.push((dx, dy));
                        }
                    }
                }
                offsets
            },
        }
    }
}

impl std::str::FromStr for TextEffect {
    type Err = crate::error::BannerError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "shadow" => Ok(Self::Shadow),
            "outline" => Ok(Self::Outline),
            other => Err(crate::error::BannerError::invalid_config(format!(
                "unknown text effect '{other}', expected none, shadow or outline"
            ))),
        }
    }
}

/// Where a text box is placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextAnchor {
    /// Horizontally centered, top edge at `y`
    TopCenter { y: i64 },
    Center,
    /// Horizontally centered, bottom edge `margin` px above the canvas bottom
    BottomCenter { margin: i64 },
    /// Explicit top-left corner
    At { x: i64, y: i64 },
    /// Right edge `margin` px from the canvas right edge, top edge at `y`
    RightAligned { y: i64, margin: i64 },
}

impl TextAnchor {
    /// Top-left corner of a `size` box; may lie outside the canvas
    #[must_use]
    pub fn resolve(&self, canvas: CanvasSize, size: (u32, u32)) -> (i64, i64) {
        let cw = i64::from(canvas.width);
        let ch = i64::from(canvas.height);
        let w = i64::from(size.0);
        let h = i64::from(size.1);
        let centered_x = (cw - w).div_euclid(2);

        match *self {
            Self::TopCenter { y } => (centered_x, y),
            Self::Center => (centered_x, (ch - h).div_euclid(2)),
            Self::BottomCenter { margin } => (centered_x, ch - h - margin),
            Self::At { x, y } => (x, y),
            Self::RightAligned { y, margin } => (cw - w - margin, y),
        }
    }
}

/// Translucent box drawn behind a text layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBackdrop {
    pub color: RgbColor,
    pub alpha: u8,
    pub padding: u32,
}

impl Default for TextBackdrop {
    fn default() -> Self {
        Self {
            color: RgbColor::BLACK,
            alpha: 180,
            padding: 10,
        }
    }
}

/// One text layer to draw on the banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub content: String,
    /// Pixel height of the font
    pub font_size: f32,
    pub fill: TextFill,
    /// Overrides the contrasting color used by the effect passes
    pub shadow: Option<RgbColor>,
    pub anchor: TextAnchor,
    pub backdrop: Option<TextBackdrop>,
    pub effect: TextEffect,
}

impl TextSpec {
    /// Top-centered text with advisor-chosen color and a drop shadow
    pub fn new<S: Into<String>>(content: S, font_size: f32) -> Self {
        Self {
            content: content.into(),
            font_size,
            fill: TextFill::Auto,
            shadow: None,
            anchor: TextAnchor::TopCenter { y: 50 },
            backdrop: None,
            effect: TextEffect::Shadow,
        }
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, color: RgbColor) -> Self {
        self.fill = TextFill::Fixed(color);
        self
    }

    #[must_use]
    pub fn with_shadow(mut self, color: RgbColor) -> Self {
        self.shadow = Some(color);
        self
    }

    #[must_use]
    pub fn with_backdrop(mut self, backdrop: TextBackdrop) -> Self {
        self.backdrop = Some(backdrop);
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: TextEffect) -> Self {
        self.effect = effect;
        self
    }
}

/// Filled button with an outlined border and a centered label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToAction {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub fill: RgbColor,
    pub label_color: RgbColor,
    pub outline: RgbColor,
    pub font_size: f32,
    pub anchor: TextAnchor,
}

impl CallToAction {
    pub fn new<S: Into<String>>(label: S, font_size: f32, anchor: TextAnchor) -> Self {
        Self {
            label: label.into(),
            width: 200,
            height: 60,
            fill: RgbColor::new(0xff, 0x6b, 0x6b),
            label_color: RgbColor::WHITE,
            outline: RgbColor::WHITE,
            font_size,
            anchor,
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Truncate to at most `max_chars` characters on a char boundary
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_resolution() {
        let canvas = CanvasSize::new(800, 600);
        assert_eq!(TextAnchor::TopCenter { y: 50 }.resolve(canvas, (200, 40)), (300, 50));
        assert_eq!(TextAnchor::Center.resolve(canvas, (200, 40)), (300, 280));
        assert_eq!(
            TextAnchor::BottomCenter { margin: 20 }.resolve(canvas, (200, 40)),
            (300, 540)
        );
        assert_eq!(
            TextAnchor::RightAligned { y: 10, margin: 50 }.resolve(canvas, (200, 40)),
            (550, 10)
        );
        // wider than the canvas: starts left of the origin
        assert_eq!(TextAnchor::TopCenter { y: 0 }.resolve(canvas, (1001, 40)), (-101, 0));
    }

    #[test]
    fn test_effect_offsets() {
        assert!(TextEffect::None.offsets(60.0).is_empty());
        assert_eq!(TextEffect::Shadow.offsets(12.0), vec![(1, 1), (2, 2), (-1, -1)]);

        let outline = TextEffect::Outline.offsets(60.0);
        assert_eq!(outline.len(), 8);
        assert!(outline.contains(&(-2, -2)));
        assert!(!outline.contains(&(0, 0)));
        assert!(TextEffect::Outline.offsets(20.0).contains(&(1, 0)));
    }

    #[test]
    fn test_effect_parsing() {
        assert_eq!("Outline".parse::<TextEffect>().unwrap(), TextEffect::Outline);
        assert!("glow".parse::<TextEffect>().is_err());
    }

    #[test]
    fn test_text_spec_builders() {
        let spec = TextSpec::new("HOT SALE", 50.0)
            .with_fill(RgbColor::WHITE)
            .with_effect(TextEffect::Outline)
            .with_backdrop(TextBackdrop::default());
        assert_eq!(spec.fill, TextFill::Fixed(RgbColor::WHITE));
        assert_eq!(spec.backdrop.unwrap().alpha, 180);
        assert_eq!(spec.effect, TextEffect::Outline);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("Giảm giá", 3), "Giả");
        assert_eq!(truncate_chars("", 3), "");
    }
}
