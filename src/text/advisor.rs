//! Readability-aware text color selection

use crate::types::{Rect, RgbColor};
use image::{GenericImageView, Pixel};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mean luminance above which text is drawn dark
pub const LUMINANCE_THRESHOLD: f64 = 128.0;

/// How brightness is computed from an RGB pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LuminanceModel {
    /// Unweighted mean of R, G and B
    #[default]
    Average,
    /// ITU-R BT.601 luma: 0.299 R + 0.587 G + 0.114 B
    Rec601,
}

impl LuminanceModel {
    #[must_use]
    pub fn luminance(&self, rgb: [u8; 3]) -> f64 {
        let [r, g, b] = rgb.map(f64::from);
        match self {
            Self::Average => (r + g + b) / 3.0,
            Self::Rec601 => 0.299 * r + 0.587 * g + 0.114 * b,
        }
    }
}

impl std::str::FromStr for LuminanceModel {
    type Err = crate::error::BannerError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "average" | "mean" => Ok(Self::Average),
            "rec601" | "bt601" => Ok(Self::Rec601),
            other => Err(crate::error::BannerError::invalid_config(format!(
                "unknown luminance model '{other}', expected average or rec601"
            ))),
        }
    }
}

/// Text color plus the contrasting color for its shadow or outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPalette {
    pub text: RgbColor,
    pub shadow: RgbColor,
}

impl TextPalette {
    pub const DARK_ON_LIGHT: Self = Self {
        text: RgbColor::BLACK,
        shadow: RgbColor::WHITE,
    };
    pub const LIGHT_ON_DARK: Self = Self {
        text: RgbColor::WHITE,
        shadow: RgbColor::BLACK,
    };
}

impl Default for TextPalette {
    fn default() -> Self {
        Self::LIGHT_ON_DARK
    }
}

/// Picks readable text colors from the luminance of what lies underneath
#[derive(Debug, Clone, Copy, Default)]
pub struct TextColorAdvisor {
    model: LuminanceModel,
}

impl TextColorAdvisor {
    #[must_use]
    pub fn new(model: LuminanceModel) -> Self {
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> LuminanceModel {
        self.model
    }

    /// Palette for an already measured luminance
    #[must_use]
    pub fn palette_for_luminance(luminance: f64) -> TextPalette {
        if luminance > LUMINANCE_THRESHOLD {
            TextPalette::DARK_ON_LIGHT
        } else {
            TextPalette::LIGHT_ON_DARK
        }
    }

    /// Contrasting color for a fixed text color
    #[must_use]
    pub fn contrasting(&self, color: RgbColor) -> RgbColor {
        Self::palette_for_luminance(self.model.luminance(color.0)).text
    }

    /// Mean luminance of the region clipped to the image, ignoring alpha
    ///
    /// Returns `None` when nothing of the region lies on the image.
    pub fn mean_luminance<I>(&self, image: &I, region: Rect) -> Option<f64>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let (width, height) = image.dimensions();
        let clipped = region.clip_to(crate::types::CanvasSize::new(width, height))?;

        let mut sum = 0.0;
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                let rgb = image.get_pixel(x as u32, y as u32).to_rgb();
                sum += self.model.luminance(rgb.0);
            }
        }
        Some(sum / (u64::from(clipped.width) * u64::from(clipped.height)) as f64)
    }

    /// Palette for the whole image
    pub fn pick_color<I>(&self, image: &I) -> TextPalette
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let (width, height) = image.dimensions();
        self.pick_for_region(image, Rect::new(0, 0, width, height))
    }

    /// Palette for the part of the image a text box will cover
    ///
    /// A zero-area region, or one entirely off the image, yields white text on
    /// a black shadow and a warning event.
    pub fn pick_for_region<I>(&self, image: &I, region: Rect) -> TextPalette
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        match self.mean_luminance(image, region) {
            Some(luminance) => Self::palette_for_luminance(luminance),
            None => {
                warn!(
                    region = ?region,
                    "Empty region for text color sampling, using default palette"
                );
                TextPalette::default()
            },
        }
    }
}
