//! Deterministic vertical gradient backgrounds

use super::{BackgroundProvider, BackgroundRequest};
use crate::{
    error::{BannerError, Result},
    types::{CanvasSize, RgbColor},
};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Named gradient color pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientPreset {
    /// Indigo to purple
    #[default]
    Modern,
    /// Orange to deep orange
    Sunset,
    /// Teal to mint
    Ocean,
    /// Charcoal to green
    DarkPremium,
    /// Steel blue to lime
    Sky,
}

impl GradientPreset {
    pub const ALL: [Self; 5] = [
        Self::Modern,
        Self::Sunset,
        Self::Ocean,
        Self::DarkPremium,
        Self::Sky,
    ];

    /// Top and bottom colors
    #[must_use]
    pub fn colors(&self) -> (RgbColor, RgbColor) {
        match self {
            Self::Modern => (RgbColor::new(102, 126, 234), RgbColor::new(118, 75, 162)),
            Self::Sunset => (RgbColor::new(255, 154, 77), RgbColor::new(255, 87, 34)),
            Self::Ocean => (RgbColor::new(26, 188, 156), RgbColor::new(52, 211, 153)),
            Self::DarkPremium => (RgbColor::new(33, 33, 33), RgbColor::new(76, 175, 80)),
            Self::Sky => (RgbColor::new(100, 150, 200), RgbColor::new(150, 230, 100)),
        }
    }
}

impl std::fmt::Display for GradientPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Modern => "modern",
            Self::Sunset => "sunset",
            Self::Ocean => "ocean",
            Self::DarkPremium => "dark-premium",
            Self::Sky => "sky",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for GradientPreset {
    type Err = BannerError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|preset| preset.to_string() == normalized)
            .ok_or_else(|| {
                BannerError::invalid_config(format!(
                    "unknown gradient '{s}', expected one of modern, sunset, ocean, dark-premium, sky"
                ))
            })
    }
}

/// Linear top-to-bottom interpolation between two colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientBackground {
    pub top: RgbColor,
    pub bottom: RgbColor,
}

impl GradientBackground {
    #[must_use]
    pub fn new(top: RgbColor, bottom: RgbColor) -> Self {
        Self { top, bottom }
    }

    #[must_use]
    pub fn from_preset(preset: GradientPreset) -> Self {
        let (top, bottom) = preset.colors();
        Self::new(top, bottom)
    }

    /// Color of row `y` out of `height`; the first row is `top`, the last is `bottom`
    ///
    /// Interpolates over `y / (height - 1)` rather than `y / height` so both
    /// endpoint colors land exactly on the outer rows.
    #[must_use]
    pub fn row_color(&self, y: u32, height: u32) -> Rgb<u8> {
        if height <= 1 {
            return self.top.into();
        }
        let t = f64::from(y.min(height - 1)) / f64::from(height - 1);
        let mut channels = [0u8; 3];
        for (out, (top, bottom)) in channels
            .iter_mut()
            .zip(self.top.0.iter().zip(self.bottom.0.iter()))
        {
            let top = f64::from(*top);
            let value = top + (f64::from(*bottom) - top) * t;
            *out = value.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(channels)
    }

    /// Render the gradient; pure and deterministic
    #[must_use]
    pub fn render(&self, canvas: CanvasSize) -> RgbImage {
        let mut image = RgbImage::new(canvas.width, canvas.height);
        for y in 0..canvas.height {
            let color = self.row_color(y, canvas.height);
            for x in 0..canvas.width {
                image.put_pixel(x, y, color);
            }
        }
        image
    }
}

impl Default for GradientBackground {
    fn default() -> Self {
        Self::from_preset(GradientPreset::default())
    }
}

impl BackgroundProvider for GradientBackground {
    fn name(&self) -> &str {
        "gradient"
    }

    fn generate(&self, request: &BackgroundRequest) -> Result<RgbImage> {
        request.canvas.validate()?;
        Ok(self.render(request.canvas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        let gradient = GradientBackground::new(RgbColor::new(100, 150, 200), RgbColor::new(150, 230, 100));
        let image = gradient.render(CanvasSize::new(800, 600));

        assert_eq!(image.dimensions(), (800, 600));
        assert_eq!(image.get_pixel(0, 0), &Rgb([100, 150, 200]));
        assert_eq!(image.get_pixel(799, 0), &Rgb([100, 150, 200]));
        assert_eq!(image.get_pixel(0, 599), &Rgb([150, 230, 100]));
        assert_eq!(image.get_pixel(400, 599), &Rgb([150, 230, 100]));
    }

    #[test]
    fn test_gradient_is_deterministic() {
        let gradient = GradientBackground::from_preset(GradientPreset::Modern);
        let canvas = CanvasSize::new(120, 63);
        assert_eq!(gradient.render(canvas), gradient.render(canvas));
    }

    #[test]
    fn test_rows_are_uniform_and_monotonic() {
        let gradient = GradientBackground::new(RgbColor::new(0, 255, 10), RgbColor::new(255, 0, 10));
        let image = gradient.render(CanvasSize::new(7, 50));
        let mut previous = 0u8;
        for y in 0..50 {
            let first = *image.get_pixel(0, y);
            for x in 1..7 {
                assert_eq!(image.get_pixel(x, y), &first);
            }
            assert!(first[0] >= previous);
            assert_eq!(first[2], 10);
            previous = first[0];
        }
    }

    #[test]
    fn test_single_row_is_top() {
        let gradient = GradientBackground::new(RgbColor::new(1, 2, 3), RgbColor::new(9, 9, 9));
        let image = gradient.render(CanvasSize::new(4, 1));
        assert_eq!(image.get_pixel(3, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_provider_ignores_prompt() {
        let gradient = GradientBackground::from_preset(GradientPreset::Sunset);
        let request = BackgroundRequest::new(CanvasSize::new(10, 10)).with_prompt("ignored");
        let image = gradient.generate(&request).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 154, 77]));

        let bad = BackgroundRequest::new(CanvasSize::new(0, 10));
        assert!(gradient.generate(&bad).is_err());
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("dark_premium".parse::<GradientPreset>().unwrap(), GradientPreset::DarkPremium);
        assert_eq!("Ocean".parse::<GradientPreset>().unwrap(), GradientPreset::Ocean);
        assert!("rainbow".parse::<GradientPreset>().is_err());
        assert_eq!(GradientPreset::DarkPremium.to_string(), "dark-premium");
    }
}
