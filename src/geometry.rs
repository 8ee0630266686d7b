//! Product placement and inpainting mask planning
//!
//! Given a canvas and a foreground size, [`GeometryPlanner`] computes the
//! scaled size and offset of the product and derives the [`PaintMask`] that
//! tells a background generator which pixels it may repaint.

use crate::{
    config::DEFAULT_SAFETY_MARGIN,
    error::{BannerError, Result},
    types::{CanvasSize, PaintMask, Placement},
    utils::NumericValidator,
};
use image::{imageops::FilterType, RgbaImage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Horizontal margin used by edge anchors when none is given
pub const DEFAULT_EDGE_MARGIN: u32 = 50;

/// Where the scaled product is positioned on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProductAnchor {
    /// Centered on both axes
    Center,
    /// Against the right edge with `margin` pixels to spare, vertically centered
    Right { margin: u32 },
    /// Against the left edge with `margin` pixels to spare, vertically centered
    Left { margin: u32 },
    /// Horizontally centered with a fixed top offset
    Bottom { offset_y: u32 },
}

impl Default for ProductAnchor {
    fn default() -> Self {
        Self::Center
    }
}

impl std::fmt::Display for ProductAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Center => write!(f, "center"),
            Self::Right { margin } => write!(f, "right:{margin}"),
            Self::Left { margin } => write!(f, "left:{margin}"),
            Self::Bottom { offset_y } => write!(f, "bottom:{offset_y}"),
        }
    }
}

impl FromStr for ProductAnchor {
    type Err = BannerError;

    /// Parse `center`, `right[:MARGIN]`, `left[:MARGIN]` or `bottom:OFFSET_Y`
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let (kind, value) = match lowered.split_once(':') {
            Some((kind, value)) => (kind, Some(value)),
            None => (lowered.as_str(), None),
        };
        let number = |value: Option<&str>, default: Option<u32>| -> Result<u32> {
            match value {
                Some(v) => v.trim().parse::<u32>().map_err(|e| {
                    BannerError::invalid_config(format!("anchor '{s}': {e}"))
                }),
                None => default.ok_or_else(|| {
                    BannerError::invalid_config(format!("anchor '{s}' needs a value, e.g. bottom:300"))
                }),
            }
        };

        match kind {
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right {
                margin: number(value, Some(DEFAULT_EDGE_MARGIN))?,
            }),
            "left" => Ok(Self::Left {
                margin: number(value, Some(DEFAULT_EDGE_MARGIN))?,
            }),
            "bottom" => Ok(Self::Bottom {
                offset_y: number(value, None)?,
            }),
            other => Err(BannerError::invalid_config(format!(
                "unknown anchor '{other}', expected center, right, left or bottom"
            ))),
        }
    }
}

/// Stateless placement and mask calculations
pub struct GeometryPlanner;

impl GeometryPlanner {
    /// Plan a centered placement with the default safety margin
    ///
    /// # Examples
    ///
    /// ```rust
    /// use banner_compositor::{CanvasSize, GeometryPlanner};
    ///
    /// let placement = GeometryPlanner::plan(CanvasSize::CLASSIC, (400, 400), 0.35).unwrap();
    /// assert_eq!(placement.size(), (280, 280));
    /// assert_eq!(placement.offset(), (260, 160));
    /// ```
    pub fn plan(
        canvas: CanvasSize,
        foreground: (u32, u32),
        width_budget_fraction: f32,
    ) -> Result<Placement> {
        Self::plan_with(
            canvas,
            foreground,
            width_budget_fraction,
            ProductAnchor::Center,
            DEFAULT_SAFETY_MARGIN,
        )
    }

    /// Plan a placement with an explicit anchor and safety margin
    ///
    /// The product is shrunk to `floor(canvas.width * fraction)` when wider than
    /// that, never enlarged. When the result is still taller than the canvas,
    /// its height is capped to `canvas.height - 2 * safety_margin` and the width
    /// re-derived from the capped height.
    pub fn plan_with(
        canvas: CanvasSize,
        foreground: (u32, u32),
        width_budget_fraction: f32,
        anchor: ProductAnchor,
        safety_margin: u32,
    ) -> Result<Placement> {
        let (fg_width, fg_height) = foreground;
        NumericValidator::validate_dimensions(canvas.width, canvas.height, "canvas")?;
        NumericValidator::validate_dimensions(fg_width, fg_height, "foreground")?;
        let fraction = NumericValidator::validate_fraction(width_budget_fraction)?;

        // Absorbs f32 representation error so 800 * 0.35 floors to 280, not 279
        let target_width = NumericValidator::validate_f32_to_u32(
            (canvas.width as f32 * fraction + 1e-3).floor(),
        )?
        .max(1);

        let (mut width, mut height) = if fg_width <= target_width {
            (fg_width, fg_height)
        } else {
            (
                target_width,
                NumericValidator::scale_rounded(fg_height, target_width, fg_width)?,
            )
        };

        if height > canvas.height {
            let margin = if canvas.height > safety_margin.saturating_mul(2) {
                safety_margin
            } else {
                0
            };
            let capped = canvas.height - 2 * margin;
            let rederived = NumericValidator::scale_rounded(fg_width, capped, fg_height)?;
            debug!(
                from_height = height,
                to_height = capped,
                margin,
                "Capping product height to canvas"
            );
            width = rederived.min(width);
            height = capped;
        }

        let (x, y) = Self::anchor_offset(canvas, (width, height), anchor);
        let placement = Placement {
            width,
            height,
            x,
            y,
        };

        debug!(
            canvas = %canvas,
            foreground = ?foreground,
            placement = %placement,
            anchor = %anchor,
            "Planned product placement"
        );
        Ok(placement)
    }

    /// Top-left offset for a product of `size`, clamped so it stays on the canvas
    fn anchor_offset(canvas: CanvasSize, size: (u32, u32), anchor: ProductAnchor) -> (u32, u32) {
        let (width, height) = size;
        let max_x = canvas.width.saturating_sub(width);
        let max_y = canvas.height.saturating_sub(height);
        let center_x = max_x / 2;
        let center_y = max_y / 2;

        match anchor {
            ProductAnchor::Center => (center_x, center_y),
            ProductAnchor::Right { margin } => (max_x.saturating_sub(margin), center_y),
            ProductAnchor::Left { margin } => (margin.min(max_x), center_y),
            ProductAnchor::Bottom { offset_y } => (center_x, offset_y.min(max_y)),
        }
    }

    /// Build the inpainting mask: 255 everywhere except the padded placement
    ///
    /// The preserved rectangle is
    /// `[x - padding, y - padding, x + width + padding, y + height + padding]`
    /// clipped to the canvas.
    pub fn derive_mask(canvas: CanvasSize, placement: &Placement, padding: u32) -> Result<PaintMask> {
        canvas.validate()?;
        if !placement.rect().fits_within(canvas) {
            return Err(BannerError::invalid_geometry(format!(
                "placement {} does not fit canvas {}",
                placement, canvas
            )));
        }

        let mut mask = PaintMask::paint_all(canvas);
        mask.preserve(placement.rect().expand(padding));

        debug!(
            padding,
            preserved = ?mask.preserved_rect(),
            paint_ratio = mask.paint_ratio(),
            "Derived inpainting mask"
        );
        Ok(mask)
    }

    /// Resample the foreground to the placement size with Lanczos3
    #[must_use]
    pub fn resize_foreground(foreground: &RgbaImage, placement: &Placement) -> RgbaImage {
        if foreground.dimensions() == placement.size() {
            return foreground.clone();
        }
        image::imageops::resize(
            foreground,
            placement.width,
            placement.height,
            FilterType::Lanczos3,
        )
    }
}
