//! Built-in 5x7 bitmap font
//!
//! Used when no TrueType font can be found. Lowercase letters are drawn as
//! uppercase and characters outside printable ASCII are drawn as a hollow box,
//! so every character of the input produces a visible cell.

use super::font::{TextRasterizer, MAX_FONT_PX};
use image::{GrayImage, Luma};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Blank column between cells
const GLYPH_SPACING: u32 = 1;

const UNKNOWN: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

/// Fixed-cell fallback font scaled by an integer factor
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFont;

impl BitmapFont {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Integer scale for a requested pixel size, at least 1 and capped at `MAX_FONT_PX`
    #[must_use]
    pub fn scale_for(px: f32) -> u32 {
        if !px.is_finite() || px <= 8.0 {
            return 1;
        }
        (px.min(MAX_FONT_PX) / 8.0).round() as u32
    }

    /// Row bitmaps of a character, bit 4 is the leftmost column
    fn glyph(c: char) -> [u8; 7] {
        match c.to_ascii_uppercase() {
            ' ' => [0x00; 7],
            'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
            'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
            'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
            'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
            'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
            'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
            'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
            'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
            'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
            'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
            'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
            'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
            'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
            'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
            'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
            'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
            'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
            'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
            'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
            'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
            'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
            'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
            '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
            '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
            '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
            '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
            '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
            '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
            '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
            '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
            '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
            '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
            '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
            '"' => [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00],
            '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
            '$' => [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04],
            '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03],
            '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
            '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
            '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
            ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
            '*' => [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00],
            '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
            ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
            '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
            '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
            '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
            ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
            ';' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08],
            '<' => [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02],
            '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
            '>' => [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08],
            '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
            '@' => [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E],
            '[' => [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E],
            '\\' => [0x00, 0x10, 0x08, 0x04, 0x02, 0x01, 0x00],
            ']' => [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E],
            '^' => [0x04, 0x0A, 0x11, 0x00, 0x00, 0x00, 0x00],
            '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
            '`' => [0x08, 0x04, 0x02, 0x00, 0x00, 0x00, 0x00],
            '{' => [0x02, 0x04, 0x04, 0x08, 0x04, 0x04, 0x02],
            '|' => [0x04; 7],
            '}' => [0x08, 0x04, 0x04, 0x02, 0x04, 0x04, 0x08],
            '~' => [0x00, 0x00, 0x08, 0x15, 0x02, 0x00, 0x00],
            other if other.is_whitespace() => [0x00; 7],
            _ => UNKNOWN,
        }
    }
}

impl TextRasterizer for BitmapFont {
    fn name(&self) -> &str {
        "builtin-5x7"
    }

    fn measure(&self, text: &str, px: f32) -> (u32, u32) {
        let count = text.chars().count() as u32;
        if count == 0 {
            return (0, 0);
        }
        let scale = Self::scale_for(px);
        let width = count
            .saturating_mul(GLYPH_WIDTH + GLYPH_SPACING)
            .saturating_sub(GLYPH_SPACING);
        (width.saturating_mul(scale), GLYPH_HEIGHT * scale)
    }

    fn render(&self, text: &str, px: f32) -> GrayImage {
        let (width, height) = self.measure(text, px);
        let mut coverage = GrayImage::new(width, height);
        let scale = Self::scale_for(px);

        for (index, c) in text.chars().enumerate() {
            let cell_x = index as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * scale;
            for (row, bits) in Self::glyph(c).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let x0 = cell_x + col * scale;
                    let y0 = row as u32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            coverage.put_pixel(x0 + dx, y0 + dy, Luma([255]));
                        }
                    }
                }
            }
        }
        coverage
    }
}
