//! Text watermark rendering.
//!
//! This module rasterises text watermarks into transparent RGBA overlays
//! that the compositor blends onto pictures.
//!
//! # Features
//!
//! - Outline fonts (TrueType/OpenType) loaded from a file, with DejaVu Sans
//!   compiled in as fallback
//! - Hex color parsing (#RGB and #RRGGBB formats)
//! - Font size fitting: the text grows with the picture width
//! - Centered placement on an overlay the size of the picture
//!
//! # Example
//!
//! ```ignore
//! use watermark_me::watermark::text_renderer::{load_font, render_overlay, Color};
//!
//! let font = load_font(Path::new("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"))?;
//! let overlay = render_overlay(&font, "Copyright 2020", Color::white(), 800, 600);
//! ```

use super::compositor::blend_pixels;
use super::WatermarkError;
use crate::constants::{FONT_SIZE_START, FONT_SIZE_STEP};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Parsed RGB color from hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

/// DejaVu Sans, used when no font file is available
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

/// Font compiled into the binary.
pub fn embedded_font() -> Result<FontVec, WatermarkError> {
    FontVec::try_from_vec(EMBEDDED_FONT_DATA.to_vec())
        .map_err(|e| WatermarkError::FontError(format!("embedded font: {}", e)))
}

/// Load an outline font from a file.
pub fn load_font(path: &Path) -> Result<FontVec, WatermarkError> {
    let data = std::fs::read(path)
        .map_err(|e| WatermarkError::FontError(format!("{}: {}", path.display(), e)))?;

    FontVec::try_from_vec(data)
        .map_err(|e| WatermarkError::FontError(format!("{}: {}", path.display(), e)))
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```
/// use watermark_me::watermark::text_renderer::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FFF").unwrap(), Color::new(255, 255, 255));
/// assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::ConfigError("Color must start with '#'".to_string()))?;

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::ConfigError(format!("Invalid hex digits '{}'", s)))
    };

    match hex.len() {
        // Each digit is doubled: 0xF -> 0xFF, 0xA -> 0xAA
        3 => Ok(Color::new(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(WatermarkError::ConfigError(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// Calculate the dimensions of rendered text.
///
/// Returns (width, height) in pixels.
pub fn measure_text<F: Font>(font: &F, text: &str, font_size: f32) -> (u32, u32) {
    let scaled_font = font.as_scaled(PxScale::from(font_size));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }

        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let height = scaled_font.height();

    // Add small padding
    let padding = 2;
    (
        width.max(0.0).ceil() as u32 + padding,
        height.max(0.0).ceil() as u32 + padding,
    )
}

/// Find the font size that makes `text` span the picture.
///
/// Starts from a minimal size and grows by fixed steps, keeping the largest
/// size whose `width + height` stays below `max_width`. The minimal size is
/// returned when even that does not fit.
pub fn fit_font_size<F: Font>(font: &F, text: &str, max_width: u32) -> f32 {
    let mut size = FONT_SIZE_START;

    loop {
        let next = size + FONT_SIZE_STEP;
        let (width, height) = measure_text(font, text, next);
        if width + height >= max_width {
            return size;
        }
        size = next;
    }
}

/// Draw `text` onto `canvas` with its top-left corner at (`x`, `y`).
///
/// Pixels falling outside the canvas are dropped. Glyph coverage becomes
/// the pixel alpha.
pub fn draw_text<F: Font>(
    canvas: &mut RgbaImage,
    font: &F,
    text: &str,
    font_size: f32,
    color: Color,
    x: i32,
    y: i32,
) {
    let scale = PxScale::from(font_size);
    let scaled_font = font.as_scaled(scale);
    let canvas_width = canvas.width() as i32;
    let canvas_height = canvas.height() as i32;

    let baseline_y = y as f32 + scaled_font.ascent();
    let mut cursor_x = x as f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;

                if x >= 0 && y >= 0 && x < canvas_width && y < canvas_height {
                    let pixel = Rgba([
                        color.r,
                        color.g,
                        color.b,
                        (coverage.clamp(0.0, 1.0) * 255.0) as u8,
                    ]);

                    // Overlapping glyph edges accumulate (anti-aliasing)
                    let existing = canvas.get_pixel(x as u32, y as u32);
                    let blended = blend_pixels(*existing, pixel);
                    canvas.put_pixel(x as u32, y as u32, blended);
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
}

/// Render `text` centered on a transparent overlay of `width` x `height`.
///
/// The font size is chosen with [`fit_font_size`] so the watermark scales
/// with the picture. The overlay alpha is the raw glyph coverage; opacity is
/// applied by the compositor.
pub fn render_overlay<F: Font>(
    font: &F,
    text: &str,
    color: Color,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut overlay = RgbaImage::new(width, height);

    let font_size = fit_font_size(font, text, width);
    let (text_width, text_height) = measure_text(font, text, font_size);

    let x = (width as i32 - text_width as i32) / 2;
    let y = (height as i32 - text_height as i32) / 2;

    draw_text(&mut overlay, font, text, font_size, color, x, y);
    overlay
}
