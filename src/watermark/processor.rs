//! Per-file watermarking.
//!
//! [`Watermarker`] turns one input picture into its `-w` JPEG sibling:
//! decode, overlay text and/or picture, encode, persist. A picture whose
//! output already exists is not processed again, so an interrupted batch can
//! simply be restarted.
//!
//! # Example
//!
//! ```ignore
//! use watermark_me::watermark::{Watermarker, WatermarkStyle};
//!
//! let watermarker = Watermarker::new(WatermarkStyle::default());
//! let output = watermarker.add_watermark(path, "© me", None)?;
//! ```

use super::compositor::{apply_picture, apply_text};
use super::path::{derive_output, Stage};
use super::text_renderer::{embedded_font, load_font, Color};
use super::WatermarkError;
use crate::constants::{DEFAULT_FONT_CANDIDATES, DEFAULT_OPACITY, OUTPUT_JPEG_QUALITY};
use ab_glyph::FontVec;
use image::{RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Appearance shared by every picture of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyle {
    /// 0.0 = invisible, 1.0 = fully opaque
    pub opacity: f32,
    /// Outline font used for text watermarks
    pub font: PathBuf,
    /// Text colour
    pub color: Color,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            font: default_font(),
            color: Color::default(),
        }
    }
}

impl WatermarkStyle {
    /// Check the style parameters.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(WatermarkError::ConfigError(format!(
                "opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }
        Ok(())
    }
}

/// First font of the platform candidates that exists. An empty path when
/// none does, which selects the embedded font.
pub fn default_font() -> PathBuf {
    DEFAULT_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .unwrap_or_default()
}

/// Applies watermarks to single pictures.
pub struct Watermarker {
    style: WatermarkStyle,
    font: OnceLock<FontVec>,
}

impl std::fmt::Debug for Watermarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watermarker")
            .field("style", &self.style)
            .field("font_loaded", &self.font.get().is_some())
            .finish()
    }
}

impl Watermarker {
    /// Create a watermarker. The font is only read on first text use.
    pub fn new(style: WatermarkStyle) -> Self {
        Self {
            style,
            font: OnceLock::new(),
        }
    }

    pub fn style(&self) -> &WatermarkStyle {
        &self.style
    }

    /// Watermark the picture at `path`.
    ///
    /// Returns the `-w` output path, or `None` when `path` cannot be read or
    /// decoded as a picture. When the output already exists it is returned
    /// untouched. An empty `text` and a `None` picture produce a plain JPEG
    /// copy.
    ///
    /// # Errors
    ///
    /// Fails when the font or the watermark picture cannot be loaded, or when
    /// the output cannot be encoded and written.
    pub fn add_watermark(
        &self,
        path: &Path,
        text: &str,
        picture: Option<&Path>,
    ) -> Result<Option<PathBuf>, WatermarkError> {
        let output = derive_output(path, Stage::Watermarked);
        if output.exists() {
            tracing::info!(output = %output.display(), "Watermarked output already exists, skipping");
            return Ok(Some(output));
        }

        let Some(mut image) = decode_rgb(path) else {
            return Ok(None);
        };

        if !text.is_empty() {
            let font = self.font()?;
            image = apply_text(image, text, font, self.style.color, self.style.opacity);
        }

        if let Some(picture) = picture {
            let overlay = decode_overlay(picture)?;
            image = apply_picture(image, &overlay, self.style.opacity);
        }

        let data = encode_jpeg(&image)?;
        write_atomic(&output, &data)?;

        tracing::debug!(
            input = %path.display(),
            output = %output.display(),
            bytes = data.len(),
            "Watermark applied"
        );

        Ok(Some(output))
    }

    fn font(&self) -> Result<&FontVec, WatermarkError> {
        if let Some(font) = self.font.get() {
            return Ok(font);
        }
        let path = &self.style.font;
        let font = if path.is_file() {
            load_font(path)?
        } else {
            if !path.as_os_str().is_empty() {
                tracing::warn!(font = %path.display(), "Font not found, using embedded font");
            }
            embedded_font()?
        };
        Ok(self.font.get_or_init(|| font))
    }
}

/// Decode `path` into 8-bit RGB. Unreadable or undecodable inputs yield
/// `None`.
fn decode_rgb(path: &Path) -> Option<RgbImage> {
    let decoded = image::io::Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| e.to_string())
        .and_then(|reader| reader.decode().map_err(|e| e.to_string()));

    match decoded {
        Ok(image) => Some(image.to_rgb8()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping file that is not a picture");
            None
        }
    }
}

fn decode_overlay(path: &Path) -> Result<RgbaImage, WatermarkError> {
    let image = image::io::Reader::open(path)
        .map_err(|e| WatermarkError::DecodeError(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| WatermarkError::DecodeError(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| WatermarkError::DecodeError(format!("{}: {}", path.display(), e)))?;

    Ok(image.to_rgba8())
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, WatermarkError> {
    use image::codecs::jpeg::JpegEncoder;
    use image::ImageEncoder as _;

    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, OUTPUT_JPEG_QUALITY);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgb8,
        )
        .map_err(|e| WatermarkError::EncodeError(e.to_string()))?;

    Ok(output)
}

/// Write `data` to a temporary sibling then rename it over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), WatermarkError> {
    let temp_path = path.with_extension("part");
    std::fs::write(&temp_path, data).map_err(|e| WatermarkError::io(&temp_path, e))?;

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(WatermarkError::io(path, e));
    }

    Ok(())
}
