//! Watermark compositor for blending overlays onto pictures.
//!
//! This module handles alpha blending of watermark overlays onto target
//! pictures. Overlays are centered and carry their opacity in their own
//! alpha channel, which serves as the blend mask.
//!
//! # Features
//!
//! - Uniform alpha scaling (opacity)
//! - Centered placement, overlays larger than the picture are clipped
//! - Multiple layers applied in sequence (text first, then picture)
//!
//! # Example
//!
//! ```ignore
//! use watermark_me::watermark::compositor::{apply_picture, apply_text};
//!
//! let picture = apply_text(picture, "Copyright", &font, Color::white(), 0.25);
//! let picture = apply_picture(picture, &logo, 0.25);
//! ```

use super::text_renderer::{render_overlay, Color};
use ab_glyph::Font;
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

/// Top-left corner of a layer on the target picture. May be negative when
/// the layer is larger than the picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    /// Position centering a `layer_width` x `layer_height` layer on a
    /// `width` x `height` picture. The size difference is halved with
    /// integer division on both axes.
    pub fn centered(width: u32, height: u32, layer_width: u32, layer_height: u32) -> Self {
        Self {
            x: (width as i32 - layer_width as i32) / 2,
            y: (height as i32 - layer_height as i32) / 2,
        }
    }
}

/// A watermark layer to be composited onto a picture.
#[derive(Clone)]
pub struct WatermarkLayer {
    /// The overlay (RGBA). Its alpha channel is the blend mask.
    pub image: RgbaImage,
    /// Position where the overlay is placed.
    pub position: PlacementPosition,
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("position", &self.position)
            .finish()
    }
}

/// Compositor for applying watermark layers to pictures.
#[derive(Debug, Default)]
pub struct Compositor {
    layers: Vec<WatermarkLayer>,
}

impl Compositor {
    /// Create a new compositor with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a watermark layer to the compositor.
    pub fn add_layer(&mut self, layer: WatermarkLayer) {
        self.layers.push(layer);
    }

    /// Apply all watermark layers to the target image.
    ///
    /// Layers are applied in the order they were added.
    pub fn apply(&self, target: &mut RgbaImage) {
        for layer in &self.layers {
            blend_layer(target, layer);
        }
    }

    /// Apply all layers to an RGB picture and return the RGB result.
    pub fn apply_to_rgb(&self, target: RgbImage) -> RgbImage {
        if self.layers.is_empty() {
            return target;
        }

        let mut rgba = DynamicImage::ImageRgb8(target).to_rgba8();
        self.apply(&mut rgba);
        DynamicImage::ImageRgba8(rgba).to_rgb8()
    }

    /// Get the number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layer was added.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Multiply the alpha channel of `image` by `opacity` (clamped to 0..=1).
pub fn scale_alpha(image: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * opacity).round().clamp(0.0, 255.0) as u8;
    }
}

/// Build the text layer for a `width` x `height` picture.
///
/// The overlay spans the whole picture with the text centered on it, and
/// its alpha is scaled by `opacity` (0 = invisible, 1 = fully opaque).
pub fn text_layer<F: Font>(
    font: &F,
    text: &str,
    color: Color,
    opacity: f32,
    width: u32,
    height: u32,
) -> WatermarkLayer {
    let mut overlay = render_overlay(font, text, color, width, height);
    scale_alpha(&mut overlay, opacity);

    WatermarkLayer {
        image: overlay,
        position: PlacementPosition::default(),
    }
}

/// Build the picture layer centered on a `width` x `height` picture.
///
/// An opacity of exactly 0 leaves the overlay alpha untouched instead of
/// making it invisible.
pub fn picture_layer(overlay: &RgbaImage, opacity: f32, width: u32, height: u32) -> WatermarkLayer {
    let mut image = overlay.clone();
    if opacity != 0.0 {
        scale_alpha(&mut image, opacity);
    }

    WatermarkLayer {
        position: PlacementPosition::centered(width, height, image.width(), image.height()),
        image,
    }
}

/// Overlay centered `text` on `image`.
pub fn apply_text<F: Font>(
    image: RgbImage,
    text: &str,
    font: &F,
    color: Color,
    opacity: f32,
) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut compositor = Compositor::new();
    compositor.add_layer(text_layer(font, text, color, opacity, width, height));
    compositor.apply_to_rgb(image)
}

/// Overlay the `overlay` picture centered on `image`.
pub fn apply_picture(image: RgbImage, overlay: &RgbaImage, opacity: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut compositor = Compositor::new();
    compositor.add_layer(picture_layer(overlay, opacity, width, height));
    compositor.apply_to_rgb(image)
}

/// Blend a single watermark layer onto the target image.
fn blend_layer(target: &mut RgbaImage, layer: &WatermarkLayer) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let wm_width = layer.image.width() as i32;
    let wm_height = layer.image.height() as i32;

    // Clamp to target bounds
    let x_start = layer.position.x.max(0);
    let y_start = layer.position.y.max(0);
    let x_end = (layer.position.x + wm_width).min(target_width);
    let y_end = (layer.position.y + wm_height).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wx = (tx - layer.position.x) as u32;
            let wy = (ty - layer.position.y) as u32;

            let wm_pixel = layer.image.get_pixel(wx, wy);
            let target_pixel = target.get_pixel(tx as u32, ty as u32);

            let blended = blend_pixels(*target_pixel, *wm_pixel);
            target.put_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Blend two pixels using the "over" operator, the foreground alpha being
/// the mask: result = foreground * alpha + background * (1 - alpha).
pub(crate) fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    // Porter-Duff "over" operator
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
