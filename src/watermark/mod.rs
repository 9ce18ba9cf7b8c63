//! Watermark module for applying text and picture watermarks to files.
//!
//! Every input picture produces a JPEG sibling whose stem ends with `-w`.
//! Text is rendered centered and sized to the picture width; a picture
//! overlay is centered as is. Both use the configured opacity.
//!
//! # Features
//!
//! - **Text watermarks** from any TrueType/OpenType font, in any colour
//! - **Picture watermarks** blended through their own alpha channel
//! - **Idempotent** processing: existing outputs are reused
//! - **Lazy batches** over files and recursively walked directories
//!
//! # Example
//!
//! ```ignore
//! use watermark_me::watermark::{apply_watermarks, WatermarkRequest};
//!
//! let request = WatermarkRequest::from_config(&config, paths)?;
//! for result in apply_watermarks(&request) {
//!     let result = result?;
//!     println!("{} -> {:?}", result.original.display(), result.output);
//! }
//! ```

pub mod batch;
pub mod compositor;
pub mod error;
pub mod path;
pub mod processor;
pub mod text_renderer;

// Re-export main types for convenience
pub use batch::{apply_watermarks, FileWalker, ProcessingResult, WatermarkBatch, WatermarkRequest};
pub use compositor::{apply_picture, apply_text, Compositor, PlacementPosition, WatermarkLayer};
pub use error::WatermarkError;
pub use path::{derive_output, Stage};
pub use processor::{default_font, Watermarker, WatermarkStyle};
pub use text_renderer::{embedded_font, load_font, parse_hex_color, Color};
