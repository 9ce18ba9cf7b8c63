//! Watermark error types.
//!
//! Defines errors that can occur while watermarking a picture. Conditions the
//! batch is expected to survive (an input that is not a picture, a missing
//! input) are not errors: they surface as "no output" in the result.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during watermark processing.
#[derive(Debug)]
pub enum WatermarkError {
    /// Failed to decode the watermark picture
    DecodeError(String),

    /// Failed to load the outline font
    FontError(String),

    /// Invalid style parameters
    ConfigError(String),

    /// Failed to encode the watermarked picture
    EncodeError(String),

    /// Filesystem failure while persisting an output
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl WatermarkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecodeError(msg) => write!(f, "Failed to decode watermark picture: {}", msg),
            Self::FontError(msg) => write!(f, "Failed to load font: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
            Self::EncodeError(msg) => write!(f, "Failed to encode watermarked picture: {}", msg),
            Self::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for WatermarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
