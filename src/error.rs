// Error types module

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::optimizer::OptimizeError;
use crate::watermark::WatermarkError;

/// Errors that end a `watermark` run.
///
/// Per-file conditions (unreadable picture, spent quota) never get here:
/// they are reported as files without output.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    /// The intermediate `-w` file could not be removed after optimization
    #[error("Failed to remove {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}
