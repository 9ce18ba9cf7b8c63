//! Output path derivation.
//!
//! Every processed picture gets a sibling file whose stem carries the stage
//! it went through: `-w` once watermarked, `-wo` once optimized. Optimization
//! always follows watermarking, so `-o` and `-ow` never exist. Outputs are
//! always JPEG.

use crate::constants::{OPTIMIZED_SUFFIX, OUTPUT_EXTENSION, WATERMARKED_SUFFIX};
use std::path::{Path, PathBuf};

/// Processing stage a derived output belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Watermarked,
    Optimized,
}

/// Compute the output path of `path` for the given `stage`.
///
/// Pure function: no filesystem access. Deriving from a path that already
/// carries the stage suffix returns the same stem.
///
/// ```
/// use std::path::Path;
/// use watermark_me::watermark::{derive_output, Stage};
///
/// let watermarked = derive_output(Path::new("file.png"), Stage::Watermarked);
/// assert_eq!(watermarked, Path::new("file-w.jpg"));
/// assert_eq!(derive_output(&watermarked, Stage::Optimized), Path::new("file-wo.jpg"));
/// ```
pub fn derive_output(path: &Path, stage: Stage) -> PathBuf {
    let mut stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stage {
        Stage::Watermarked => {
            if !stem.ends_with(WATERMARKED_SUFFIX) {
                stem.push_str(WATERMARKED_SUFFIX);
            }
        }
        Stage::Optimized => {
            // "-w" becomes "-wo" by appending the final letter only
            if !stem.ends_with(OPTIMIZED_SUFFIX) {
                stem.push('o');
            }
        }
    }

    path.with_file_name(format!("{}.{}", stem, OUTPUT_EXTENSION))
}
