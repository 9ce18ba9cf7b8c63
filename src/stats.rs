// Batch statistics

use std::fmt;
use std::path::Path;

const BINARY_PREFIXES: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Human readable size with binary prefixes, e.g. `157.4 GiB`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for prefix in BINARY_PREFIXES {
        if value < 1024.0 {
            return format!("{:.1} {}B", value, prefix);
        }
        value /= 1024.0;
    }
    format!("{:.1} YiB", value)
}

/// Totals over the files a batch produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Files with an output
    pub count: u64,
    /// Summed size of their originals
    pub size_before: u64,
    /// Summed size of their final outputs
    pub size_after: u64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `original` processed into `output`. Files that cannot
    /// be inspected count as empty.
    pub fn record(&mut self, original: &Path, output: &Path) {
        let size = |path: &Path| std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        self.record_sizes(size(original), size(output));
    }

    pub fn record_sizes(&mut self, before: u64, after: u64) {
        self.count += 1;
        self.size_before += before;
        self.size_after += after;
    }

    /// Output size relative to input size, in percent.
    pub fn ratio(&self) -> Option<f64> {
        if self.size_before == 0 {
            return None;
        }
        Some(self.size_after as f64 * 100.0 / self.size_before as f64)
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s), {} -> {}",
            self.count,
            format_size(self.size_before),
            format_size(self.size_after)
        )?;
        if let Some(ratio) = self.ratio() {
            write!(f, " ({:.1}%)", ratio)?;
        }
        Ok(())
    }
}
