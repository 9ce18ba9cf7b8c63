//! Batch watermarking.
//!
//! Inputs are flattened first by [`FileWalker`] (files as given, directories
//! expanded recursively per extension) and each discovered file then goes
//! through the same [`Watermarker`]. Both steps are lazy: nothing is read or
//! written before the caller pulls the next result.

use super::processor::{Watermarker, WatermarkStyle};
use super::text_renderer::parse_hex_color;
use super::WatermarkError;
use crate::config::Config;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Parameters of one batch invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkRequest {
    /// Files and/or directories, processed in order
    pub paths: Vec<PathBuf>,
    /// Text watermark, empty for none
    pub text: String,
    /// Picture watermark
    pub picture: Option<PathBuf>,
    pub style: WatermarkStyle,
    /// Extensions (without dot) picked up inside directories
    pub extensions: Vec<String>,
}

impl WatermarkRequest {
    /// Build a request for `paths` from the loaded configuration.
    pub fn from_config(config: &Config, paths: Vec<PathBuf>) -> Result<Self, WatermarkError> {
        let style = WatermarkStyle {
            opacity: config.opacity,
            font: config.font.clone(),
            color: parse_hex_color(&config.color)?,
        };
        style.validate()?;

        let picture = if config.picture.as_os_str().is_empty() {
            None
        } else {
            Some(config.picture.clone())
        };

        Ok(Self {
            paths,
            text: config.text.clone(),
            picture,
            style,
            extensions: config.extensions.clone(),
        })
    }
}

/// Outcome for one discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub original: PathBuf,
    /// `None` when the file could not be processed
    pub output: Option<PathBuf>,
}

/// Lazy, single-pass expansion of input paths into picture files.
///
/// - a file is yielded as is, whatever its extension
/// - a directory is walked once per extension, recursively; within a
///   directory, its files come before the content of its subdirectories
/// - anything else (missing path) is skipped silently
///
/// Hidden entries are walked like any other. Symlinked directories are
/// followed, each real directory at most once per pass.
#[derive(Debug)]
pub struct FileWalker {
    inputs: VecDeque<PathBuf>,
    extensions: Vec<String>,
    current: Option<DirectoryWalk>,
}

#[derive(Debug)]
struct DirectoryWalk {
    root: PathBuf,
    extension_index: usize,
    pending_dirs: Vec<PathBuf>,
    pending_files: VecDeque<PathBuf>,
    visited: HashSet<PathBuf>,
}

impl FileWalker {
    pub fn new(paths: &[PathBuf], extensions: &[String]) -> Self {
        Self {
            inputs: paths.iter().cloned().collect(),
            extensions: extensions.to_vec(),
            current: None,
        }
    }

    fn start_directory(&mut self, root: PathBuf) {
        if self.extensions.is_empty() {
            return;
        }
        self.current = Some(DirectoryWalk {
            pending_dirs: vec![root.clone()],
            root,
            extension_index: 0,
            pending_files: VecDeque::new(),
            visited: HashSet::new(),
        });
    }
}

impl Iterator for FileWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(walk) = self.current.as_mut() {
                if let Some(file) = walk.next_file(&self.extensions) {
                    return Some(file);
                }
                self.current = None;
            }

            let input = self.inputs.pop_front()?;
            if input.is_file() {
                return Some(input);
            } else if input.is_dir() {
                self.start_directory(input);
            } else {
                tracing::debug!(path = %input.display(), "Skipping missing input");
            }
        }
    }
}

impl DirectoryWalk {
    fn next_file(&mut self, extensions: &[String]) -> Option<PathBuf> {
        loop {
            if let Some(file) = self.pending_files.pop_front() {
                return Some(file);
            }

            if let Some(dir) = self.pending_dirs.pop() {
                self.scan(&dir, &extensions[self.extension_index]);
                continue;
            }

            // Pass for this extension done, restart from the root for the next
            self.extension_index += 1;
            if self.extension_index >= extensions.len() {
                return None;
            }
            self.visited.clear();
            self.pending_dirs.push(self.root.clone());
        }
    }

    fn scan(&mut self, dir: &Path, extension: &str) {
        let real = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        if !self.visited.insert(real) {
            tracing::debug!(path = %dir.display(), "Directory already walked");
            return;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Cannot read directory");
                return;
            }
        };

        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            } else if path.is_file() && has_extension(&path, extension) {
                self.pending_files.push_back(path);
            }
        }

        // Stack: push in reverse so subdirectories are visited in read order
        self.pending_dirs.extend(subdirs.into_iter().rev());
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// Lazy sequence of watermarking results, one per discovered file.
#[derive(Debug)]
pub struct WatermarkBatch {
    files: FileWalker,
    watermarker: Watermarker,
    text: String,
    picture: Option<PathBuf>,
}

impl WatermarkBatch {
    pub fn new(request: &WatermarkRequest) -> Self {
        Self {
            files: FileWalker::new(&request.paths, &request.extensions),
            watermarker: Watermarker::new(request.style.clone()),
            text: request.text.clone(),
            picture: request.picture.clone(),
        }
    }
}

impl Iterator for WatermarkBatch {
    type Item = Result<ProcessingResult, WatermarkError>;

    fn next(&mut self) -> Option<Self::Item> {
        let original = self.files.next()?;
        let result = self
            .watermarker
            .add_watermark(&original, &self.text, self.picture.as_deref())
            .map(|output| ProcessingResult { original, output });
        Some(result)
    }
}

/// Watermark every file designated by `request`, lazily.
pub fn apply_watermarks(request: &WatermarkRequest) -> WatermarkBatch {
    WatermarkBatch::new(request)
}
