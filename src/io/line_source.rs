//! Line source over a directory of compressed log files
//!
//! Walks the input directory recursively, decompresses every file with the
//! configured extension and keeps the trimmed lines that contain the severity
//! marker.
//!
//! # Design
//!
//! Files are visited in file-name order so the line sequence (and every line
//! number derived from it) is the same on every run. A file that cannot be
//! opened or decoded contributes no lines at all: it is decoded into memory
//! first and only appended once the whole file succeeded.

use crate::config::AnalyzerConfig;
use crate::types::AnalyzerError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lines read from a directory plus per-file bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBatch {
    /// Matching lines, in file order then line order
    pub lines: Vec<String>,

    /// Files decoded successfully
    pub files_read: usize,

    /// Files skipped because they could not be read
    pub files_failed: usize,
}

impl SourceBatch {
    /// Record the result of reading one file
    pub fn absorb(&mut self, path: &Path, result: io::Result<Vec<String>>) {
        match result {
            Ok(lines) => {
                log::debug!("Read {} matching lines from {}", lines.len(), path.display());
                self.files_read += 1;
                self.lines.extend(lines);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                self.files_failed += 1;
            }
        }
    }

    /// Check that the source produced something to analyze
    ///
    /// # Errors
    ///
    /// * [`AnalyzerError::IoError`] if no file could be read
    /// * [`AnalyzerError::NoMatchingLines`] if no line contains the marker
    pub fn finish(self, marker: &str) -> Result<SourceBatch, AnalyzerError> {
        if self.files_read == 0 {
            return Err(AnalyzerError::IoError {
                message: format!("None of the {} log files could be read", self.files_failed),
            });
        }
        if self.lines.is_empty() {
            return Err(AnalyzerError::no_matching_lines(marker));
        }

        log::info!(
            "Loaded {} '{}' lines from {} files ({} skipped)",
            self.lines.len(),
            marker,
            self.files_read,
            self.files_failed
        );
        Ok(self)
    }
}

/// Decompress a gzip stream and keep the trimmed lines containing `marker`
///
/// Concatenated gzip members are read as one stream. Invalid UTF-8 is replaced
/// rather than failing the file.
///
/// # Errors
///
/// Returns the underlying I/O error if the stream is not valid gzip or ends
/// early.
pub fn decode_lines<R: Read>(reader: R, marker: &str) -> io::Result<Vec<String>> {
    let mut decoder = MultiGzDecoder::new(reader);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;

    let text = String::from_utf8_lossy(&bytes);
    Ok(text
        .lines()
        .filter(|line| line.contains(marker))
        .map(|line| line.trim().to_string())
        .collect())
}

/// Synchronous line source
#[derive(Debug, Clone)]
pub struct LineSource {
    root: PathBuf,
    marker: String,
    extension: String,
}

impl LineSource {
    /// Create a line source rooted at `root`
    ///
    /// # Arguments
    ///
    /// * `root` - Directory to walk
    /// * `config` - Supplies the severity marker and file extension
    pub fn new(root: impl Into<PathBuf>, config: &AnalyzerConfig) -> Self {
        Self {
            root: root.into(),
            marker: config.severity_marker.clone(),
            extension: config.file_extension.clone(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// List the log files under the root, in walk order
    ///
    /// # Errors
    ///
    /// * [`AnalyzerError::SourceNotFound`] if the root is not a directory
    /// * [`AnalyzerError::NoLogFiles`] if no file has the configured extension
    pub fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        if !self.root.is_dir() {
            return Err(AnalyzerError::source_not_found(&self.root));
        }

        let files: Vec<PathBuf> = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext == self.extension.as_str())
            })
            .map(|e| e.into_path())
            .collect();

        if files.is_empty() {
            return Err(AnalyzerError::no_log_files(&self.root, &self.extension));
        }

        log::info!(
            "Found {} '.{}' files under {}",
            files.len(),
            self.extension,
            self.root.display()
        );
        Ok(files)
    }

    /// Read one file
    pub fn read_file(&self, path: &Path) -> io::Result<Vec<String>> {
        let file = File::open(path)?;
        decode_lines(BufReader::new(file), &self.marker)
    }

    /// Read every log file under the root
    ///
    /// # Errors
    ///
    /// Fails if no file was found, none could be read, or no line matched the
    /// marker. Individual unreadable files are skipped with a warning.
    pub fn read_lines(&self) -> Result<SourceBatch, AnalyzerError> {
        let mut batch = SourceBatch::default();
        for path in self.discover_files()? {
            let result = self.read_file(&path);
            batch.absorb(&path, result);
        }
        batch.finish(&self.marker)
    }
}
