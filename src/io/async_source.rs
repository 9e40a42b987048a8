//! Asynchronous line source
//!
//! Same contract as [`LineSource`]: discovery and filtering are shared, only
//! the file reads differ. Files are read with `tokio::fs` through a buffered
//! stream, so up to `max_concurrent` reads are in flight while results still
//! come back in file order.

use crate::config::AnalyzerConfig;
use crate::io::line_source::{decode_lines, LineSource, SourceBatch};
use crate::types::AnalyzerError;
use futures::stream::{self, StreamExt};
use std::io;
use std::path::{Path, PathBuf};

/// Line source reading files concurrently on the tokio runtime
#[derive(Debug, Clone)]
pub struct AsyncLineSource {
    inner: LineSource,
    max_concurrent: usize,
}

impl AsyncLineSource {
    /// Create an async line source
    ///
    /// # Arguments
    ///
    /// * `root` - Directory to walk
    /// * `config` - Supplies the severity marker and file extension
    /// * `max_concurrent` - Upper bound on simultaneous file reads (0 is treated as 1)
    pub fn new(root: impl Into<PathBuf>, config: &AnalyzerConfig, max_concurrent: usize) -> Self {
        Self {
            inner: LineSource::new(root, config),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Read and decode one file
    pub async fn read_file(path: &Path, marker: &str) -> io::Result<Vec<String>> {
        let bytes = tokio::fs::read(path).await?;
        decode_lines(&bytes[..], marker)
    }

    /// Read every log file under the root
    ///
    /// # Errors
    ///
    /// Same as [`LineSource::read_lines`].
    pub async fn read_lines(&self) -> Result<SourceBatch, AnalyzerError> {
        let files = self.inner.discover_files()?;
        let marker = self.inner.marker();

        let results: Vec<(PathBuf, io::Result<Vec<String>>)> = stream::iter(files)
            .map(|path| async move {
                let result = Self::read_file(&path, marker).await;
                (path, result)
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut batch = SourceBatch::default();
        for (path, result) in results {
            batch.absorb(&path, result);
        }
        batch.finish(marker)
    }
}
