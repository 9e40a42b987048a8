//! Asynchronous batch processing strategy
//!
//! Multi-threaded implementation of the ProcessingStrategy trait. Files are read
//! concurrently, lines are cut into batches and the per-line stages of every
//! batch run on their own tokio task.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncLineSource (buffered tokio::fs reads, file order kept)
//!     ├── BatchProcessor (one task per batch, joined by batch index)
//!     │   └── SharedCounters (DashMap + atomics)
//!     ├── pipeline::finish (canonical sort + financial analysis)
//!     └── AsyncTableSink (csv-async writers)
//! ```
//!
//! Only structuring, categorization and extraction run in parallel. Sorting
//! and aggregation need the complete transaction set and run once after the
//! join, exactly as in the sync strategy, so both strategies produce the same
//! report.

use crate::config::AnalyzerConfig;
use crate::core::categorizer::Categorizer;
use crate::core::pipeline::{self, PipelineReport};
use crate::core::r#async::{BatchProcessor, SharedCounters};
use crate::io::{AsyncLineSource, AsyncTableSink};
use crate::strategy::ProcessingStrategy;
use crate::types::AnalyzerError;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Configuration for batch processing
///
/// Controls how lines are batched and the number of worker threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of lines per batch
    pub batch_size: usize,
    /// Worker threads, and the bound on concurrent file reads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            log::warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            log::warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches,
                default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// - `batch_size`: Number of lines per batch (default: 1000)
/// - `max_concurrent_batches`: Number of worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: AnalyzerConfig,
    batch_config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `config` - Analysis settings
    /// * `batch_config` - BatchConfig with batch_size and max_concurrent_batches
    pub fn new(config: AnalyzerConfig, batch_config: BatchConfig) -> Self {
        Self {
            config,
            batch_config,
        }
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch_config
    }

    fn runtime(&self) -> Result<Runtime, AnalyzerError> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch_config.max_concurrent_batches)
            .build()
            .map_err(|e| AnalyzerError::RuntimeError {
                message: format!("Failed to create tokio runtime: {}", e),
            })
    }

    /// Batch, process concurrently, then sort and aggregate
    async fn analyze_batches(&self, lines: Vec<String>) -> Result<PipelineReport, AnalyzerError> {
        let counters = Arc::new(SharedCounters::new());
        let processor = BatchProcessor::new(Categorizer::default(), Arc::clone(&counters));

        let batches = BatchProcessor::partition(lines, self.batch_config.batch_size);
        let outcome = processor.process_all(batches).await?;

        let snapshot = counters.verify(&outcome)?;
        log::info!(
            "Processed {} lines in {} batches of up to {}",
            snapshot.lines_read,
            snapshot.batches_done,
            self.batch_config.batch_size
        );
        for (category, count) in snapshot.category_frequency.ranked() {
            log::debug!("   batch tally {}: {}", category, count);
        }
        for (field, count) in snapshot.failures.by_required_field() {
            log::debug!("   batch tally failures {}: {}", field, count);
        }

        pipeline::finish(outcome, &self.config)
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn analyze(&self, lines: Vec<String>) -> Result<PipelineReport, AnalyzerError> {
        self.runtime()?.block_on(self.analyze_batches(lines))
    }

    fn process(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<PipelineReport, AnalyzerError> {
        let runtime = self.runtime()?;

        runtime.block_on(async {
            let source = AsyncLineSource::new(
                input_dir,
                &self.config,
                self.batch_config.max_concurrent_batches,
            )
            .read_lines()
            .await?;

            let report = self.analyze_batches(source.lines).await?;
            pipeline::log_summary(&report);

            AsyncTableSink::new(output_dir, &self.config.output_prefix)
                .write_report(&report)
                .await?;

            Ok(report)
        })
    }
}
