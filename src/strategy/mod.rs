//! Processing strategy module for log analysis
//!
//! This module defines the Strategy pattern for complete analysis runs, from
//! reading the compressed logs to writing the report tables. Different
//! implementations (sequential, concurrent batch) can be selected at runtime
//! and produce identical reports for the same input.

use crate::cli::StrategyType;
use crate::config::AnalyzerConfig;
use crate::core::pipeline::PipelineReport;
use crate::types::AnalyzerError;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete analysis runs
pub trait ProcessingStrategy: Send + Sync {
    /// Run the analysis stages over lines already in memory
    ///
    /// # Arguments
    ///
    /// * `lines` - Raw lines, already filtered to the severity marker
    ///
    /// # Errors
    ///
    /// Returns an error if aggregation overflows or the strategy's runtime
    /// fails. Unparseable lines and failed extractions are counted in the
    /// report, not returned as errors.
    fn analyze(&self, lines: Vec<String>) -> Result<PipelineReport, AnalyzerError>;

    /// Read every log file under `input_dir`, analyze, and write the tables
    ///
    /// # Arguments
    ///
    /// * `input_dir` - Directory holding the compressed log files
    /// * `output_dir` - Directory receiving the CSV tables (created if absent)
    ///
    /// # Returns
    ///
    /// The report the tables were written from.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input directory does not exist or holds no log files
    /// - No line survives the severity filter
    /// - Aggregation overflows
    /// - A table cannot be written
    ///
    /// Input errors abort before any output file is created.
    fn process(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<PipelineReport, AnalyzerError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Analysis settings shared by both strategies
/// * `batch_config` - Optional batch settings (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: AnalyzerConfig,
    batch_config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(config)),
        StrategyType::Async => {
            let batch_config = batch_config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, batch_config))
        }
    }
}
