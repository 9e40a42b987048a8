//! Synchronous processing strategy
//!
//! Single-threaded implementation of the ProcessingStrategy trait. It
//! orchestrates one run by delegating:
//! - File discovery and decoding to [`LineSource`]
//! - The analysis stages to [`pipeline::run`]
//! - CSV output to [`TableSink`]

use crate::config::AnalyzerConfig;
use crate::core::pipeline::{self, PipelineReport};
use crate::io::{LineSource, TableSink};
use crate::strategy::ProcessingStrategy;
use crate::types::AnalyzerError;
use std::path::Path;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use balance_log_analyzer::config::AnalyzerConfig;
/// use balance_log_analyzer::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(AnalyzerConfig::default());
///
/// match strategy.process(Path::new("logs"), Path::new("output")) {
///     Ok(report) => println!("{} transactions", report.transactions.len()),
///     Err(e) => eprintln!("Fatal error: {}", e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: AnalyzerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn analyze(&self, lines: Vec<String>) -> Result<PipelineReport, AnalyzerError> {
        pipeline::run(&lines, &self.config)
    }

    fn process(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<PipelineReport, AnalyzerError> {
        let source = LineSource::new(input_dir, &self.config).read_lines()?;

        let report = self.analyze(source.lines)?;
        pipeline::log_summary(&report);

        TableSink::new(output_dir, &self.config.output_prefix).write_report(&report)?;

        Ok(report)
    }
}
