use crate::config::{
    AnalyzerConfig, DEFAULT_FILE_EXTENSION, DEFAULT_OUTPUT_PREFIX, DEFAULT_SEVERITY_MARKER,
};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Analyze compressed balance-sync service logs
#[derive(Parser, Debug)]
#[command(name = "balance-log-analyzer")]
#[command(
    about = "Extract transactions from balance-sync logs and report overdrafts and per-user balances",
    long_about = None
)]
pub struct CliArgs {
    /// Directory holding the compressed log files
    #[arg(
        value_name = "INPUT_DIR",
        help = "Directory searched recursively for .gz log files"
    )]
    pub input_dir: PathBuf,

    /// Directory receiving the CSV tables
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = "output",
        help = "Directory for the CSV tables (created if absent)"
    )]
    pub output_dir: PathBuf,

    /// File name prefix of every table
    #[arg(
        long = "prefix",
        value_name = "NAME",
        default_value = DEFAULT_OUTPUT_PREFIX,
        help = "File name prefix for the CSV tables"
    )]
    pub prefix: String,

    /// Only lines containing this marker are analyzed
    #[arg(
        long = "severity",
        value_name = "MARKER",
        default_value = DEFAULT_SEVERITY_MARKER,
        help = "Severity marker a line must contain to be analyzed"
    )]
    pub severity: String,

    /// Balances below this (and not negative) are reported as at risk
    #[arg(
        long = "at-risk-threshold",
        value_name = "AMOUNT",
        default_value = "10",
        help = "Balances in [0, AMOUNT) are reported as at risk"
    )]
    pub at_risk_threshold: Decimal,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Processing strategy: 'sync' for sequential or 'async' for concurrent batches"
    )]
    pub strategy: StrategyType,

    /// Number of lines per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of lines per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent batches (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads and concurrent file reads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create an AnalyzerConfig from CLI arguments
    ///
    /// Invalid values fall back to the defaults with a warning.
    pub fn to_analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::new(
            &self.severity,
            DEFAULT_FILE_EXTENSION,
            self.at_risk_threshold,
            &self.prefix,
        )
    }

    /// Create a BatchConfig from CLI arguments
    ///
    /// # Returns
    ///
    /// A `BatchConfig` with values from CLI arguments or defaults.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}
