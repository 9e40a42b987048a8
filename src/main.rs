//! Balance Log Analyzer CLI
//!
//! Command-line interface for analyzing compressed balance-sync service logs.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- logs/
//! cargo run -- --output-dir reports --prefix calo_analysis logs/
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 logs/
//! RUST_LOG=debug cargo run -- logs/
//! ```
//!
//! The program walks the input directory for `.gz` files, analyzes every line
//! containing the severity marker and writes the CSV tables into the output
//! directory. Progress and the summary go to the log (stderr).
//!
//! # Processing Strategies
//!
//! - **sync**: Single-threaded sequential processing (default)
//! - **async**: Concurrent file reads and batch processing on a tokio runtime
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing directory, no log files, no matching lines, write failure, etc.)

use balance_log_analyzer::cli;
use balance_log_analyzer::strategy;
use env_logger::Env;
use std::process;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = cli::parse_args();

    let strategy = {
        let batch_config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, args.to_analyzer_config(), batch_config)
    };

    if let Err(e) = strategy.process(&args.input_dir, &args.output_dir) {
        log::error!("{}", e);
        process::exit(1);
    }
}
