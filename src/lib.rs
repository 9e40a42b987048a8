//! Balance Log Analyzer Library
//! # Overview
//!
//! This library turns the compressed logs of a balance-sync service into
//! financial tables: extracted transactions, overdraft and at-risk events,
//! per-user summaries, message category statistics and a run summary. Both a
//! sequential and a concurrent batch strategy are provided.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (LogRecord, Transaction, UserSummary, errors)
//! - [`config`] - Analysis settings
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Pure analysis stages:
//!   - [`core::structurer`] - Tab-delimited line → LogRecord
//!   - [`core::categorizer`] - Ordered keyword rules → Category
//!   - [`core::extractor`] - Transaction payload → Transaction
//!   - [`core::analyzer`] - Overdrafts, at-risk events, summaries, statistics
//!   - [`core::pipeline`] - Stage chaining into a PipelineReport
//! - [`io`] - Gzip line sources and CSV table sinks
//! - [`strategy`] - Sync and async end-to-end runs
//!
//! # Line Format
//!
//! ```text
//! 2024-01-01T00:00:00.000Z <TAB> SESSION <TAB> INFO <TAB> Transaction processed: {userId: "u1", amount: 50, type: "DEBIT", userBalance: -5}
//! ```
//!
//! Lines that do not split into four tab-delimited fields are rejected and
//! counted. Transaction records need `userId`, `amount`, `type` (CREDIT or
//! DEBIT) and `userBalance`; a negative `userBalance` is an overdraft.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use config::AnalyzerConfig;
pub use core::{Categorizer, FinancialAnalysis, PipelineReport, StageCounters};
pub use io::{LineSource, TableSink};
pub use types::{
    AnalyzerError, Category, Direction, LogRecord, LogTimestamp, Transaction, TransactionField,
    UserSummary,
};
