//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `record`: Structured log records, timestamps and categories
//! - `transaction`: Extracted transactions and extraction failures
//! - `summary`: Aggregates produced by the financial analyzer
//! - `error`: Error types for the analyzer

pub mod error;
pub mod record;
pub mod summary;
pub mod transaction;

pub use error::{AnalyzerError, ExtractionError, RejectReason};
pub use record::{CategorizedRecord, Category, LogRecord, LogTimestamp, Rejection};
pub use summary::{OverdraftStats, TransactionStats, UserSummary};
pub use transaction::{Direction, ExtractionFailure, Transaction, TransactionField};
