//! Core analysis stages
//!
//! Everything in this module is pure: no file system access and no shared
//! state between calls.
//!
//! - `structurer` - Raw line → `LogRecord` or rejection
//! - `categorizer` - Ordered keyword rules and the category frequency table
//! - `extractor` - Transaction payload fields → typed `Transaction`
//! - `analyzer` - Overdrafts, at-risk events, per-user summaries, statistics
//! - `pipeline` - Sequential chaining of the stages into a `PipelineReport`
//! - `async` - Concurrent batch execution of the per-line stages

pub mod analyzer;
pub mod r#async;
pub mod categorizer;
pub mod extractor;
pub mod pipeline;
pub mod structurer;

pub use analyzer::FinancialAnalysis;
pub use categorizer::{Categorizer, CategoryFrequency};
pub use extractor::FailureCounts;
pub use pipeline::{PipelineReport, StageCounters};
pub use r#async::{BatchProcessor, SharedCounters};
