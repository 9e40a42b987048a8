//! Concurrent execution of the per-line stages
//!
//! The async strategy runs structuring, categorization and extraction on
//! batches of lines in parallel tokio tasks, then joins the results so the
//! remaining stages see exactly what a sequential run would produce.
//!
//! # Components
//!
//! - **BatchProcessor**: partitions lines, spawns one task per batch and
//!   restores input order when joining
//! - **SharedCounters**: `DashMap` and atomic tallies updated by every task
//!
//! # Thread Safety
//!
//! Tasks share nothing but the counters. All counter updates are increments,
//! so the final tally does not depend on the order batches finish in.

pub mod batch_processor;
pub mod counters;

pub use batch_processor::{BatchOutcome, BatchProcessor, LineBatch};
pub use counters::{CounterSnapshot, SharedCounters};
