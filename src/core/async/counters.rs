//! Thread-safe stage counters for concurrent batch processing
//!
//! Batches finish in any order, so every update here is a commutative
//! increment: per-category and per-field tallies live in `DashMap`s (one shard
//! lock per key), scalar counts in atomics. A snapshot taken after all batches
//! have been joined equals the tally a sequential run would produce.

use crate::core::categorizer::CategoryFrequency;
use crate::core::extractor::FailureCounts;
use crate::core::pipeline::LineOutcome;
use crate::types::{AnalyzerError, Category, TransactionField};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters shared by all batch tasks of one run
#[derive(Debug, Default)]
pub struct SharedCounters {
    lines_read: AtomicUsize,
    structured: AtomicUsize,
    rejected: AtomicUsize,
    unknown_timestamps: AtomicUsize,
    transaction_records: AtomicUsize,
    extracted: AtomicUsize,
    batches_done: AtomicUsize,
    categories: DashMap<Category, usize>,
    failures: DashMap<TransactionField, usize>,
}

/// Point-in-time copy of [`SharedCounters`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub lines_read: usize,
    pub structured: usize,
    pub rejected: usize,
    pub unknown_timestamps: usize,
    pub transaction_records: usize,
    pub extracted: usize,
    pub batches_done: usize,
    pub category_frequency: CategoryFrequency,
    pub failures: FailureCounts,
}

impl SharedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the tallies of one finished batch
    pub fn record_batch(&self, outcome: &LineOutcome) {
        self.lines_read.fetch_add(outcome.lines_read, Ordering::Relaxed);
        self.structured.fetch_add(outcome.structured, Ordering::Relaxed);
        self.rejected.fetch_add(outcome.rejections.len(), Ordering::Relaxed);
        self.unknown_timestamps.fetch_add(outcome.unknown_timestamps, Ordering::Relaxed);
        self.transaction_records.fetch_add(outcome.transaction_records, Ordering::Relaxed);
        self.extracted.fetch_add(outcome.transactions.len(), Ordering::Relaxed);

        for category in Category::ALL {
            let count = outcome.category_frequency.get(category);
            if count > 0 {
                *self.categories.entry(category).or_insert(0) += count;
            }
        }
        for failure in &outcome.failures {
            *self.failures.entry(failure.field()).or_insert(0) += 1;
        }

        self.batches_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of batches recorded so far
    pub fn batches_done(&self) -> usize {
        self.batches_done.load(Ordering::Relaxed)
    }

    /// Copy the current tallies into ordered tables
    pub fn snapshot(&self) -> CounterSnapshot {
        let mut category_frequency = CategoryFrequency::new();
        for entry in self.categories.iter() {
            category_frequency.add(*entry.key(), *entry.value());
        }

        let mut failures = FailureCounts::new();
        for entry in self.failures.iter() {
            failures.add(*entry.key(), *entry.value());
        }

        CounterSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            structured: self.structured.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            unknown_timestamps: self.unknown_timestamps.load(Ordering::Relaxed),
            transaction_records: self.transaction_records.load(Ordering::Relaxed),
            extracted: self.extracted.load(Ordering::Relaxed),
            batches_done: self.batches_done.load(Ordering::Relaxed),
            category_frequency,
            failures,
        }
    }

    /// Check the tallies against the joined outcome of every batch
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::RuntimeError`] naming the first tally that
    /// differs, which means a batch was recorded twice or never.
    pub fn verify(&self, outcome: &LineOutcome) -> Result<CounterSnapshot, AnalyzerError> {
        let snapshot = self.snapshot();
        let expected_failures: FailureCounts = outcome.failures.iter().collect();

        let mismatch = if snapshot.lines_read != outcome.lines_read {
            Some("lines_read")
        } else if snapshot.structured != outcome.structured {
            Some("structured")
        } else if snapshot.rejected != outcome.rejections.len() {
            Some("rejected")
        } else if snapshot.unknown_timestamps != outcome.unknown_timestamps {
            Some("unknown_timestamps")
        } else if snapshot.transaction_records != outcome.transaction_records {
            Some("transaction_records")
        } else if snapshot.extracted != outcome.transactions.len() {
            Some("extracted")
        } else if snapshot.category_frequency != outcome.category_frequency {
            Some("category_frequency")
        } else if snapshot.failures != expected_failures {
            Some("failures")
        } else {
            None
        };

        match mismatch {
            Some(tally) => Err(AnalyzerError::RuntimeError {
                message: format!("Batch counters disagree with joined output ({})", tally),
            }),
            None => Ok(snapshot),
        }
    }
}
