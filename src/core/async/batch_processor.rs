//! Concurrent batch processing of raw lines
//!
//! `BatchProcessor` cuts the line sequence into fixed-size batches and runs the
//! context-free stages (structure, categorize, extract) of each batch on its
//! own tokio task.
//!
//! # Design
//!
//! A line's result never depends on another line, so batches can finish in
//! any order. Each batch carries its index and the line number of its first
//! line; outcomes are put back in index order before being appended, which
//! makes the joined [`LineOutcome`] identical to a sequential pass over the
//! same lines.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Categorizer                  (copied into every task)
//!     └── Arc<SharedCounters>          (live tallies, updated per finished batch)
//! ```

use std::sync::Arc;

use super::SharedCounters;
use crate::core::categorizer::Categorizer;
use crate::core::pipeline::{self, LineOutcome};
use crate::types::AnalyzerError;

/// One contiguous slice of the input
#[derive(Debug, Clone, PartialEq)]
pub struct LineBatch {
    /// Position of the batch in the input
    pub index: usize,

    /// Line number of `lines[0]` (1-based)
    pub first_line_number: usize,

    pub lines: Vec<String>,
}

/// Outcome of one batch, tagged with its index
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub index: usize,
    pub outcome: LineOutcome,
}

/// Batch processor with order-restoring reassembly
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    categorizer: Categorizer,
    counters: Arc<SharedCounters>,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `categorizer` - Rule list used by every batch
    /// * `counters` - Shared tallies updated as batches finish
    pub fn new(categorizer: Categorizer, counters: Arc<SharedCounters>) -> Self {
        Self {
            categorizer,
            counters,
        }
    }

    pub fn counters(&self) -> &Arc<SharedCounters> {
        &self.counters
    }

    /// Split lines into batches of at most `batch_size` lines
    ///
    /// Every line lands in exactly one batch; batches are numbered from 0 and
    /// line numbers continue across batch boundaries.
    pub fn partition(lines: Vec<String>, batch_size: usize) -> Vec<LineBatch> {
        let batch_size = batch_size.max(1);
        let mut batches = Vec::with_capacity(lines.len().div_ceil(batch_size));
        let mut first_line_number = 1;
        let mut lines = lines.into_iter().peekable();

        while lines.peek().is_some() {
            let chunk: Vec<String> = lines.by_ref().take(batch_size).collect();
            let len = chunk.len();
            batches.push(LineBatch {
                index: batches.len(),
                first_line_number,
                lines: chunk,
            });
            first_line_number += len;
        }

        batches
    }

    /// Run the context-free stages over one batch
    pub async fn process_batch(&self, batch: LineBatch) -> BatchOutcome {
        let outcome =
            pipeline::process_lines(batch.first_line_number, &batch.lines, &self.categorizer);
        self.counters.record_batch(&outcome);

        log::debug!(
            "Batch {} done ({} lines, {} batches finished)",
            batch.index,
            outcome.lines_read,
            self.counters.batches_done()
        );

        BatchOutcome {
            index: batch.index,
            outcome,
        }
    }

    /// Process every batch concurrently and join the outcomes in input order
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::RuntimeError`] if a batch task panicked or was
    /// cancelled. A lost batch would silently drop lines, so it is fatal.
    pub async fn process_all(
        &self,
        batches: Vec<LineBatch>,
    ) -> Result<LineOutcome, AnalyzerError> {
        let mut tasks = Vec::with_capacity(batches.len());
        for batch in batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move { processor.process_batch(batch).await }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            let outcome = task.await.map_err(|e| AnalyzerError::RuntimeError {
                message: format!("Batch task failed: {}", e),
            })?;
            outcomes.push(outcome);
        }

        Ok(Self::reassemble(outcomes))
    }

    /// Append batch outcomes in index order
    pub fn reassemble(mut outcomes: Vec<BatchOutcome>) -> LineOutcome {
        outcomes.sort_by_key(|batch| batch.index);

        let mut joined = LineOutcome::default();
        for batch in outcomes {
            joined.append(batch.outcome);
        }
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lines(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                format!(
                    "2024-01-01T00:00:{:02}Z\tS{}\tINFO\tTransaction {{userId: u{}, amount: {}, type: CREDIT, userBalance: {}}}",
                    i % 60,
                    i % 3,
                    i % 4,
                    i,
                    i
                )
            })
            .collect()
    }

    fn processor() -> BatchProcessor {
        BatchProcessor::new(Categorizer::default(), Arc::new(SharedCounters::new()))
    }

    #[rstest]
    #[case::exact(10, 5, 2)]
    #[case::remainder(11, 5, 3)]
    #[case::single_batch(3, 1000, 1)]
    #[case::one_per_batch(4, 1, 4)]
    #[case::empty(0, 10, 0)]
    fn test_partition_sizes(#[case] count: usize, #[case] size: usize, #[case] expected: usize) {
        let batches = BatchProcessor::partition(lines(count), size);

        assert_eq!(batches.len(), expected);
        let total: usize = batches.iter().map(|b| b.lines.len()).sum();
        assert_eq!(total, count);
        assert!(batches.iter().all(|b| b.lines.len() <= size));
    }

    #[test]
    fn test_partition_numbers_lines_across_batches() {
        let batches = BatchProcessor::partition(lines(7), 3);

        let starts: Vec<usize> = batches.iter().map(|b| b.first_line_number).collect();
        assert_eq!(starts, vec![1, 4, 7]);
        let indices: Vec<usize> = batches.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_reassemble_restores_index_order() {
        let input = lines(6);
        let categorizer = Categorizer::default();
        let first = BatchOutcome {
            index: 0,
            outcome: pipeline::process_lines(1, &input[..3], &categorizer),
        };
        let second = BatchOutcome {
            index: 1,
            outcome: pipeline::process_lines(4, &input[3..], &categorizer),
        };

        let joined = BatchProcessor::reassemble(vec![second, first]);

        assert_eq!(joined, pipeline::process_lines(1, &input, &categorizer));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_all_matches_sequential_pass() {
        let input = lines(250);
        let expected = pipeline::process_lines(1, &input, &Categorizer::default());

        let processor = processor();
        let batches = BatchProcessor::partition(input, 16);
        let joined = processor.process_all(batches).await.unwrap();

        assert_eq!(joined, expected);
        let snapshot = processor.counters().snapshot();
        assert_eq!(snapshot.lines_read, 250);
        assert_eq!(snapshot.batches_done, 16);
        assert_eq!(snapshot.category_frequency, expected.category_frequency);
    }

    #[tokio::test]
    async fn test_process_all_with_no_batches() {
        let joined = processor().process_all(Vec::new()).await.unwrap();
        assert_eq!(joined, LineOutcome::default());
    }
}
