//! Sequential analysis pipeline
//!
//! Chains the core stages by explicit value passing:
//!
//! ```text
//! raw lines ─► structure_lines ─► Categorizer ─► extract_all ─► sort_canonical ─► analyze
//!                   │                  │              │
//!               rejections         frequency       failures
//! ```
//!
//! Each stage consumes the full output of the previous one. The result is a
//! [`PipelineReport`] that owns every table the sink writes; no stage keeps
//! state after it returns.

use crate::config::AnalyzerConfig;
use crate::core::analyzer::{self, FinancialAnalysis};
use crate::core::categorizer::{Categorizer, CategoryFrequency};
use crate::core::extractor::{self, FailureCounts};
use crate::core::structurer;
use crate::types::{AnalyzerError, ExtractionFailure, Rejection, Transaction};

/// Per-stage record counts
///
/// Every input line is accounted for: `lines_read = structured + rejected` and
/// `transaction_records = extracted + failures.total()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCounters {
    pub lines_read: usize,
    pub structured: usize,
    pub rejected: usize,
    pub unknown_timestamps: usize,
    pub transaction_records: usize,
    pub extracted: usize,
    pub failures: FailureCounts,
}

/// Output of one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub counters: StageCounters,

    pub category_frequency: CategoryFrequency,

    /// Extracted transactions in canonical order
    pub transactions: Vec<Transaction>,

    /// Structural rejections in input order
    pub rejections: Vec<Rejection>,

    /// Extraction failures in input order
    pub failures: Vec<ExtractionFailure>,

    pub analysis: FinancialAnalysis,
}

/// Per-line results for a contiguous run of lines
///
/// Produced by [`process_lines`], either for the whole input or for one batch
/// of the async strategy. Outcomes for adjacent runs are joined with
/// [`LineOutcome::append`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineOutcome {
    pub lines_read: usize,
    pub structured: usize,
    pub unknown_timestamps: usize,
    pub category_frequency: CategoryFrequency,
    pub transaction_records: usize,
    pub transactions: Vec<Transaction>,
    pub rejections: Vec<Rejection>,
    pub failures: Vec<ExtractionFailure>,
}

impl LineOutcome {
    /// Append the outcome of the run of lines that directly follows this one
    pub fn append(&mut self, next: LineOutcome) {
        self.lines_read += next.lines_read;
        self.structured += next.structured;
        self.unknown_timestamps += next.unknown_timestamps;
        self.category_frequency.merge(&next.category_frequency);
        self.transaction_records += next.transaction_records;
        self.transactions.extend(next.transactions);
        self.rejections.extend(next.rejections);
        self.failures.extend(next.failures);
    }
}

/// Structure, categorize and extract a run of lines
///
/// This is the context-free part of the pipeline: a line's result depends only
/// on the line itself, so runs can be processed independently and appended in
/// input order.
///
/// # Arguments
///
/// * `first_line_number` - Line number of `lines[0]` (1-based)
/// * `lines` - Raw lines
/// * `categorizer` - Rule list to categorize with
pub fn process_lines(
    first_line_number: usize,
    lines: &[String],
    categorizer: &Categorizer,
) -> LineOutcome {
    let structured = structurer::structure_lines(first_line_number, lines);
    let unknown_timestamps = structured.unknown_timestamps();
    let structured_count = structured.records.len();

    let categorized = categorizer.categorize_all(structured.records);
    let extracted = extractor::extract_batch(&categorized);

    LineOutcome {
        lines_read: lines.len(),
        structured: structured_count,
        unknown_timestamps,
        category_frequency: categorized.frequency,
        transaction_records: extracted.examined,
        transactions: extracted.transactions,
        rejections: structured.rejections,
        failures: extracted.failures,
    }
}

/// Sort, analyze and assemble the final report
///
/// # Errors
///
/// Propagates [`AnalyzerError::ArithmeticOverflow`] from the analyzer.
pub fn finish(
    outcome: LineOutcome,
    config: &AnalyzerConfig,
) -> Result<PipelineReport, AnalyzerError> {
    let LineOutcome {
        lines_read,
        structured,
        unknown_timestamps,
        category_frequency,
        transaction_records,
        mut transactions,
        rejections,
        failures,
    } = outcome;

    analyzer::sort_canonical(&mut transactions);
    let analysis = analyzer::analyze(&transactions, config.at_risk_threshold)?;

    let counters = StageCounters {
        lines_read,
        structured,
        rejected: rejections.len(),
        unknown_timestamps,
        transaction_records,
        extracted: transactions.len(),
        failures: failures.iter().collect(),
    };

    Ok(PipelineReport {
        counters,
        category_frequency,
        transactions,
        rejections,
        failures,
        analysis,
    })
}

/// Run the whole pipeline sequentially
///
/// # Errors
///
/// Propagates [`AnalyzerError::ArithmeticOverflow`] from the analyzer.
pub fn run(lines: &[String], config: &AnalyzerConfig) -> Result<PipelineReport, AnalyzerError> {
    let categorizer = Categorizer::default();
    let outcome = process_lines(1, lines, &categorizer);
    finish(outcome, config)
}

/// Log the console summary of a finished run
pub fn log_summary(report: &PipelineReport) {
    let counters = &report.counters;

    log::info!(
        "Parsed {} of {} lines ({} rejected, {} with unknown timestamp)",
        counters.structured,
        counters.lines_read,
        counters.rejected,
        counters.unknown_timestamps
    );

    let total = report.category_frequency.total();
    for (category, count) in report.category_frequency.ranked() {
        let percentage = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        };
        log::info!("   {}: {} ({:.1}%)", category, count, percentage);
    }

    log::info!(
        "Extracted {} of {} transaction records ({} failed)",
        counters.extracted,
        counters.transaction_records,
        counters.failures.total()
    );
    for (field, count) in counters.failures.by_required_field() {
        if count > 0 {
            log::info!("   missing or invalid {}: {}", field, count);
        }
    }

    let overdrafts = &report.analysis.overdraft_stats;
    if overdrafts.negative_balance_count > 0 {
        log::info!(
            "Found {} transactions with negative balance ({} users)",
            overdrafts.negative_balance_count,
            overdrafts.overdraft_users
        );
    } else {
        log::info!("No negative balances detected");
    }
    if overdrafts.low_balance_count > 0 {
        log::info!(
            "Found {} transactions with low balance ({} users at risk)",
            overdrafts.low_balance_count,
            overdrafts.at_risk_users
        );
    }
    log::info!("Analyzed {} users", report.analysis.user_summaries.len());
}
