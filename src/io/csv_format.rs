//! CSV table format for analysis reports
//!
//! This module centralizes all output format concerns:
//! - One serializable row type per table, each carrying its header
//! - Conversion from a [`PipelineReport`] into the full set of tables
//! - Synchronous table serialization
//!
//! Decimal amounts are rendered with four decimal places and percentages with
//! two. Headers are written explicitly so that empty tables still carry them.
//!
//! All functions are pure (no file system access) for easy testing.

use crate::core::categorizer::CategoryFrequency;
use crate::core::pipeline::PipelineReport;
use crate::types::{
    AnalyzerError, Category, Direction, ExtractionFailure, Transaction, TransactionField,
    UserSummary,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// A row of an output table
pub trait TableRow: Serialize {
    /// Column names, in serialization order
    const HEADERS: &'static [&'static str];
}

/// The output tables, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Transactions,
    UserAnalysis,
    CategoryStats,
    Overdrafts,
    AtRisk,
    ExtractionFailures,
    Summary,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Transactions,
        Table::UserAnalysis,
        Table::CategoryStats,
        Table::Overdrafts,
        Table::AtRisk,
        Table::ExtractionFailures,
        Table::Summary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Transactions => "transactions",
            Table::UserAnalysis => "user_analysis",
            Table::CategoryStats => "category_stats",
            Table::Overdrafts => "overdrafts",
            Table::AtRisk => "at_risk",
            Table::ExtractionFailures => "extraction_failures",
            Table::Summary => "summary",
        }
    }

    /// File name of the table for an output prefix
    pub fn file_name(&self, prefix: &str) -> String {
        format!("{}_{}.csv", prefix, self.name())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const AMOUNT_PLACES: u32 = 4;

/// Four decimal places, or every significant place when there are more
///
/// Amounts are never rounded: `0.000049` is written as is.
fn amount(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.scale() > AMOUNT_PLACES {
        normalized.to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return format!("{:.2}", 0.0);
    }
    format!("{:.2}", count as f64 / total as f64 * 100.0)
}

/// Row of the `transactions`, `overdrafts` and `at_risk` tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow<'a> {
    pub timestamp: String,
    pub session_id: &'a str,
    pub line_number: usize,
    pub user_id: &'a str,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub amount: String,
    pub user_balance: String,
    pub transaction_id: Option<&'a str>,
    pub source: Option<&'a str>,
    pub action: Option<&'a str>,
    pub vat: Option<String>,
}

impl TableRow for TransactionRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "timestamp",
        "session_id",
        "line_number",
        "user_id",
        "type",
        "amount",
        "user_balance",
        "transaction_id",
        "source",
        "action",
        "vat",
    ];
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            timestamp: tx.timestamp.to_string(),
            session_id: &tx.session_id,
            line_number: tx.line_number,
            user_id: &tx.user_id,
            direction: tx.direction,
            amount: amount(tx.amount),
            user_balance: amount(tx.user_balance),
            transaction_id: tx.transaction_id.as_deref(),
            source: tx.source.as_deref(),
            action: tx.action.as_deref(),
            vat: tx.vat.map(amount),
        }
    }
}

/// Row of the `user_analysis` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow<'a> {
    pub user_id: &'a str,
    pub transaction_count: usize,
    pub credit_count: usize,
    pub debit_count: usize,
    pub total_credits: String,
    pub total_debits: String,
    pub min_balance: String,
    pub max_balance: String,
    pub current_balance: Option<String>,
    pub first_transaction: Option<String>,
    pub last_transaction: Option<String>,
    pub overdraft_flag: bool,
}

impl TableRow for UserRow<'_> {
    const HEADERS: &'static [&'static str] = &[
        "user_id",
        "transaction_count",
        "credit_count",
        "debit_count",
        "total_credits",
        "total_debits",
        "min_balance",
        "max_balance",
        "current_balance",
        "first_transaction",
        "last_transaction",
        "overdraft_flag",
    ];
}

impl<'a> From<&'a UserSummary> for UserRow<'a> {
    fn from(summary: &'a UserSummary) -> Self {
        Self {
            user_id: &summary.user_id,
            transaction_count: summary.transaction_count,
            credit_count: summary.credit_count,
            debit_count: summary.debit_count,
            total_credits: amount(summary.total_credit),
            total_debits: amount(summary.total_debit),
            min_balance: amount(summary.min_balance),
            max_balance: amount(summary.max_balance),
            current_balance: summary.current_balance.map(amount),
            first_transaction: summary.first_transaction.map(|t| t.to_string()),
            last_transaction: summary.last_transaction.map(|t| t.to_string()),
            overdraft_flag: summary.overdraft_flag,
        }
    }
}

/// Row of the `category_stats` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: Category,
    pub count: usize,
    pub percentage: String,
}

impl TableRow for CategoryRow {
    const HEADERS: &'static [&'static str] = &["category", "count", "percentage"];
}

/// Category rows, most frequent first
pub fn category_rows(frequency: &CategoryFrequency) -> Vec<CategoryRow> {
    let total = frequency.total();
    frequency
        .ranked()
        .into_iter()
        .map(|(category, count)| CategoryRow {
            category,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

/// Row of the `extraction_failures` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRow<'a> {
    pub line_number: usize,
    pub timestamp: String,
    pub session_id: &'a str,
    pub field: &'static str,
    pub reason: String,
}

impl TableRow for FailureRow<'_> {
    const HEADERS: &'static [&'static str] =
        &["line_number", "timestamp", "session_id", "field", "reason"];
}

impl<'a> From<&'a ExtractionFailure> for FailureRow<'a> {
    fn from(failure: &'a ExtractionFailure) -> Self {
        Self {
            line_number: failure.line_number,
            timestamp: failure.timestamp.to_string(),
            session_id: &failure.session_id,
            field: failure.field().key(),
            reason: failure.error.to_string(),
        }
    }
}

/// Row of the `summary` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub section: &'static str,
    pub metric: String,
    pub value: String,
}

impl TableRow for SummaryRow {
    const HEADERS: &'static [&'static str] = &["section", "metric", "value"];
}

impl SummaryRow {
    fn new(section: &'static str, metric: impl Into<String>, value: impl ToString) -> Self {
        Self {
            section,
            metric: metric.into(),
            value: value.to_string(),
        }
    }
}

/// Stage counters, transaction statistics and overdraft statistics as rows
pub fn summary_rows(report: &PipelineReport) -> Vec<SummaryRow> {
    let counters = &report.counters;
    let mut rows = vec![
        SummaryRow::new("pipeline", "lines_read", counters.lines_read),
        SummaryRow::new("pipeline", "structured", counters.structured),
        SummaryRow::new("pipeline", "rejected", counters.rejected),
        SummaryRow::new("pipeline", "unknown_timestamps", counters.unknown_timestamps),
        SummaryRow::new("pipeline", "transaction_records", counters.transaction_records),
        SummaryRow::new("pipeline", "extracted", counters.extracted),
        SummaryRow::new("pipeline", "extraction_failures", counters.failures.total()),
    ];
    rows.extend(TransactionField::REQUIRED.iter().map(|field| {
        SummaryRow::new(
            "pipeline",
            format!("failures_{}", field.key()),
            counters.failures.get(*field),
        )
    }));

    let stats = &report.analysis.transaction_stats;
    rows.extend([
        SummaryRow::new("transactions", "total_count", stats.total_count),
        SummaryRow::new("transactions", "credit_count", stats.credit_count),
        SummaryRow::new("transactions", "debit_count", stats.debit_count),
        SummaryRow::new("transactions", "total_credits", amount(stats.total_credits)),
        SummaryRow::new("transactions", "total_debits", amount(stats.total_debits)),
        SummaryRow::new("transactions", "unique_users", stats.unique_users),
        SummaryRow::new("transactions", "unique_sessions", stats.unique_sessions),
    ]);

    let overdrafts = &report.analysis.overdraft_stats;
    rows.extend([
        SummaryRow::new("overdrafts", "negative_balance_count", overdrafts.negative_balance_count),
        SummaryRow::new("overdrafts", "low_balance_count", overdrafts.low_balance_count),
        SummaryRow::new("overdrafts", "at_risk_users", overdrafts.at_risk_users),
        SummaryRow::new("overdrafts", "overdraft_users", overdrafts.overdraft_users),
    ]);

    rows
}

/// Every output table of a report, as rows
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTables<'a> {
    pub transactions: Vec<TransactionRow<'a>>,
    pub user_analysis: Vec<UserRow<'a>>,
    pub category_stats: Vec<CategoryRow>,
    pub overdrafts: Vec<TransactionRow<'a>>,
    pub at_risk: Vec<TransactionRow<'a>>,
    pub extraction_failures: Vec<FailureRow<'a>>,
    pub summary: Vec<SummaryRow>,
}

impl<'a> ReportTables<'a> {
    pub fn from_report(report: &'a PipelineReport) -> Self {
        let analysis = &report.analysis;
        Self {
            transactions: report.transactions.iter().map(TransactionRow::from).collect(),
            user_analysis: analysis.user_summaries.iter().map(UserRow::from).collect(),
            category_stats: category_rows(&report.category_frequency),
            overdrafts: analysis.overdrafts.iter().map(TransactionRow::from).collect(),
            at_risk: analysis.at_risk.iter().map(TransactionRow::from).collect(),
            extraction_failures: report.failures.iter().map(FailureRow::from).collect(),
            summary: summary_rows(report),
        }
    }
}

/// Write one table in CSV format
///
/// # Arguments
///
/// * `rows` - Rows to write, in output order
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Errors
///
/// Returns [`AnalyzerError::CsvError`] or [`AnalyzerError::IoError`] if a row
/// cannot be serialized or the writer fails.
pub fn write_table<R: TableRow>(rows: &[R], output: &mut dyn Write) -> Result<(), AnalyzerError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(R::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::core::pipeline;
    use crate::types::{ExtractionError, LogTimestamp};
    use rstest::rstest;

    fn render<R: TableRow>(rows: &[R]) -> String {
        let mut output = Vec::new();
        write_table(rows, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn transaction(user_balance: Decimal) -> Transaction {
        Transaction {
            user_id: "u1".to_string(),
            amount: Decimal::new(50, 0),
            direction: Direction::Debit,
            user_balance,
            timestamp: LogTimestamp::parse("2024-01-01T00:00:00"),
            session_id: "SESS1".to_string(),
            line_number: 1,
            transaction_id: None,
            source: Some("api".to_string()),
            action: None,
            vat: Some(Decimal::new(125, 2)),
        }
    }

    #[rstest]
    #[case::transactions(Table::Transactions, "log_analysis_transactions.csv")]
    #[case::users(Table::UserAnalysis, "log_analysis_user_analysis.csv")]
    #[case::categories(Table::CategoryStats, "log_analysis_category_stats.csv")]
    #[case::overdrafts(Table::Overdrafts, "log_analysis_overdrafts.csv")]
    #[case::at_risk(Table::AtRisk, "log_analysis_at_risk.csv")]
    #[case::failures(Table::ExtractionFailures, "log_analysis_extraction_failures.csv")]
    #[case::summary(Table::Summary, "log_analysis_summary.csv")]
    fn test_table_file_names(#[case] table: Table, #[case] expected: &str) {
        assert_eq!(table.file_name("log_analysis"), expected);
    }

    #[rstest]
    #[case::integer(Decimal::new(50, 0), "50.0000")]
    #[case::padded(Decimal::new(-1025, 2), "-10.2500")]
    #[case::trailing_zeros_beyond_four(Decimal::new(1_500_000, 6), "1.5000")]
    #[case::small_value_kept(Decimal::new(49, 6), "0.000049")]
    #[case::many_places_kept(Decimal::new(-123_456_789, 8), "-1.23456789")]
    fn test_amount_never_rounds(#[case] value: Decimal, #[case] expected: &str) {
        assert_eq!(amount(value), expected);
    }

    #[test]
    fn test_transaction_row_format() {
        let tx = transaction(Decimal::new(-5, 0));
        let output = render(&[TransactionRow::from(&tx)]);

        assert_eq!(
            output,
            "timestamp,session_id,line_number,user_id,type,amount,user_balance,transaction_id,source,action,vat\n\
             2024-01-01T00:00:00Z,SESS1,1,u1,DEBIT,50.0000,-5.0000,,api,,1.2500\n"
        );
    }

    #[rstest]
    #[case::transactions(render::<TransactionRow>(&[]), TransactionRow::HEADERS)]
    #[case::users(render::<UserRow>(&[]), UserRow::HEADERS)]
    #[case::categories(render::<CategoryRow>(&[]), CategoryRow::HEADERS)]
    #[case::failures(render::<FailureRow>(&[]), FailureRow::HEADERS)]
    #[case::summary(render::<SummaryRow>(&[]), SummaryRow::HEADERS)]
    fn test_empty_table_has_header(#[case] output: String, #[case] headers: &[&str]) {
        assert_eq!(output, format!("{}\n", headers.join(",")));
    }

    #[test]
    fn test_user_row_without_dated_transactions() {
        let summary = UserSummary {
            user_id: "u2".to_string(),
            transaction_count: 1,
            credit_count: 1,
            debit_count: 0,
            total_credit: Decimal::new(10, 0),
            total_debit: Decimal::ZERO,
            min_balance: Decimal::new(8, 0),
            max_balance: Decimal::new(8, 0),
            current_balance: None,
            first_transaction: None,
            last_transaction: None,
            overdraft_flag: false,
        };

        let output = render(&[UserRow::from(&summary)]);

        assert!(output.ends_with("u2,1,1,0,10.0000,0.0000,8.0000,8.0000,,,,false\n"));
    }

    #[test]
    fn test_category_rows_percentages() {
        let mut frequency = CategoryFrequency::new();
        frequency.add(Category::Transaction, 1);
        frequency.add(Category::BalanceSyncStart, 2);

        let output = render(&category_rows(&frequency));

        assert_eq!(
            output,
            "category,count,percentage\nbalance_sync_start,2,66.67\ntransaction,1,33.33\n"
        );
    }

    #[test]
    fn test_failure_row_names_field() {
        let failure = ExtractionFailure {
            line_number: 4,
            timestamp: LogTimestamp::Unknown,
            session_id: "S".to_string(),
            error: ExtractionError::MissingField {
                field: TransactionField::UserBalance,
            },
        };

        let row = FailureRow::from(&failure);

        assert_eq!(row.field, "userBalance");
        assert_eq!(row.timestamp, "unknown");
        assert_eq!(row.reason, failure.error.to_string());
    }

    #[test]
    fn test_summary_rows_cover_all_sections() {
        let lines = vec![
            "2024-01-01T00:00:00\tSESS1\tINFO\tTransaction processed: {userId: \"u1\", amount: 50, type: \"DEBIT\", userBalance: -5}".to_string(),
        ];
        let report = pipeline::run(&lines, &AnalyzerConfig::default()).unwrap();

        let rows = summary_rows(&report);
        let find = |section: &str, metric: &str| {
            rows.iter()
                .find(|r| r.section == section && r.metric == metric)
                .map(|r| r.value.clone())
        };

        assert_eq!(find("pipeline", "lines_read").as_deref(), Some("1"));
        assert_eq!(find("pipeline", "failures_userBalance").as_deref(), Some("0"));
        assert_eq!(find("transactions", "total_debits").as_deref(), Some("50.0000"));
        assert_eq!(find("overdrafts", "overdraft_users").as_deref(), Some("1"));
    }

    #[test]
    fn test_report_tables_partition_transactions() {
        let lines = vec![
            "2024-01-01T00:00:00Z\tS\tINFO\tTransaction {userId: a, amount: 1, type: DEBIT, userBalance: -1}".to_string(),
            "2024-01-01T00:00:01Z\tS\tINFO\tTransaction {userId: b, amount: 1, type: DEBIT, userBalance: 3}".to_string(),
            "2024-01-01T00:00:02Z\tS\tINFO\tTransaction {userId: c, amount: 1, type: CREDIT, userBalance: 30}".to_string(),
        ];
        let report = pipeline::run(&lines, &AnalyzerConfig::default()).unwrap();

        let tables = ReportTables::from_report(&report);

        assert_eq!(tables.transactions.len(), 3);
        assert_eq!(tables.overdrafts.len(), 1);
        assert_eq!(tables.overdrafts[0].user_id, "a");
        assert_eq!(tables.at_risk.len(), 1);
        assert_eq!(tables.at_risk[0].user_id, "b");
        assert_eq!(tables.user_analysis.len(), 3);
        assert_eq!(tables.category_stats.len(), 1);
    }
}
