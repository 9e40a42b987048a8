//! Log record types
//!
//! This module defines the structured form of a log line ([`LogRecord`]), its
//! timestamp ([`LogTimestamp`]), the closed set of message categories
//! ([`Category`]) and the rejection produced for lines that cannot be structured.

use crate::types::error::RejectReason;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

/// Format accepted for timestamps without an explicit offset
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Timestamp of a log record
///
/// A timestamp that cannot be parsed does not invalidate the record; it becomes
/// [`LogTimestamp::Unknown`] and the record is left out of time-ordered views only.
///
/// Ordering places every known timestamp before `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogTimestamp {
    /// A successfully parsed point in time (UTC)
    Known(DateTime<Utc>),

    /// The timestamp text could not be parsed
    Unknown,
}

impl LogTimestamp {
    /// Parse a timestamp field
    ///
    /// Accepts RFC 3339 (`2024-01-01T00:00:00.123Z`) and offset-less ISO 8601
    /// (`2024-01-01T00:00:00`, interpreted as UTC). Anything else yields `Unknown`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return LogTimestamp::Known(parsed.with_timezone(&Utc));
        }

        match NaiveDateTime::parse_from_str(text, NAIVE_TIMESTAMP_FORMAT) {
            Ok(naive) => LogTimestamp::Known(naive.and_utc()),
            Err(_) => LogTimestamp::Unknown,
        }
    }

    /// Whether the timestamp was parsed
    pub fn is_known(&self) -> bool {
        matches!(self, LogTimestamp::Known(_))
    }
}

impl fmt::Display for LogTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogTimestamp::Known(at) => {
                write!(f, "{}", at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            LogTimestamp::Unknown => write!(f, "unknown"),
        }
    }
}

/// One structured log line
///
/// Created by the line structurer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// 1-based position of the line in the source sequence
    pub line_number: usize,

    /// Parsed timestamp (or the `Unknown` sentinel)
    pub timestamp: LogTimestamp,

    /// Session identifier (second field)
    pub session_id: String,

    /// Message type / severity tag (third field)
    pub message_type: String,

    /// Free-text message: everything after the third tab
    pub message: String,

    /// The raw line as received
    pub raw: String,
}

/// Semantic category of a log message
///
/// The set is closed; `Other` is the default when no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Message consumed from the queue
    ProcessingMessage,
    /// Start of a balance sync
    BalanceSyncStart,
    /// Balance sync not needed
    BalanceAlreadySynced,
    /// Balance sync skipped
    BalanceSyncSkip,
    /// Financial transaction with an embedded payload
    Transaction,
    /// Outgoing slack notification
    SlackNotification,
    /// Error or failure message
    Error,
    /// Overdraft mention outside a transaction payload
    Overdraft,
    /// Nothing matched
    Other,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Category; 9] = [
        Category::ProcessingMessage,
        Category::BalanceSyncStart,
        Category::BalanceAlreadySynced,
        Category::BalanceSyncSkip,
        Category::Transaction,
        Category::SlackNotification,
        Category::Error,
        Category::Overdraft,
        Category::Other,
    ];

    /// Snake-case name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ProcessingMessage => "processing_message",
            Category::BalanceSyncStart => "balance_sync_start",
            Category::BalanceAlreadySynced => "balance_already_synced",
            Category::BalanceSyncSkip => "balance_sync_skip",
            Category::Transaction => "transaction",
            Category::SlackNotification => "slack_notification",
            Category::Error => "error",
            Category::Overdraft => "overdraft",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A log record with its assigned category
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedRecord {
    pub record: LogRecord,
    pub category: Category,
}

/// A raw line refused by the line structurer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// 1-based position of the line in the source sequence
    pub line_number: usize,

    /// Why the line was refused
    pub reason: RejectReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case::rfc3339_fractional("2024-03-05T10:20:30.123Z", "2024-03-05T10:20:30.123Z")]
    #[case::rfc3339_offset("2024-03-05T12:20:30+02:00", "2024-03-05T10:20:30Z")]
    #[case::naive("2024-01-01T00:00:00", "2024-01-01T00:00:00Z")]
    #[case::naive_fractional("2024-01-01T00:00:00.5", "2024-01-01T00:00:00.500Z")]
    #[case::surrounding_whitespace("  2024-01-01T00:00:00  ", "2024-01-01T00:00:00Z")]
    fn test_parse_known_timestamps(#[case] text: &str, #[case] rendered: &str) {
        let timestamp = LogTimestamp::parse(text);
        assert!(timestamp.is_known());
        assert_eq!(timestamp.to_string(), rendered);
    }

    #[rstest]
    #[case::garbage("not-a-date")]
    #[case::date_only("2024-01-01")]
    #[case::empty("")]
    #[case::bad_month("2024-13-01T00:00:00")]
    fn test_parse_unknown_timestamps(#[case] text: &str) {
        let timestamp = LogTimestamp::parse(text);
        assert_eq!(timestamp, LogTimestamp::Unknown);
        assert_eq!(timestamp.to_string(), "unknown");
    }

    #[test]
    fn test_unknown_sorts_after_known() {
        let early = LogTimestamp::Known(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let late = LogTimestamp::Known(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());

        let mut stamps = vec![LogTimestamp::Unknown, late, early];
        stamps.sort();

        assert_eq!(stamps, vec![early, late, LogTimestamp::Unknown]);
    }

    #[test]
    fn test_category_names_are_unique() {
        let mut names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Category::ALL.len());
    }
}
