//! Line structurer
//!
//! Turns one raw log line into a [`LogRecord`] or a [`Rejection`].
//!
//! The service writes tab-delimited lines:
//!
//! ```text
//! <timestamp> \t <session id> \t <message type> \t <message ...>
//! ```
//!
//! The message may itself contain tabs, so the line is split into at most four
//! segments and the fourth keeps everything after the third tab.

use crate::types::{LogRecord, LogTimestamp, RejectReason, Rejection};
use regex::Regex;
use std::sync::LazyLock;

/// Minimum number of tab-delimited segments in a well-formed line
pub const MIN_FIELDS: usize = 4;

/// Layout of the three leading fields: non-empty tokens without whitespace
static LEADING_FIELDS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<timestamp>\S+)\t(?P<session_id>\S+)\t(?P<message_type>\S+)$").unwrap()
});

/// Structured records and rejections for a sequence of lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredBatch {
    /// Records in input order
    pub records: Vec<LogRecord>,

    /// Rejected lines in input order
    pub rejections: Vec<Rejection>,
}

impl StructuredBatch {
    /// Records whose timestamp could not be parsed
    pub fn unknown_timestamps(&self) -> usize {
        self.records
            .iter()
            .filter(|record| !record.timestamp.is_known())
            .count()
    }
}

/// Structure a single raw line
///
/// # Arguments
///
/// * `line_number` - 1-based position of the line in the source sequence
/// * `raw` - The raw line (already filtered to the severity marker)
///
/// # Errors
///
/// * [`RejectReason::TooFewFields`] if the line has fewer than four tab-delimited segments
/// * [`RejectReason::MalformedHeader`] if a leading field is empty or contains whitespace
pub fn structure_line(line_number: usize, raw: &str) -> Result<LogRecord, RejectReason> {
    let segments: Vec<&str> = raw.splitn(MIN_FIELDS, '\t').collect();
    if segments.len() < MIN_FIELDS {
        return Err(RejectReason::TooFewFields {
            found: segments.len(),
        });
    }

    let leading = format!(
        "{}\t{}\t{}",
        segments[0].trim(),
        segments[1].trim(),
        segments[2].trim()
    );
    let captures = LEADING_FIELDS_REGEX
        .captures(&leading)
        .ok_or(RejectReason::MalformedHeader)?;

    Ok(LogRecord {
        line_number,
        timestamp: LogTimestamp::parse(&captures["timestamp"]),
        session_id: captures["session_id"].to_string(),
        message_type: captures["message_type"].to_string(),
        message: segments[3].trim().to_string(),
        raw: raw.to_string(),
    })
}

/// Structure a sequence of lines
///
/// Every line yields exactly one record or exactly one rejection.
///
/// # Arguments
///
/// * `first_line_number` - Line number of `lines[0]`; later lines count up from it
/// * `lines` - Raw lines in source order
pub fn structure_lines(first_line_number: usize, lines: &[String]) -> StructuredBatch {
    let mut batch = StructuredBatch::default();

    for (offset, raw) in lines.iter().enumerate() {
        let line_number = first_line_number + offset;
        match structure_line(line_number, raw) {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                log::debug!("Line {} rejected: {}", line_number, reason);
                batch.rejections.push(Rejection {
                    line_number,
                    reason,
                });
            }
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_structure_line_splits_fields() {
        let raw = "2024-01-01T00:00:00.000Z\tSESS1\tINFO\tProcessing message 42";
        let record = structure_line(7, raw).unwrap();

        assert_eq!(record.line_number, 7);
        assert!(record.timestamp.is_known());
        assert_eq!(record.session_id, "SESS1");
        assert_eq!(record.message_type, "INFO");
        assert_eq!(record.message, "Processing message 42");
        assert_eq!(record.raw, raw);
    }

    #[test]
    fn test_message_keeps_embedded_tabs() {
        let raw = "2024-01-01T00:00:00Z\tS\tINFO\tpart one\tpart two\tthree";
        let record = structure_line(1, raw).unwrap();
        assert_eq!(record.message, "part one\tpart two\tthree");
    }

    #[test]
    fn test_empty_message_is_allowed() {
        let record = structure_line(1, "2024-01-01T00:00:00Z\tS\tINFO\t").unwrap();
        assert_eq!(record.message, "");
    }

    #[test]
    fn test_unparseable_timestamp_keeps_record() {
        let record = structure_line(1, "yesterday\tS\tINFO\thello").unwrap();
        assert_eq!(record.timestamp, LogTimestamp::Unknown);
        assert_eq!(record.message, "hello");
    }

    #[rstest]
    #[case::single_field("just some text", 1)]
    #[case::two_fields("2024-01-01T00:00:00Z\tSESS1", 2)]
    #[case::three_fields("2024-01-01T00:00:00Z\tSESS1\tINFO", 3)]
    #[case::empty("", 1)]
    fn test_too_few_fields_rejected(#[case] raw: &str, #[case] found: usize) {
        assert_eq!(
            structure_line(1, raw),
            Err(RejectReason::TooFewFields { found })
        );
    }

    #[rstest]
    #[case::empty_session("2024-01-01T00:00:00Z\t\tINFO\tmsg")]
    #[case::empty_timestamp("\tS\tINFO\tmsg")]
    #[case::space_in_session("2024-01-01T00:00:00Z\tSESS 1\tINFO\tmsg")]
    #[case::blank_type("2024-01-01T00:00:00Z\tS\t  \tmsg")]
    fn test_malformed_header_rejected(#[case] raw: &str) {
        assert_eq!(structure_line(1, raw), Err(RejectReason::MalformedHeader));
    }

    #[test]
    fn test_structure_lines_counts_each_rejection_once() {
        let lines = vec![
            "2024-01-01T00:00:00Z\tA\tINFO\tfirst".to_string(),
            "broken\tline".to_string(),
            "2024-01-01T00:00:01Z\tB\tINFO\tsecond".to_string(),
            "x".to_string(),
        ];

        let batch = structure_lines(1, &lines);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejections.len(), 2);
        assert_eq!(batch.records[0].line_number, 1);
        assert_eq!(batch.records[1].line_number, 3);
        assert_eq!(batch.rejections[0].line_number, 2);
        assert_eq!(batch.rejections[1].line_number, 4);
    }

    #[test]
    fn test_structure_lines_respects_first_line_number() {
        let lines = vec!["2024-01-01T00:00:00Z\tA\tINFO\tmsg".to_string()];
        let batch = structure_lines(1001, &lines);
        assert_eq!(batch.records[0].line_number, 1001);
    }

    #[test]
    fn test_unknown_timestamps_counted() {
        let lines = vec![
            "2024-01-01T00:00:00Z\tA\tINFO\tmsg".to_string(),
            "nope\tB\tINFO\tmsg".to_string(),
        ];
        let batch = structure_lines(1, &lines);
        assert_eq!(batch.unknown_timestamps(), 1);
    }
}
