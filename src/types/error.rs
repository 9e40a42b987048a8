//! Error types for the balance log analyzer
//!
//! This module defines every error that can occur while analyzing log files.
//!
//! # Error Categories
//!
//! - **Fatal errors** ([`AnalyzerError`]): missing source directory, no log files,
//!   no lines surviving the severity filter, I/O and CSV output failures,
//!   arithmetic overflow during aggregation. These abort the run before any
//!   output is written.
//! - **Structural rejections** ([`RejectReason`]): a line that does not fit the
//!   expected tab-delimited layout. Recoverable: the line is dropped and counted.
//! - **Extraction failures** ([`ExtractionError`]): a transaction payload with a
//!   missing or non-coercible required field. Recoverable: no transaction is
//!   emitted and the failing field is recorded.

use crate::types::transaction::TransactionField;
use thiserror::Error;

/// Fatal error for an analysis run
///
/// Each variant includes enough context to be printed directly to the operator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyzerError {
    /// The source directory does not exist
    #[error("Source directory not found: {path}")]
    SourceNotFound {
        /// The path that was not found
        path: String,
    },

    /// The source directory holds no files with the expected extension
    #[error("No '.{extension}' log files found under {path}")]
    NoLogFiles {
        /// The directory that was searched
        path: String,
        /// The extension that was searched for
        extension: String,
    },

    /// Every line was filtered out by the severity marker
    #[error("No log lines containing '{marker}' were found")]
    NoMatchingLines {
        /// The severity marker used for filtering
        marker: String,
    },

    /// I/O error occurred while reading sources or writing tables
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV serialization error occurred while writing a table
    #[error("CSV write error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    CsvError {
        /// Output line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the CSV error
        message: String,
    },

    /// Arithmetic overflow would occur while aggregating amounts
    #[error("Arithmetic overflow in {operation} for user {user_id}")]
    ArithmeticOverflow {
        /// Aggregate that would overflow
        operation: String,
        /// User whose transactions were being aggregated
        user_id: String,
    },

    /// The async runtime could not be created or a worker task failed
    #[error("Runtime error: {message}")]
    RuntimeError {
        /// Description of the runtime failure
        message: String,
    },
}

impl From<std::io::Error> for AnalyzerError {
    fn from(error: std::io::Error) -> Self {
        AnalyzerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for AnalyzerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        AnalyzerError::CsvError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for AnalyzerError {
    fn from(error: csv_async::Error) -> Self {
        AnalyzerError::CsvError {
            line: None,
            message: error.to_string(),
        }
    }
}

impl AnalyzerError {
    /// Create a SourceNotFound error
    pub fn source_not_found(path: &std::path::Path) -> Self {
        AnalyzerError::SourceNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create a NoLogFiles error
    pub fn no_log_files(path: &std::path::Path, extension: &str) -> Self {
        AnalyzerError::NoLogFiles {
            path: path.display().to_string(),
            extension: extension.to_string(),
        }
    }

    /// Create a NoMatchingLines error
    pub fn no_matching_lines(marker: &str) -> Self {
        AnalyzerError::NoMatchingLines {
            marker: marker.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user_id: &str) -> Self {
        AnalyzerError::ArithmeticOverflow {
            operation: operation.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

/// Why the line structurer refused a raw line
///
/// Both variants are reported as an "unparseable layout"; the variant itself is
/// kept for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Fewer than four tab-delimited segments
    #[error("unparseable layout: expected at least 4 tab-delimited fields, found {found}")]
    TooFewFields {
        /// Number of segments found
        found: usize,
    },

    /// Timestamp, session id or message type is empty or contains whitespace
    #[error("unparseable layout: malformed leading fields")]
    MalformedHeader,
}

/// Why a transaction-category record produced no transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The field's key was not found in the payload
    #[error("missing field '{field}'")]
    MissingField {
        /// The missing field
        field: TransactionField,
    },

    /// The field was found but its value could not be coerced
    #[error("invalid value '{value}' for field '{field}'")]
    InvalidField {
        /// The field whose value was rejected
        field: TransactionField,
        /// The raw value as found in the payload
        value: String,
    },
}

impl ExtractionError {
    /// The payload field this failure is attributed to
    pub fn field(&self) -> TransactionField {
        match self {
            ExtractionError::MissingField { field } => *field,
            ExtractionError::InvalidField { field, .. } => *field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case::source_not_found(
        AnalyzerError::SourceNotFound { path: "/logs".to_string() },
        "Source directory not found: /logs"
    )]
    #[case::no_log_files(
        AnalyzerError::NoLogFiles { path: "/logs".to_string(), extension: "gz".to_string() },
        "No '.gz' log files found under /logs"
    )]
    #[case::no_matching_lines(
        AnalyzerError::NoMatchingLines { marker: "INFO".to_string() },
        "No log lines containing 'INFO' were found"
    )]
    #[case::io_error(
        AnalyzerError::IoError { message: "Permission denied".to_string() },
        "I/O error: Permission denied"
    )]
    #[case::csv_error_with_line(
        AnalyzerError::CsvError { line: Some(3), message: "bad".to_string() },
        "CSV write error at line 3: bad"
    )]
    #[case::csv_error_without_line(
        AnalyzerError::CsvError { line: None, message: "bad".to_string() },
        "CSV write error: bad"
    )]
    #[case::arithmetic_overflow(
        AnalyzerError::ArithmeticOverflow { operation: "total_credit".to_string(), user_id: "u1".to_string() },
        "Arithmetic overflow in total_credit for user u1"
    )]
    fn test_error_display(#[case] error: AnalyzerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::source_not_found(
        AnalyzerError::source_not_found(Path::new("/logs")),
        AnalyzerError::SourceNotFound { path: "/logs".to_string() }
    )]
    #[case::no_log_files(
        AnalyzerError::no_log_files(Path::new("/logs"), "gz"),
        AnalyzerError::NoLogFiles { path: "/logs".to_string(), extension: "gz".to_string() }
    )]
    #[case::arithmetic_overflow(
        AnalyzerError::arithmetic_overflow("total_debit", "u9"),
        AnalyzerError::ArithmeticOverflow { operation: "total_debit".to_string(), user_id: "u9".to_string() }
    )]
    fn test_helper_functions(#[case] result: AnalyzerError, #[case] expected: AnalyzerError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: AnalyzerError = io_error.into();
        assert!(matches!(error, AnalyzerError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }

    #[rstest]
    #[case::too_few_fields(
        RejectReason::TooFewFields { found: 2 },
        "unparseable layout: expected at least 4 tab-delimited fields, found 2"
    )]
    #[case::malformed_header(
        RejectReason::MalformedHeader,
        "unparseable layout: malformed leading fields"
    )]
    fn test_reject_reason_display(#[case] reason: RejectReason, #[case] expected: &str) {
        assert_eq!(reason.to_string(), expected);
    }

    #[rstest]
    #[case::missing(
        ExtractionError::MissingField { field: TransactionField::UserBalance },
        TransactionField::UserBalance,
        "missing field 'userBalance'"
    )]
    #[case::invalid(
        ExtractionError::InvalidField { field: TransactionField::Amount, value: "abc".to_string() },
        TransactionField::Amount,
        "invalid value 'abc' for field 'amount'"
    )]
    fn test_extraction_error_field_and_display(
        #[case] error: ExtractionError,
        #[case] field: TransactionField,
        #[case] expected: &str,
    ) {
        assert_eq!(error.field(), field);
        assert_eq!(error.to_string(), expected);
    }
}
