//! Transaction-related types
//!
//! This module defines the typed transaction extracted from a log payload, its
//! direction, the payload fields the extractor looks for, and the failure
//! record kept when extraction does not succeed.

use crate::types::error::ExtractionError;
use crate::types::record::LogTimestamp;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Transaction direction
///
/// The direction carries the sign semantics; amounts are always stored as
/// non-negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Increases the user's balance
    Credit,

    /// Decreases the user's balance
    Debit,
}

impl Direction {
    /// Parse a payload `type` value
    ///
    /// Case-insensitive after trimming; anything other than CREDIT or DEBIT is
    /// rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "CREDIT" => Some(Direction::Credit),
            "DEBIT" => Some(Direction::Debit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "CREDIT",
            Direction::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload fields looked up by the transaction extractor
///
/// The first four are required; the rest are recovered when present and never
/// cause a record to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransactionField {
    UserId,
    Amount,
    Type,
    UserBalance,
    Id,
    Source,
    Action,
    Vat,
}

impl TransactionField {
    /// Required fields, in the order they are checked
    pub const REQUIRED: [TransactionField; 4] = [
        TransactionField::UserId,
        TransactionField::Amount,
        TransactionField::Type,
        TransactionField::UserBalance,
    ];

    /// The key as it appears in the payload
    pub fn key(&self) -> &'static str {
        match self {
            TransactionField::UserId => "userId",
            TransactionField::Amount => "amount",
            TransactionField::Type => "type",
            TransactionField::UserBalance => "userBalance",
            TransactionField::Id => "id",
            TransactionField::Source => "source",
            TransactionField::Action => "action",
            TransactionField::Vat => "vat",
        }
    }
}

impl fmt::Display for TransactionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A financial transaction extracted from a log line
///
/// Only created when all four required payload fields were located and
/// coerced. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The user the transaction applies to
    pub user_id: String,

    /// Transaction amount, always non-negative
    pub amount: Decimal,

    /// Credit or debit
    pub direction: Direction,

    /// Balance after the transaction; negative values signal an overdraft
    pub user_balance: Decimal,

    /// Timestamp of the originating log record
    pub timestamp: LogTimestamp,

    /// Session of the originating log record
    pub session_id: String,

    /// Position of the originating line in the source sequence
    pub line_number: usize,

    /// Payload `id`, when present
    pub transaction_id: Option<String>,

    /// Payload `source`, when present
    pub source: Option<String>,

    /// Payload `action`, when present
    pub action: Option<String>,

    /// Payload `vat`, when present and numeric
    pub vat: Option<Decimal>,
}

impl Transaction {
    /// Resulting balance is negative
    pub fn is_overdraft(&self) -> bool {
        self.user_balance < Decimal::ZERO
    }

    /// Resulting balance is in `[0, threshold)`
    pub fn is_at_risk(&self, threshold: Decimal) -> bool {
        self.user_balance >= Decimal::ZERO && self.user_balance < threshold
    }
}

/// A transaction-category record for which no transaction was produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    /// Position of the originating line in the source sequence
    pub line_number: usize,

    /// Timestamp of the originating log record
    pub timestamp: LogTimestamp,

    /// Session of the originating log record
    pub session_id: String,

    /// The first required field that could not be extracted
    pub error: ExtractionError,
}

impl ExtractionFailure {
    pub fn field(&self) -> TransactionField {
        self.error.field()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn transaction_with_balance(balance: Decimal) -> Transaction {
        Transaction {
            user_id: "u1".to_string(),
            amount: Decimal::new(50, 0),
            direction: Direction::Debit,
            user_balance: balance,
            timestamp: LogTimestamp::Unknown,
            session_id: "S".to_string(),
            line_number: 1,
            transaction_id: None,
            source: None,
            action: None,
            vat: None,
        }
    }

    #[rstest]
    #[case("CREDIT", Some(Direction::Credit))]
    #[case("debit", Some(Direction::Debit))]
    #[case("  Credit ", Some(Direction::Credit))]
    #[case("REFUND", None)]
    #[case("", None)]
    fn test_direction_parse(#[case] value: &str, #[case] expected: Option<Direction>) {
        assert_eq!(Direction::parse(value), expected);
    }

    #[rstest]
    #[case::negative(Decimal::new(-5, 0), true, false)]
    #[case::just_below_zero(Decimal::new(-1, 4), true, false)]
    #[case::zero(Decimal::ZERO, false, true)]
    #[case::low(Decimal::new(999, 2), false, true)]
    #[case::at_threshold(Decimal::new(10, 0), false, false)]
    #[case::healthy(Decimal::new(250, 0), false, false)]
    fn test_overdraft_and_at_risk_are_exclusive(
        #[case] balance: Decimal,
        #[case] overdraft: bool,
        #[case] at_risk: bool,
    ) {
        let tx = transaction_with_balance(balance);
        let threshold = Decimal::new(10, 0);

        assert_eq!(tx.is_overdraft(), overdraft);
        assert_eq!(tx.is_at_risk(threshold), at_risk);
        assert!(!(tx.is_overdraft() && tx.is_at_risk(threshold)));
    }

    #[test]
    fn test_field_keys_match_payload_names() {
        let keys: Vec<&str> = TransactionField::REQUIRED
            .iter()
            .map(TransactionField::key)
            .collect();
        assert_eq!(keys, vec!["userId", "amount", "type", "userBalance"]);
    }
}
