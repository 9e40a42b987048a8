//! Transaction extractor
//!
//! Pulls a typed [`Transaction`] out of the free-text payload of a
//! `transaction`-category record.
//!
//! The payload looks like JSON but is not guaranteed to be valid JSON: keys may
//! be unquoted, values may be quoted numbers, and arbitrary text may follow the
//! closing brace. Each field is therefore located independently with its own
//! pattern, which tolerates surrounding noise and any key order.
//!
//! Extraction is all-or-nothing. The required fields are checked in the order
//! `userId`, `amount`, `type`, `userBalance`; the first one that is missing or
//! cannot be coerced becomes the failure reason and no transaction is emitted.

use crate::core::categorizer::CategorizedBatch;
use crate::types::{
    CategorizedRecord, Category, Direction, ExtractionError, ExtractionFailure, LogRecord,
    Transaction, TransactionField,
};
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

/// Build the lookup pattern for one payload key
///
/// Matches `key: value`, `"key": value`, `"key":"value"` and so on. The key must
/// not be the tail of a longer identifier (`txType` does not match `type`).
/// The value is either double-quoted or a bare token ending at whitespace, `,`,
/// `}` or `]`.
fn field_pattern(key: &str) -> Regex {
    Regex::new(&format!(
        r#"(?:^|[^A-Za-z0-9_$])(?P<key>"?{}"?)\s*:\s*(?:"(?P<quoted>[^"]*)"|(?P<bare>[^\s,}}\]"]+))"#,
        regex::escape(key)
    ))
    .unwrap()
}

static USER_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("userId"));
static AMOUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("amount"));
static TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("type"));
static USER_BALANCE_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("userBalance"));
static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("id"));
static SOURCE_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("source"));
static ACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("action"));
static VAT_REGEX: LazyLock<Regex> = LazyLock::new(|| field_pattern("vat"));

fn pattern_for(field: TransactionField) -> &'static Regex {
    match field {
        TransactionField::UserId => &USER_ID_REGEX,
        TransactionField::Amount => &AMOUNT_REGEX,
        TransactionField::Type => &TYPE_REGEX,
        TransactionField::UserBalance => &USER_BALANCE_REGEX,
        TransactionField::Id => &ID_REGEX,
        TransactionField::Source => &SOURCE_REGEX,
        TransactionField::Action => &ACTION_REGEX,
        TransactionField::Vat => &VAT_REGEX,
    }
}

/// JSON-style number: optional minus, digits, optional fraction and exponent
static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?$").unwrap());

/// Whether byte offset `pos` lies inside a double-quoted string
///
/// Quotes escaped with a backslash do not open or close a string.
fn inside_string(message: &str, pos: usize) -> bool {
    let mut inside = false;
    let mut escaped = false;
    for byte in &message.as_bytes()[..pos] {
        match byte {
            _ if escaped => escaped = false,
            b'\\' if inside => escaped = true,
            b'"' => inside = !inside,
            _ => {}
        }
    }
    inside
}

/// Locate the raw value of `field` in a payload
///
/// Returns the first occurrence whose key is not part of a quoted string
/// value, unquoted. `None` when the key is absent.
pub fn locate_field(message: &str, field: TransactionField) -> Option<&str> {
    let pattern = pattern_for(field);
    let mut from = 0;

    while let Some(captures) = pattern.captures_at(message, from) {
        let key = captures.name("key")?;
        if inside_string(message, key.start()) {
            // Keys are ASCII, so the next byte is a char boundary
            from = key.start() + 1;
            continue;
        }
        return captures
            .name("quoted")
            .or_else(|| captures.name("bare"))
            .map(|m| m.as_str());
    }

    None
}

/// Parse a decimal in plain or scientific notation
///
/// Only JSON-style numbers are accepted: no leading `+`, no digit separators.
fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if !NUMBER_REGEX.is_match(value) {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn require(message: &str, field: TransactionField) -> Result<&str, ExtractionError> {
    locate_field(message, field).ok_or(ExtractionError::MissingField { field })
}

fn invalid(field: TransactionField, value: &str) -> ExtractionError {
    ExtractionError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn optional_text(message: &str, field: TransactionField) -> Option<String> {
    locate_field(message, field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Extract a transaction from a single record
///
/// The record's category is not checked here; callers pass only
/// `transaction`-category records.
///
/// # Errors
///
/// Returns the first required field that is missing or invalid:
/// - `userId` must be non-empty
/// - `amount` must be a non-negative decimal
/// - `type` must be CREDIT or DEBIT (case-insensitive)
/// - `userBalance` must be a decimal (negative allowed)
pub fn extract_transaction(record: &LogRecord) -> Result<Transaction, ExtractionError> {
    let message = record.message.as_str();

    let raw_user_id = require(message, TransactionField::UserId)?;
    let user_id = raw_user_id.trim();
    if user_id.is_empty() {
        return Err(invalid(TransactionField::UserId, raw_user_id));
    }

    let raw_amount = require(message, TransactionField::Amount)?;
    let amount = parse_decimal(raw_amount)
        .filter(|amount| *amount >= Decimal::ZERO)
        .ok_or_else(|| invalid(TransactionField::Amount, raw_amount))?;

    let raw_type = require(message, TransactionField::Type)?;
    let direction =
        Direction::parse(raw_type).ok_or_else(|| invalid(TransactionField::Type, raw_type))?;

    let raw_balance = require(message, TransactionField::UserBalance)?;
    let user_balance = parse_decimal(raw_balance)
        .ok_or_else(|| invalid(TransactionField::UserBalance, raw_balance))?;

    Ok(Transaction {
        user_id: user_id.to_string(),
        amount,
        direction,
        user_balance,
        timestamp: record.timestamp,
        session_id: record.session_id.clone(),
        line_number: record.line_number,
        transaction_id: optional_text(message, TransactionField::Id),
        source: optional_text(message, TransactionField::Source),
        action: optional_text(message, TransactionField::Action),
        vat: locate_field(message, TransactionField::Vat).and_then(parse_decimal),
    })
}

/// Per-field extraction failure counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureCounts {
    counts: BTreeMap<TransactionField, usize>,
}

impl FailureCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: TransactionField, count: usize) {
        if count > 0 {
            *self.counts.entry(field).or_insert(0) += count;
        }
    }

    pub fn get(&self, field: TransactionField) -> usize {
        self.counts.get(&field).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Count for every required field, in check order (zeros included)
    pub fn by_required_field(&self) -> Vec<(TransactionField, usize)> {
        TransactionField::REQUIRED
            .iter()
            .map(|field| (*field, self.get(*field)))
            .collect()
    }
}

impl<'a> FromIterator<&'a ExtractionFailure> for FailureCounts {
    fn from_iter<I: IntoIterator<Item = &'a ExtractionFailure>>(iter: I) -> Self {
        let mut counts = FailureCounts::new();
        for failure in iter {
            counts.add(failure.field(), 1);
        }
        counts
    }
}

/// Transactions and failures for a sequence of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionBatch {
    /// Records with category `transaction` that were examined
    pub examined: usize,

    /// Extracted transactions, in input order
    pub transactions: Vec<Transaction>,

    /// Failed records, in input order
    pub failures: Vec<ExtractionFailure>,
}

impl ExtractionBatch {
    pub fn failure_counts(&self) -> FailureCounts {
        self.failures.iter().collect()
    }
}

/// Extract transactions from every `transaction`-category record
///
/// Records of any other category are ignored. For each examined record exactly
/// one of `transactions` or `failures` grows by one.
pub fn extract_all(records: &[CategorizedRecord]) -> ExtractionBatch {
    let mut batch = ExtractionBatch::default();

    for categorized in records
        .iter()
        .filter(|categorized| categorized.category == Category::Transaction)
    {
        batch.examined += 1;
        let record = &categorized.record;

        match extract_transaction(record) {
            Ok(transaction) => batch.transactions.push(transaction),
            Err(error) => {
                log::debug!("Line {}: extraction failed: {}", record.line_number, error);
                batch.failures.push(ExtractionFailure {
                    line_number: record.line_number,
                    timestamp: record.timestamp,
                    session_id: record.session_id.clone(),
                    error,
                });
            }
        }
    }

    batch
}

/// Convenience wrapper over [`extract_all`] for a categorized batch
pub fn extract_batch(batch: &CategorizedBatch) -> ExtractionBatch {
    extract_all(&batch.records)
}
