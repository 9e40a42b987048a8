//! Aggregate result types produced by the financial analyzer

use crate::types::record::LogTimestamp;
use rust_decimal::Decimal;

/// Per-user aggregate over all extracted transactions
///
/// One summary exists per distinct user id; summaries are recomputed on every
/// run and carry no identity across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub user_id: String,

    /// Number of transactions for the user
    pub transaction_count: usize,

    pub credit_count: usize,

    pub debit_count: usize,

    /// Sum of CREDIT amounts
    pub total_credit: Decimal,

    /// Sum of DEBIT amounts
    pub total_debit: Decimal,

    /// Lowest resulting balance seen
    pub min_balance: Decimal,

    /// Highest resulting balance seen
    pub max_balance: Decimal,

    /// Balance after the chronologically last transaction
    ///
    /// Only transactions with a known timestamp are considered; `None` when the
    /// user has none.
    pub current_balance: Option<Decimal>,

    /// Timestamp of the earliest dated transaction
    pub first_transaction: Option<LogTimestamp>,

    /// Timestamp of the latest dated transaction
    pub last_transaction: Option<LogTimestamp>,

    /// At least one of the user's transactions left a negative balance
    pub overdraft_flag: bool,
}

/// Totals across all extracted transactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionStats {
    pub total_count: usize,
    pub credit_count: usize,
    pub debit_count: usize,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub unique_users: usize,
    pub unique_sessions: usize,
}

/// Counts of risky balances across all extracted transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverdraftStats {
    /// Transactions with a negative resulting balance
    pub negative_balance_count: usize,

    /// Transactions with a resulting balance in `[0, threshold)`
    pub low_balance_count: usize,

    /// Distinct users with at least one low-balance transaction
    pub at_risk_users: usize,

    /// Distinct users with at least one overdraft
    pub overdraft_users: usize,
}
