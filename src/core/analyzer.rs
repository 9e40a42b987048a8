//! Financial analyzer
//!
//! Pure derivations over the extracted transaction collection:
//! - overdraft events (`user_balance < 0`)
//! - at-risk events (`0 <= user_balance < threshold`)
//! - per-user summaries, emitted in ascending user id order
//! - transaction and overdraft statistics
//!
//! Nothing here holds state between calls; the same input always yields the
//! same output.

use crate::types::{
    AnalyzerError, Direction, OverdraftStats, Transaction, TransactionStats, UserSummary,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Everything the analyzer derives from one transaction collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialAnalysis {
    /// Transactions with a negative resulting balance, in input order
    pub overdrafts: Vec<Transaction>,

    /// Transactions with a resulting balance in `[0, threshold)`, in input order
    pub at_risk: Vec<Transaction>,

    /// One summary per user, ascending user id
    pub user_summaries: Vec<UserSummary>,

    pub transaction_stats: TransactionStats,

    pub overdraft_stats: OverdraftStats,
}

/// Sort transactions into canonical order
///
/// Ascending timestamp with unknown timestamps last; the sort is stable so ties
/// keep input order.
pub fn sort_canonical(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|tx| tx.timestamp);
}

/// Transactions that overdrew the user's balance
pub fn detect_overdrafts(transactions: &[Transaction]) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.is_overdraft())
        .cloned()
        .collect()
}

/// Transactions that left the balance low but not negative
pub fn detect_at_risk(transactions: &[Transaction], threshold: Decimal) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.is_at_risk(threshold))
        .cloned()
        .collect()
}

fn checked_sum(
    total: Decimal,
    amount: Decimal,
    operation: &str,
    user_id: &str,
) -> Result<Decimal, AnalyzerError> {
    total
        .checked_add(amount)
        .ok_or_else(|| AnalyzerError::arithmetic_overflow(operation, user_id))
}

/// Summarize one user's transactions
///
/// `transactions` must be non-empty, belong to a single user and be in
/// canonical order.
fn summarize_user(
    user_id: &str,
    transactions: &[&Transaction],
) -> Result<UserSummary, AnalyzerError> {
    let mut total_credit = Decimal::ZERO;
    let mut total_debit = Decimal::ZERO;
    let mut credit_count = 0;
    let mut debit_count = 0;
    let mut min_balance = transactions[0].user_balance;
    let mut max_balance = transactions[0].user_balance;

    for tx in transactions {
        match tx.direction {
            Direction::Credit => {
                credit_count += 1;
                total_credit = checked_sum(total_credit, tx.amount, "total_credit", user_id)?;
            }
            Direction::Debit => {
                debit_count += 1;
                total_debit = checked_sum(total_debit, tx.amount, "total_debit", user_id)?;
            }
        }
        min_balance = min_balance.min(tx.user_balance);
        max_balance = max_balance.max(tx.user_balance);
    }

    // Time-ordered view: only dated transactions
    let first_dated = transactions.iter().find(|tx| tx.timestamp.is_known());
    let last_dated = transactions.iter().rev().find(|tx| tx.timestamp.is_known());

    Ok(UserSummary {
        user_id: user_id.to_string(),
        transaction_count: transactions.len(),
        credit_count,
        debit_count,
        total_credit,
        total_debit,
        min_balance,
        max_balance,
        current_balance: last_dated.map(|tx| tx.user_balance),
        first_transaction: first_dated.map(|tx| tx.timestamp),
        last_transaction: last_dated.map(|tx| tx.timestamp),
        overdraft_flag: transactions.iter().any(|tx| tx.is_overdraft()),
    })
}

/// Group transactions by user and summarize each group
///
/// # Errors
///
/// Returns [`AnalyzerError::ArithmeticOverflow`] if a user's credit or debit
/// total overflows.
pub fn summarize_users(transactions: &[Transaction]) -> Result<Vec<UserSummary>, AnalyzerError> {
    let mut groups: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        groups.entry(tx.user_id.as_str()).or_default().push(tx);
    }

    groups
        .into_iter()
        .map(|(user_id, group)| summarize_user(user_id, &group))
        .collect()
}

fn transaction_stats(
    transactions: &[Transaction],
    user_summaries: &[UserSummary],
) -> Result<TransactionStats, AnalyzerError> {
    let mut stats = TransactionStats {
        total_count: transactions.len(),
        unique_users: user_summaries.len(),
        ..TransactionStats::default()
    };

    for summary in user_summaries {
        stats.credit_count += summary.credit_count;
        stats.debit_count += summary.debit_count;
        stats.total_credits = checked_sum(
            stats.total_credits,
            summary.total_credit,
            "total_credits",
            &summary.user_id,
        )?;
        stats.total_debits = checked_sum(
            stats.total_debits,
            summary.total_debit,
            "total_debits",
            &summary.user_id,
        )?;
    }

    stats.unique_sessions = transactions
        .iter()
        .map(|tx| tx.session_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    Ok(stats)
}

fn overdraft_stats(overdrafts: &[Transaction], at_risk: &[Transaction]) -> OverdraftStats {
    let distinct_users = |txs: &[Transaction]| {
        txs.iter()
            .map(|tx| tx.user_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    };

    OverdraftStats {
        negative_balance_count: overdrafts.len(),
        low_balance_count: at_risk.len(),
        at_risk_users: distinct_users(at_risk),
        overdraft_users: distinct_users(overdrafts),
    }
}

/// Run every financial derivation over a transaction collection
///
/// # Arguments
///
/// * `transactions` - Extracted transactions in canonical order
/// * `at_risk_threshold` - Upper (exclusive) bound of the at-risk balance range
///
/// # Errors
///
/// Returns [`AnalyzerError::ArithmeticOverflow`] if an aggregate overflows.
pub fn analyze(
    transactions: &[Transaction],
    at_risk_threshold: Decimal,
) -> Result<FinancialAnalysis, AnalyzerError> {
    let overdrafts = detect_overdrafts(transactions);
    let at_risk = detect_at_risk(transactions, at_risk_threshold);
    let user_summaries = summarize_users(transactions)?;
    let transaction_stats = transaction_stats(transactions, &user_summaries)?;
    let overdraft_stats = overdraft_stats(&overdrafts, &at_risk);

    Ok(FinancialAnalysis {
        overdrafts,
        at_risk,
        user_summaries,
        transaction_stats,
        overdraft_stats,
    })
}
