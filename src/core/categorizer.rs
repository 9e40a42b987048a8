//! Message categorizer
//!
//! Assigns every [`LogRecord`] to exactly one [`Category`] by evaluating an
//! ordered rule list against the lower-cased message. The first matching rule
//! wins; when nothing matches the category is [`Category::Other`].
//!
//! Rule order is part of the contract: keyword sets overlap (a transaction
//! payload can mention a failure, an error message can mention an overdraft), so
//! earlier rules take priority over later ones regardless of specificity.

use crate::types::{CategorizedRecord, Category, LogRecord};
use std::collections::BTreeMap;

/// Keyword predicate over a lower-cased message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// At least one keyword is contained in the message
    Any(&'static [&'static str]),

    /// Every keyword is contained in the message
    All(&'static [&'static str]),
}

impl Matcher {
    /// Test the matcher against an already lower-cased message
    pub fn matches(&self, message_lower: &str) -> bool {
        match self {
            Matcher::Any(keywords) => keywords.iter().any(|k| message_lower.contains(k)),
            Matcher::All(keywords) => keywords.iter().all(|k| message_lower.contains(k)),
        }
    }
}

/// One entry of the ordered rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,
    pub matcher: Matcher,
}

/// Default rules, highest priority first
///
/// Keywords must be lower case.
pub const DEFAULT_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Transaction,
        matcher: Matcher::All(&["transaction", "{"]),
    },
    CategoryRule {
        category: Category::ProcessingMessage,
        matcher: Matcher::Any(&["processing message"]),
    },
    CategoryRule {
        category: Category::BalanceSyncStart,
        matcher: Matcher::Any(&["start syncing the balance"]),
    },
    CategoryRule {
        category: Category::BalanceAlreadySynced,
        matcher: Matcher::Any(&["balance is already synced"]),
    },
    CategoryRule {
        category: Category::BalanceSyncSkip,
        matcher: Matcher::Any(&["skipping the balance sync"]),
    },
    CategoryRule {
        category: Category::SlackNotification,
        matcher: Matcher::Any(&["sending slack notification"]),
    },
    CategoryRule {
        category: Category::Error,
        matcher: Matcher::Any(&["error", "failed"]),
    },
    CategoryRule {
        category: Category::Overdraft,
        matcher: Matcher::Any(&["overdraft"]),
    },
];

/// Category → count table produced alongside categorization
///
/// Backed by an ordered map so iteration (and every report built from it) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFrequency {
    counts: BTreeMap<Category, usize>,
}

impl CategoryFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record for `category`
    pub fn record(&mut self, category: Category) {
        self.add(category, 1);
    }

    /// Add `count` records for `category`
    pub fn add(&mut self, category: Category, count: usize) {
        if count > 0 {
            *self.counts.entry(category).or_insert(0) += count;
        }
    }

    /// Combine two tables
    ///
    /// Addition is commutative and associative, so partial tables built on
    /// different batches can be merged in any order.
    pub fn merge(&mut self, other: &CategoryFrequency) {
        for (category, count) in &other.counts {
            self.add(*category, *count);
        }
    }

    pub fn get(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Total number of categorized records
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Categories with a non-zero count, most frequent first
    ///
    /// Ties are ordered by category declaration order.
    pub fn ranked(&self) -> Vec<(Category, usize)> {
        let mut ranked: Vec<(Category, usize)> =
            self.counts.iter().map(|(c, n)| (*c, *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

/// Categorized records plus their frequency table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedBatch {
    pub records: Vec<CategorizedRecord>,
    pub frequency: CategoryFrequency,
}

/// Rule-list categorizer
#[derive(Debug, Clone, Copy)]
pub struct Categorizer {
    rules: &'static [CategoryRule],
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(DEFAULT_RULES)
    }
}

impl Categorizer {
    /// Create a categorizer over a custom rule list
    pub fn new(rules: &'static [CategoryRule]) -> Self {
        Self { rules }
    }

    /// Categorize a message text
    pub fn categorize_message(&self, message: &str) -> Category {
        let message_lower = message.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(&message_lower))
            .map(|rule| rule.category)
            .unwrap_or(Category::Other)
    }

    /// Categorize a record
    pub fn categorize(&self, record: &LogRecord) -> Category {
        self.categorize_message(&record.message)
    }

    /// Categorize every record, consuming them
    pub fn categorize_all(&self, records: Vec<LogRecord>) -> CategorizedBatch {
        let mut batch = CategorizedBatch {
            records: Vec::with_capacity(records.len()),
            frequency: CategoryFrequency::new(),
        };

        for record in records {
            let category = self.categorize(&record);
            batch.frequency.record(category);
            batch.records.push(CategorizedRecord { record, category });
        }

        batch
    }
}
