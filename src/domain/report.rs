//! Daily report aggregation.

use chrono::NaiveDate;

use super::{Category, CollectionOutcome};

/// One category and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub category: Category,
    pub outcome: CollectionOutcome,
}

/// Aggregated per-category outcomes for one date, in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub entries: Vec<ReportEntry>,
}

impl DailyReport {
    pub fn total_topics(&self) -> usize {
        self.entries.iter().map(|e| e.outcome.topics().len()).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// True when at least one category failed
    pub fn is_partial(&self) -> bool {
        self.failed() > 0
    }

    /// Categories that resolved to a failure, in registry order
    pub fn failed_categories(&self) -> impl Iterator<Item = &Category> {
        self.entries
            .iter()
            .filter(|e| !e.outcome.is_success())
            .map(|e| &e.category)
    }

    /// Report file stem, e.g. `2024-06-01`
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Zip categories with their outcomes, preserving order.
pub fn assemble(date: NaiveDate, categories: &[Category], outcomes: Vec<CollectionOutcome>) -> DailyReport {
    debug_assert_eq!(categories.len(), outcomes.len());
    let entries = categories
        .iter()
        .cloned()
        .zip(outcomes)
        .map(|(category, outcome)| ReportEntry { category, outcome })
        .collect();
    DailyReport { date, entries }
}
