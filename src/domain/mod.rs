//! Domain types for daily-research
//!
//! This module contains the core data model:
//! - Category: a configured subject area with its search query
//! - Topic: one summarized item returned by the search agent
//! - CollectionOutcome: per-category result after retries resolve
//! - DailyReport: ordered per-category outcomes for one date

pub mod category;
pub mod outcome;
pub mod report;
pub mod topic;

pub use category::Category;
pub use outcome::{CollectError, CollectionOutcome, ErrorKind};
pub use report::{DailyReport, ReportEntry, assemble};
pub use topic::Topic;
