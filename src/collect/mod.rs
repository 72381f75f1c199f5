//! Per-category collection: a bounded agent call wrapped in a retry policy.

pub mod job;
pub mod retry;

pub use job::{CollectionJob, JobSettings, validate_payload};
pub use retry::{RetryController, RetryPolicy, Sleeper, TokioSleeper};
