//! Run orchestration - the daily pipeline's control flow.
//!
//! This module provides:
//! - RunOrchestrator, which gates, collects and publishes one day's report
//! - IdempotencyGate for same-day re-invocation
//! - RunResult for representing what a run did

mod orchestrator;

pub use orchestrator::{IdempotencyGate, RunOrchestrator, RunResult};
