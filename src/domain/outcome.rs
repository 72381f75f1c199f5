//! Collection outcome types.
//!
//! `CollectError` classifies a single failed attempt; `CollectionOutcome` is
//! what a category resolves to once the retry budget is spent or an attempt
//! succeeds.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Topic;

/// Failure classification shared by every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Agent call exceeded its bound
    Timeout,
    /// Agent reported failure or was unreachable
    AgentError,
    /// Agent returned an unparseable or invalid-shaped payload
    MalformedResult,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::AgentError => "agent_error",
            ErrorKind::MalformedResult => "malformed_result",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure of one collection attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    #[error("agent call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("malformed result: {0}")]
    Malformed(String),
}

impl CollectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectError::Timeout(_) => ErrorKind::Timeout,
            CollectError::Agent(_) => ErrorKind::AgentError,
            CollectError::Malformed(_) => ErrorKind::MalformedResult,
        }
    }
}

/// Per-category result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// An attempt produced a valid topic list
    Success { topics: Vec<Topic>, attempts: u32 },
    /// Every attempt failed; carries the last failure
    Failure {
        reason: ErrorKind,
        detail: String,
        attempts: u32,
    },
}

impl CollectionOutcome {
    pub fn failure(error: &CollectError, attempts: u32) -> Self {
        CollectionOutcome::Failure {
            reason: error.kind(),
            detail: error.to_string(),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CollectionOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            CollectionOutcome::Success { attempts, .. } | CollectionOutcome::Failure { attempts, .. } => *attempts,
        }
    }

    /// Topics collected; empty for a failure
    pub fn topics(&self) -> &[Topic] {
        match self {
            CollectionOutcome::Success { topics, .. } => topics,
            CollectionOutcome::Failure { .. } => &[],
        }
    }

    pub fn reason(&self) -> Option<ErrorKind> {
        match self {
            CollectionOutcome::Success { .. } => None,
            CollectionOutcome::Failure { reason, .. } => Some(*reason),
        }
    }
}
