//! Fixed-interval retry around a collection job.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};

use crate::config::Config;
use crate::domain::{CollectError, CollectionOutcome, Topic};

/// Delay strategy between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock delay
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt budget and fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// As configured; values below 1 mean a single attempt
    pub max_attempts: i32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: i32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    /// One attempt, no backoff
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retry_max, config.retry_interval())
    }

    /// Attempts that will actually be made
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1) as u32
    }
}

/// Drives a job until it succeeds or the budget is spent.
pub struct RetryController<S: Sleeper> {
    policy: RetryPolicy,
    sleeper: Arc<S>,
}

impl<S: Sleeper> RetryController<S> {
    pub fn new(policy: RetryPolicy, sleeper: Arc<S>) -> Self {
        Self { policy, sleeper }
    }

    /// Run `job` up to `policy.attempts()` times, sleeping `interval` between
    /// failed attempts. Every error kind is retried the same way.
    pub async fn run<F, Fut>(&self, label: &str, mut job: F) -> CollectionOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<Topic>, CollectError>>,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            match job().await {
                Ok(topics) => {
                    info!("[{}] attempt {}/{} succeeded with {} topics", label, attempt, max_attempts, topics.len());
                    return CollectionOutcome::Success {
                        topics,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    warn!("[{}] attempt {}/{} failed ({}): {}", label, attempt, max_attempts, err.kind(), err);
                    if attempt >= max_attempts {
                        return CollectionOutcome::failure(&err, attempt);
                    }
                    info!("[{}] retrying in {}s", label, self.policy.interval.as_secs());
                    self.sleeper.sleep(self.policy.interval).await;
                    attempt += 1;
                }
            }
        }
    }
}
