//! Core search agent trait and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::CollectError;

/// Black-box request/response search capability.
///
/// Returns the agent's raw markdown payload. Timeouts are imposed by the
/// caller, so implementations only report their own failures.
#[async_trait]
pub trait SearchAgent: Send + Sync {
    async fn query(&self, request: &SearchRequest) -> Result<String, CollectError>;
}

/// Everything needed for one agent call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Rendered natural-language prompt
    pub prompt: String,

    /// How many topics the agent is asked for
    pub topics_count: usize,
}

/// One scripted reply for `MockSearchAgent`
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this payload
    Payload(String),
    /// Fail with this error
    Error(CollectError),
    /// Sleep before answering, used to trip the caller's timeout
    Hang(Duration),
}

/// Scripted fake agent.
///
/// Replies are consumed in order; once the script runs out the fallback
/// reply repeats.
pub struct MockSearchAgent {
    script: Mutex<VecDeque<MockResponse>>,
    fallback: MockResponse,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockSearchAgent {
    /// Every call returns the same reply
    pub fn always(response: MockResponse) -> Self {
        Self::scripted(Vec::new(), response)
    }

    pub fn scripted(script: Vec<MockResponse>, fallback: MockResponse) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `query` invocations so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_response(&self) -> MockResponse {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl SearchAgent for MockSearchAgent {
    async fn query(&self, request: &SearchRequest) -> Result<String, CollectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        match self.next_response() {
            MockResponse::Payload(payload) => Ok(payload),
            MockResponse::Error(err) => Err(err),
            MockResponse::Hang(duration) => {
                tokio::time::sleep(duration).await;
                Err(CollectError::Agent("mock agent woke after hanging".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SearchRequest {
        SearchRequest {
            prompt: "find things".to_string(),
            topics_count: 3,
        }
    }

    #[tokio::test]
    async fn test_mock_always() {
        let mock = MockSearchAgent::always(MockResponse::Payload("### A\nsummary".into()));
        assert_eq!(mock.query(&request()).await.unwrap(), "### A\nsummary");
        assert_eq!(mock.query(&request()).await.unwrap(), "### A\nsummary");
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_script_then_fallback() {
        let mock = MockSearchAgent::scripted(
            vec![MockResponse::Error(CollectError::Agent("down".into()))],
            MockResponse::Payload("ok".into()),
        );
        assert_eq!(mock.query(&request()).await, Err(CollectError::Agent("down".into())));
        assert_eq!(mock.query(&request()).await, Ok("ok".to_string()));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_records_prompts() {
        let mock = MockSearchAgent::always(MockResponse::Payload(String::new()));
        mock.query(&request()).await.ok();
        assert_eq!(mock.prompts(), vec!["find things".to_string()]);
    }
}
