//! Collection job: one bounded agent call for one category.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::agent::{PromptTemplate, SearchAgent, SearchRequest, parse_topics};
use crate::domain::{Category, CollectError, Topic};

/// Settings for a collection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSettings {
    pub topics_per_category: usize,
    pub timeout: Duration,
}

/// Invokes the search agent for one category and classifies the result.
pub struct CollectionJob<A: SearchAgent> {
    agent: Arc<A>,
    prompt: PromptTemplate,
    settings: JobSettings,
}

impl<A: SearchAgent> CollectionJob<A> {
    pub fn new(agent: Arc<A>, prompt: PromptTemplate, settings: JobSettings) -> Self {
        Self { agent, prompt, settings }
    }

    /// Render the day's prompt for `category`. Not retried on failure.
    pub fn request(&self, category: &Category, date: NaiveDate) -> crate::error::Result<SearchRequest> {
        let prompt = self.prompt.render(category, date, self.settings.topics_per_category)?;
        Ok(SearchRequest {
            prompt,
            topics_count: self.settings.topics_per_category,
        })
    }

    /// Single attempt.
    ///
    /// A timeout is reported as `Timeout`, never folded into `AgentError`.
    /// The payload must parse into 1..=topics_per_category topics.
    pub async fn attempt(&self, request: &SearchRequest) -> Result<Vec<Topic>, CollectError> {
        log::debug!("querying agent (timeout {}s)", self.settings.timeout.as_secs());

        let raw = match tokio::time::timeout(self.settings.timeout, self.agent.query(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(CollectError::Timeout(self.settings.timeout)),
        };

        validate_payload(&raw, self.settings.topics_per_category)
    }
}

/// Parse and shape-check an agent payload.
pub fn validate_payload(raw: &str, topics_per_category: usize) -> Result<Vec<Topic>, CollectError> {
    if raw.trim().is_empty() {
        return Err(CollectError::Malformed("agent returned an empty payload".to_string()));
    }

    let topics = parse_topics(raw);
    if topics.is_empty() {
        return Err(CollectError::Malformed(format!(
            "no topics could be parsed from {} chars of output",
            raw.chars().count()
        )));
    }
    if topics.len() > topics_per_category {
        return Err(CollectError::Malformed(format!(
            "{} topics returned, limit is {}",
            topics.len(),
            topics_per_category
        )));
    }

    Ok(topics)
}
