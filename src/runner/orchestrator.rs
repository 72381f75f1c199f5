//! Run orchestrator - drives every category through collection and hands the
//! assembled report to the publisher.
//!
//! Categories run strictly one after another in registry order. A category
//! that exhausts its retries is recorded as a failure and the run continues.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{error, info};

use crate::agent::SearchAgent;
use crate::collect::{CollectionJob, RetryController, Sleeper};
use crate::domain::{Category, CollectError, CollectionOutcome, DailyReport, assemble};
use crate::publish::{PublishOutcome, Publisher, SiteStore};

/// Decides whether today's run has already happened.
#[derive(Debug, Clone)]
pub enum IdempotencyGate {
    /// Skip when the day's report file exists
    ReportFile(SiteStore),
    /// Always run (render-only test mode)
    Disabled,
}

impl IdempotencyGate {
    pub fn already_ran(&self, date: NaiveDate) -> bool {
        match self {
            IdempotencyGate::ReportFile(site) => site.report_exists(date),
            IdempotencyGate::Disabled => false,
        }
    }
}

/// Result of one `execute` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// A report for the date already existed; nothing was done
    Skipped { date: NaiveDate },
    /// Every category resolved and the report was handed to the publisher
    Completed { report: DailyReport, publish: PublishOutcome },
}

impl RunResult {
    /// False only when publishing failed
    pub fn is_success(&self) -> bool {
        match self {
            RunResult::Skipped { .. } => true,
            RunResult::Completed { publish, .. } => !publish.is_failed(),
        }
    }

    pub fn report(&self) -> Option<&DailyReport> {
        match self {
            RunResult::Skipped { .. } => None,
            RunResult::Completed { report, .. } => Some(report),
        }
    }
}

/// Drives the daily pipeline.
pub struct RunOrchestrator<A, S, P>
where
    A: SearchAgent,
    S: Sleeper,
    P: Publisher,
{
    job: CollectionJob<A>,
    retry: RetryController<S>,
    publisher: Arc<P>,
    gate: IdempotencyGate,
}

impl<A, S, P> RunOrchestrator<A, S, P>
where
    A: SearchAgent,
    S: Sleeper,
    P: Publisher,
{
    pub fn new(job: CollectionJob<A>, retry: RetryController<S>, publisher: Arc<P>, gate: IdempotencyGate) -> Self {
        Self {
            job,
            retry,
            publisher,
            gate,
        }
    }

    /// Run the whole pipeline for `today`.
    ///
    /// Returns `Skipped` without touching any category when the gate
    /// reports an existing artifact.
    pub async fn execute(&self, categories: &[Category], today: NaiveDate) -> RunResult {
        if self.gate.already_ran(today) {
            info!("Report for {} already exists. Skipping.", today);
            return RunResult::Skipped { date: today };
        }

        let report = self.collect(categories, today).await;
        info!(
            "Collection complete for {}: {} topics, {}/{} categories succeeded",
            today,
            report.total_topics(),
            report.succeeded(),
            report.entries.len()
        );

        let publish = self.publisher.publish(&report).await;
        match &publish {
            PublishOutcome::Published { report_path, notified } => {
                info!("Published {} (notified: {})", report_path.display(), notified)
            }
            PublishOutcome::Rendered { report_path } => info!("Rendered {}", report_path.display()),
            PublishOutcome::Failed { stage, detail } => error!("Publish failed at {} stage: {}", stage, detail),
        }

        RunResult::Completed { report, publish }
    }

    /// Collection phase only: one outcome per category, in order.
    pub async fn collect(&self, categories: &[Category], today: NaiveDate) -> DailyReport {
        let total = categories.len();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, category) in categories.iter().enumerate() {
            info!("[{}/{}] Collecting {} ({})", idx + 1, total, category.id, category.name);

            let outcome = match self.job.request(category, today) {
                Ok(request) => {
                    let (job, request) = (&self.job, &request);
                    self.retry.run(&category.id, move || job.attempt(request)).await
                }
                Err(e) => {
                    error!("[{}] prompt could not be rendered, skipping agent: {}", category.id, e);
                    CollectionOutcome::failure(&CollectError::Agent(format!("prompt render failed: {}", e)), 0)
                }
            };

            match &outcome {
                CollectionOutcome::Success { topics, attempts } => {
                    info!("Collected {} topics for {} in {} attempt(s)", topics.len(), category.id, attempts)
                }
                CollectionOutcome::Failure {
                    reason,
                    detail,
                    attempts,
                } => error!(
                    "Giving up on {} after {} attempt(s) ({}): {}",
                    category.id, attempts, reason, detail
                ),
            }
            outcomes.push(outcome);
        }

        assemble(today, categories, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{MockResponse, MockSearchAgent, PromptTemplate};
    use crate::collect::{JobSettings, RetryPolicy};
    use crate::domain::ErrorKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct InstantSleeper;

    #[async_trait]
    impl Sleeper for InstantSleeper {
        async fn sleep(&self, _duration: Duration) {}
    }

    #[derive(Default)]
    struct RecordingPublisher {
        reports: Mutex<Vec<DailyReport>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, report: &DailyReport) -> PublishOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reports.lock().unwrap().push(report.clone());
            PublishOutcome::Rendered {
                report_path: format!("{}.html", report.date_key()).into(),
            }
        }
    }

    fn topics_md(n: usize) -> String {
        (1..=n).map(|i| format!("### Topic {i}\nSummary {i}\n")).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new("ai_tech", "AI Technology", "tech"),
            Category::new("ai_security", "AI Security", "security"),
        ]
    }

    fn orchestrator(
        agent: MockSearchAgent,
        gate: IdempotencyGate,
    ) -> (
        RunOrchestrator<MockSearchAgent, InstantSleeper, RecordingPublisher>,
        Arc<MockSearchAgent>,
        Arc<RecordingPublisher>,
    ) {
        orchestrator_with_prompt(agent, gate, "{{query}}")
    }

    fn orchestrator_with_prompt(
        agent: MockSearchAgent,
        gate: IdempotencyGate,
        template: &str,
    ) -> (
        RunOrchestrator<MockSearchAgent, InstantSleeper, RecordingPublisher>,
        Arc<MockSearchAgent>,
        Arc<RecordingPublisher>,
    ) {
        let agent = Arc::new(agent);
        let publisher = Arc::new(RecordingPublisher::default());
        let job = CollectionJob::new(
            agent.clone(),
            PromptTemplate::new(template).unwrap(),
            JobSettings {
                topics_per_category: 5,
                timeout: Duration::from_secs(5),
            },
        );
        let retry = RetryController::new(RetryPolicy::new(3, Duration::ZERO), Arc::new(InstantSleeper));
        (RunOrchestrator::new(job, retry, publisher.clone(), gate), agent, publisher)
    }

    #[tokio::test]
    async fn test_partial_failure_still_completes() {
        // tech succeeds at once; security times out on every attempt
        let agent = MockSearchAgent::scripted(
            vec![MockResponse::Payload(topics_md(5))],
            MockResponse::Error(CollectError::Timeout(Duration::from_secs(600))),
        );
        let (orch, agent, publisher) = orchestrator(agent, IdempotencyGate::Disabled);

        let result = orch.execute(&categories(), today()).await;

        let report = result.report().unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].category.id, "ai_tech");
        assert_eq!(report.entries[0].outcome.topics().len(), 5);
        assert_eq!(report.entries[1].category.id, "ai_security");
        assert_eq!(report.entries[1].outcome.reason(), Some(ErrorKind::Timeout));
        assert_eq!(report.entries[1].outcome.attempts(), 3);
        assert_eq!(agent.calls(), 4);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_categories_run_in_registry_order() {
        let agent = MockSearchAgent::always(MockResponse::Payload(topics_md(1)));
        let (orch, agent, _publisher) = orchestrator(agent, IdempotencyGate::Disabled);

        orch.execute(&categories(), today()).await;

        assert_eq!(agent.prompts(), vec!["tech".to_string(), "security".to_string()]);
    }

    #[tokio::test]
    async fn test_existing_report_skips_everything() {
        let temp = TempDir::new().unwrap();
        let site = SiteStore::new(temp.path());
        site.write_report(today(), "<html></html>").unwrap();

        let agent = MockSearchAgent::always(MockResponse::Payload(topics_md(1)));
        let (orch, agent, publisher) = orchestrator(agent, IdempotencyGate::ReportFile(site));

        let result = orch.execute(&categories(), today()).await;

        assert_eq!(result, RunResult::Skipped { date: today() });
        assert!(result.is_success());
        assert_eq!(agent.calls(), 0);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gate_allows_other_dates() {
        let temp = TempDir::new().unwrap();
        let site = SiteStore::new(temp.path());
        site.write_report(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), "old").unwrap();

        let agent = MockSearchAgent::always(MockResponse::Payload(topics_md(1)));
        let (orch, agent, _publisher) = orchestrator(agent, IdempotencyGate::ReportFile(site));

        let result = orch.execute(&categories(), today()).await;

        assert!(matches!(result, RunResult::Completed { .. }));
        assert_eq!(agent.calls(), 2);
    }

    #[tokio::test]
    async fn test_all_failures_still_publish_full_report() {
        let agent = MockSearchAgent::always(MockResponse::Error(CollectError::Agent("offline".into())));
        let (orch, _agent, publisher) = orchestrator(agent, IdempotencyGate::Disabled);

        orch.execute(&categories(), today()).await;

        let published = publisher.reports.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].entries.len(), 2);
        assert_eq!(published[0].failed(), 2);
    }

    #[tokio::test]
    async fn test_prompt_render_failure_is_not_retried() {
        let agent = MockSearchAgent::always(MockResponse::Payload(topics_md(1)));
        let (orch, agent, publisher) = orchestrator_with_prompt(agent, IdempotencyGate::Disabled, "{{shout query}}");

        let result = orch.execute(&categories(), today()).await;

        let report = result.report().unwrap();
        assert_eq!(agent.calls(), 0);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.entries[0].outcome.attempts(), 0);
        match &report.entries[0].outcome {
            CollectionOutcome::Failure { detail, .. } => assert!(detail.contains("prompt render failed")),
            other => panic!("Expected failure, got {:?}", other),
        }
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_result_publish_failure_is_not_success() {
        let result = RunResult::Completed {
            report: assemble(today(), &[], Vec::new()),
            publish: PublishOutcome::Failed {
                stage: crate::publish::PublishStage::Git,
                detail: "push rejected".into(),
            },
        };
        assert!(!result.is_success());
    }
}
