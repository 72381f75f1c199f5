//! Completion notification over a chat webhook.

use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use serde_json::{Value, json};

use crate::config::Config;
use crate::domain::DailyReport;
use crate::error::{ResearchError, Result};

/// What a notifier is told about a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub date: String,
    pub total_topics: usize,
    pub succeeded: usize,
    pub failed_categories: Vec<String>,
    pub report_url: Option<String>,
}

impl Notification {
    pub fn from_report(report: &DailyReport, base_url: Option<&str>) -> Self {
        let date = report.date_key();
        let report_url = base_url
            .filter(|url| !url.is_empty())
            .map(|url| format!("{}/{}.html", url.trim_end_matches('/'), date));
        Self {
            date,
            total_topics: report.total_topics(),
            succeeded: report.succeeded(),
            failed_categories: report.failed_categories().map(|c| c.name.clone()).collect(),
            report_url,
        }
    }
}

/// Best-effort delivery backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ok(true) when a message was delivered, Ok(false) when delivery is not configured
    async fn notify(&self, notification: &Notification) -> Result<bool>;
}

/// Used when no webhook is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<bool> {
        Ok(false)
    }
}

/// Microsoft Teams incoming webhook posting an adaptive card.
pub struct TeamsWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl TeamsWebhook {
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResearchError::Notify(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { webhook_url, http })
    }

    async fn post(&self, payload: &Value) -> Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ResearchError::Notify(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!("Teams webhook returned {}: {}", status, body);
            return Err(ResearchError::Notify(format!("Teams webhook returned {}", status)));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TeamsWebhook {
    async fn notify(&self, notification: &Notification) -> Result<bool> {
        self.post(&adaptive_card(notification)).await?;
        info!("Teams notification sent");
        Ok(true)
    }
}

/// Build the Teams message envelope for a finished run.
pub fn adaptive_card(notification: &Notification) -> Value {
    let mut body = vec![
        json!({
            "type": "TextBlock",
            "text": format!("Daily Research Report - {}", notification.date),
            "weight": "Bolder",
            "size": "Medium",
        }),
        json!({
            "type": "TextBlock",
            "text": format!(
                "Collected {} topics across {} categories",
                notification.total_topics, notification.succeeded
            ),
            "wrap": true,
        }),
    ];

    if !notification.failed_categories.is_empty() {
        body.push(json!({
            "type": "TextBlock",
            "text": format!("Failed: {}", notification.failed_categories.join(", ")),
            "color": "Attention",
            "wrap": true,
        }));
    }

    let mut content = json!({
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "type": "AdaptiveCard",
        "version": "1.4",
        "body": body,
    });

    if let Some(url) = &notification.report_url {
        content["actions"] = json!([{
            "type": "Action.OpenUrl",
            "title": "Open report",
            "url": url,
        }]);
    }

    json!({
        "type": "message",
        "attachments": [{
            "contentType": "application/vnd.microsoft.card.adaptive",
            "contentUrl": null,
            "content": content,
        }],
    })
}

/// Pick a backend from the environment; an unset webhook is a no-op.
pub fn notifier_from_env(config: &Config) -> Box<dyn Notifier> {
    let url = std::env::var(&config.notify.webhook_env).ok();
    if url.as_deref().is_none_or(|u| u.trim().is_empty()) {
        warn!("{} not set, skipping notification", config.notify.webhook_env);
    }
    select_notifier(url.as_deref(), Duration::from_secs(config.notify.timeout_sec))
}

/// Teams for a non-empty URL, otherwise no-op. Never fails: a webhook that
/// cannot be set up only disables notification.
pub fn select_notifier(webhook_url: Option<&str>, timeout: Duration) -> Box<dyn Notifier> {
    match webhook_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => match TeamsWebhook::new(url.to_string(), timeout) {
            Ok(webhook) => Box::new(webhook),
            Err(e) => {
                warn!("Teams webhook unavailable, skipping notification: {}", e);
                Box::new(NoopNotifier)
            }
        },
        None => Box::new(NoopNotifier),
    }
}
