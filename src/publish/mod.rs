//! Publish pipeline
//!
//! Renders a finished `DailyReport`, writes the day's page and the index,
//! commits and pushes the publish directory, then notifies. Only runs once
//! every category has resolved.

pub mod git;
pub mod notify;
pub mod render;
pub mod site;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use log::{error, info, warn};

pub use git::GitRepo;
pub use notify::{NoopNotifier, Notification, Notifier, TeamsWebhook, adaptive_card, notifier_from_env, select_notifier};
pub use render::ReportRenderer;
pub use site::SiteStore;

use crate::config::Config;
use crate::domain::DailyReport;
use crate::error::Result;

/// Which publish steps run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Render, write, commit/push, notify
    Full,
    /// Render and write only
    RenderOnly,
}

/// Step at which publishing stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Render,
    Write,
    Git,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStage::Render => f.write_str("render"),
            PublishStage::Write => f.write_str("write"),
            PublishStage::Git => f.write_str("git"),
        }
    }
}

/// Result of handing a report to the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Written, committed, pushed; `notified` is false when the webhook was
    /// unset or delivery failed
    Published { report_path: PathBuf, notified: bool },
    /// Written locally without commit/push/notify
    Rendered { report_path: PathBuf },
    Failed { stage: PublishStage, detail: String },
}

impl PublishOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PublishOutcome::Failed { .. })
    }

    pub fn report_path(&self) -> Option<&PathBuf> {
        match self {
            PublishOutcome::Published { report_path, .. } | PublishOutcome::Rendered { report_path } => {
                Some(report_path)
            }
            PublishOutcome::Failed { .. } => None,
        }
    }
}

/// Publish boundary seen by the orchestrator.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, report: &DailyReport) -> PublishOutcome;
}

/// Static-site publisher backed by the filesystem and git
pub struct SitePublisher {
    mode: PublishMode,
    renderer: ReportRenderer,
    site: SiteStore,
    git: GitRepo,
    notifier: Box<dyn Notifier>,
    commit_prefix: String,
    site_base_url: Option<String>,
    index_limit: usize,
}

impl SitePublisher {
    pub fn new(
        mode: PublishMode,
        renderer: ReportRenderer,
        site: SiteStore,
        git: GitRepo,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            mode,
            renderer,
            site,
            git,
            notifier,
            commit_prefix: "Add daily report".to_string(),
            site_base_url: None,
            index_limit: 30,
        }
    }

    pub fn from_config(config: &Config, mode: PublishMode, notifier: Box<dyn Notifier>) -> Result<Self> {
        let renderer = ReportRenderer::new(config.template_dir.as_deref())?;
        Ok(Self {
            commit_prefix: config.git.commit_prefix.clone(),
            site_base_url: config.site_base_url.clone(),
            index_limit: config.index_limit,
            ..Self::new(
                mode,
                renderer,
                SiteStore::new(&config.output_dir),
                GitRepo::from_config(&config.git),
                notifier,
            )
        })
    }

    /// Write the report page, then regenerate the index to include it.
    fn write_site(&self, report: &DailyReport, generated_at: &str) -> std::result::Result<PathBuf, PublishOutcome> {
        let html = self
            .renderer
            .render_report(report, generated_at)
            .map_err(|e| failed(PublishStage::Render, e))?;
        let report_path = self
            .site
            .write_report(report.date, &html)
            .map_err(|e| failed(PublishStage::Write, e))?;

        let dates = self
            .site
            .list_report_dates(self.index_limit)
            .map_err(|e| failed(PublishStage::Write, e))?;
        let index = self
            .renderer
            .render_index(&dates)
            .map_err(|e| failed(PublishStage::Render, e))?;
        self.site.write_index(&index).map_err(|e| failed(PublishStage::Write, e))?;

        Ok(report_path)
    }
}

fn failed(stage: PublishStage, err: impl fmt::Display) -> PublishOutcome {
    error!("Publish failed at {} stage: {}", stage, err);
    PublishOutcome::Failed {
        stage,
        detail: err.to_string(),
    }
}

#[async_trait]
impl Publisher for SitePublisher {
    async fn publish(&self, report: &DailyReport) -> PublishOutcome {
        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let report_path = match self.write_site(report, &generated_at) {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };

        if self.mode == PublishMode::RenderOnly {
            info!("Rendered {} (publish skipped)", report_path.display());
            return PublishOutcome::Rendered { report_path };
        }

        let message = format!("{} {}", self.commit_prefix, report.date_key());
        if let Err(e) = self.git.commit_and_push(self.site.output_dir(), &message) {
            return failed(PublishStage::Git, e);
        }

        let notification = Notification::from_report(report, self.site_base_url.as_deref());
        let notified = match self.notifier.notify(&notification).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!("Notification failed: {}", e);
                false
            }
        };

        PublishOutcome::Published { report_path, notified }
    }
}
