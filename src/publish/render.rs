//! HTML rendering for the daily report and the site index using Handlebars

use std::path::Path;

use chrono::NaiveDate;
use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::{CollectionOutcome, DailyReport, Topic};
use crate::error::{ResearchError, Result};

pub const REPORT_TEMPLATE: &str = "report";
pub const INDEX_TEMPLATE: &str = "index";

const DEFAULT_REPORT_HTML: &str = include_str!("../../templates/report.html");
const DEFAULT_INDEX_HTML: &str = include_str!("../../templates/index.html");

#[derive(Serialize)]
struct ReportView<'a> {
    date: String,
    generated_at: &'a str,
    total_topics: usize,
    succeeded: usize,
    failed: usize,
    categories: Vec<CategoryView<'a>>,
}

#[derive(Serialize)]
struct CategoryView<'a> {
    id: &'a str,
    name: &'a str,
    ok: bool,
    topics: &'a [Topic],
    error_kind: Option<&'static str>,
    error_detail: Option<&'a str>,
    attempts: u32,
}

#[derive(Serialize)]
struct IndexView {
    latest_date: Option<String>,
    reports: Vec<IndexEntry>,
}

#[derive(Serialize)]
struct IndexEntry {
    date: String,
}

/// Renders report and index pages. HTML escaping stays on.
pub struct ReportRenderer {
    handlebars: Handlebars<'static>,
}

impl ReportRenderer {
    /// Built-in templates, with `report.html` / `index.html` in `template_dir`
    /// taking precedence when present.
    pub fn new(template_dir: Option<&Path>) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);

        for (name, file, builtin) in [
            (REPORT_TEMPLATE, "report.html", DEFAULT_REPORT_HTML),
            (INDEX_TEMPLATE, "index.html", DEFAULT_INDEX_HTML),
        ] {
            let override_path = template_dir.map(|dir| dir.join(file)).filter(|p| p.exists());
            match override_path {
                Some(path) => {
                    log::debug!("Using {} template from {}", name, path.display());
                    handlebars
                        .register_template_file(name, &path)
                        .map_err(|e| ResearchError::Render(format!("Failed to register '{}': {}", path.display(), e)))?;
                }
                None => {
                    handlebars
                        .register_template_string(name, builtin)
                        .map_err(|e| ResearchError::Render(format!("Failed to register '{}': {}", name, e)))?;
                }
            }
        }

        Ok(Self { handlebars })
    }

    pub fn render_report(&self, report: &DailyReport, generated_at: &str) -> Result<String> {
        let categories = report
            .entries
            .iter()
            .map(|entry| {
                let (error_kind, error_detail) = match &entry.outcome {
                    CollectionOutcome::Success { .. } => (None, None),
                    CollectionOutcome::Failure { reason, detail, .. } => (Some(reason.as_str()), Some(detail.as_str())),
                };
                CategoryView {
                    id: &entry.category.id,
                    name: &entry.category.name,
                    ok: entry.outcome.is_success(),
                    topics: entry.outcome.topics(),
                    error_kind,
                    error_detail,
                    attempts: entry.outcome.attempts(),
                }
            })
            .collect();

        let view = ReportView {
            date: report.date_key(),
            generated_at,
            total_topics: report.total_topics(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            categories,
        };

        self.handlebars
            .render(REPORT_TEMPLATE, &view)
            .map_err(|e| ResearchError::Render(format!("Failed to render report: {}", e)))
    }

    /// `dates` newest first; the first one is linked as the latest report.
    pub fn render_index(&self, dates: &[NaiveDate]) -> Result<String> {
        let reports: Vec<IndexEntry> = dates
            .iter()
            .map(|d| IndexEntry {
                date: d.format("%Y-%m-%d").to_string(),
            })
            .collect();
        let view = IndexView {
            latest_date: reports.first().map(|r| r.date.clone()),
            reports,
        };

        self.handlebars
            .render(INDEX_TEMPLATE, &view)
            .map_err(|e| ResearchError::Render(format!("Failed to render index: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, ErrorKind, assemble};
    use std::fs;
    use tempfile::TempDir;

    fn report() -> DailyReport {
        let cats = vec![
            Category::new("ai_tech", "AI Technology", "q"),
            Category::new("ai_security", "AI Security", "q"),
        ];
        assemble(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            &cats,
            vec![
                CollectionOutcome::Success {
                    topics: vec![
                        Topic::new("Model <X> released", "Fast & cheap").with_source("https://example.com/x"),
                        Topic::new("No source here", "Just text"),
                    ],
                    attempts: 1,
                },
                CollectionOutcome::Failure {
                    reason: ErrorKind::Timeout,
                    detail: "agent call timed out after 600s".into(),
                    attempts: 3,
                },
            ],
        )
    }

    #[test]
    fn test_render_report_contains_all_categories() {
        let renderer = ReportRenderer::new(None).unwrap();
        let html = renderer.render_report(&report(), "2024-06-01 07:00:00").unwrap();

        assert!(html.contains("2024-06-01"));
        assert!(html.contains("2024-06-01 07:00:00"));
        assert!(html.contains("<html lang=\"ja\">"));
        assert!(html.contains("AI Technology"));
        assert!(html.contains("AI Security"));
        assert!(html.contains("https://example.com/x"));
        assert!(html.contains("timeout"));
        assert!(html.contains("agent call timed out after 600s"));
        // Category order follows the report
        assert!(html.find("AI Technology").unwrap() < html.find("AI Security").unwrap());
    }

    #[test]
    fn test_render_report_escapes_html() {
        let renderer = ReportRenderer::new(None).unwrap();
        let html = renderer.render_report(&report(), "now").unwrap();
        assert!(html.contains("Model &lt;X&gt; released"));
        assert!(!html.contains("Model <X> released"));
    }

    #[test]
    fn test_render_index() {
        let renderer = ReportRenderer::new(None).unwrap();
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        ];
        let html = renderer.render_index(&dates).unwrap();
        assert!(html.contains("2024-06-02.html"));
        assert!(html.contains("2024-06-01.html"));
    }

    #[test]
    fn test_render_index_empty() {
        let renderer = ReportRenderer::new(None).unwrap();
        let html = renderer.render_index(&[]).unwrap();
        assert!(!html.contains(".html\""));
    }

    #[test]
    fn test_template_dir_override() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("report.html"), "custom {{date}} {{total_topics}}").unwrap();

        let renderer = ReportRenderer::new(Some(temp.path())).unwrap();
        let html = renderer.render_report(&report(), "now").unwrap();
        assert_eq!(html, "custom 2024-06-01 2");

        // index falls back to the built-in template
        let index = renderer.render_index(&[]).unwrap();
        assert!(index.contains("<html"));
    }
}
