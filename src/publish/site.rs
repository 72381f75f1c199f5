//! Publish directory layout: one `YYYY-MM-DD.html` per day plus `index.html`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{ResearchError, Result};

const INDEX_FILE: &str = "index.html";

/// Report files on disk.
///
/// The existence of a day's file is the only run record the pipeline keeps.
#[derive(Debug, Clone)]
pub struct SiteStore {
    output_dir: PathBuf,
}

impl SiteStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(format!("{}.html", date.format("%Y-%m-%d")))
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE)
    }

    pub fn report_exists(&self, date: NaiveDate) -> bool {
        self.report_path(date).exists()
    }

    pub fn write_report(&self, date: NaiveDate, html: &str) -> Result<PathBuf> {
        let path = self.report_path(date);
        self.write(&path, html)?;
        Ok(path)
    }

    pub fn write_index(&self, html: &str) -> Result<PathBuf> {
        let path = self.index_path();
        self.write(&path, html)?;
        Ok(path)
    }

    /// Dates of existing reports, newest first, at most `limit`.
    pub fn list_report_dates(&self, limit: usize) -> Result<Vec<NaiveDate>> {
        if !self.output_dir.exists() {
            return Ok(Vec::new());
        }

        let pattern = self.output_dir.join("????-??-??.html");
        let pattern = pattern.to_string_lossy();
        let entries =
            glob::glob(&pattern).map_err(|e| ResearchError::Publish(format!("Invalid report glob: {}", e)))?;

        let mut dates: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?.to_string();
                NaiveDate::parse_from_str(&stem, "%Y-%m-%d").ok()
            })
            .collect();

        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.truncate(limit);
        Ok(dates)
    }

    fn write(&self, path: &Path, html: &str) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        fs::write(path, html)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}
