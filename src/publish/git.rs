//! Git commit and push of the publish directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::config::GitConfig;
use crate::error::{ResearchError, Result};

/// The repository that hosts the static site.
#[derive(Debug, Clone)]
pub struct GitRepo {
    repo_root: PathBuf,
    remote: String,
    branch: String,
}

impl GitRepo {
    pub fn new(repo_root: impl Into<PathBuf>, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    pub fn from_config(config: &GitConfig) -> Self {
        Self::new(&config.repo_root, &config.remote, &config.branch)
    }

    /// Check if `path` has no uncommitted or untracked changes.
    pub fn is_clean(&self, path: &Path) -> Result<bool> {
        let output = self.git(&["status", "--porcelain", "--", &path_arg(path)?], "check status")?;
        Ok(output.stdout.is_empty())
    }

    /// Stage `path` and commit it.
    ///
    /// Returns false without committing when there is nothing to commit.
    pub fn commit_path(&self, path: &Path, message: &str) -> Result<bool> {
        if self.is_clean(path)? {
            log::info!("Nothing to commit under {}", path.display());
            return Ok(false);
        }

        let path = path_arg(path)?;
        self.git(&["add", "--", &path], "stage changes")?;
        self.git(&["commit", "-m", message, "--", &path], "commit changes")?;
        log::info!("Committed: {}", message);
        Ok(true)
    }

    /// Push the configured branch to the configured remote.
    pub fn push(&self) -> Result<()> {
        self.git(&["push", &self.remote, &self.branch], "push")?;
        log::info!("Pushed {} to {}", self.branch, self.remote);
        Ok(())
    }

    /// Commit `path` if it changed, then push.
    pub fn commit_and_push(&self, path: &Path, message: &str) -> Result<()> {
        self.commit_path(path, message)?;
        self.push()
    }

    fn git(&self, args: &[&str], action: &str) -> Result<Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| ResearchError::Publish(format!("Failed to execute git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResearchError::Publish(format!("Failed to {}: {}", action, stderr.trim())));
        }

        Ok(output)
    }
}

/// Paths are resolved against the current directory, which need not be the repo root.
fn path_arg(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)?;
    Ok(absolute.to_string_lossy().to_string())
}
