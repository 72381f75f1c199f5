//! Claude CLI search agent
//!
//! Runs `claude -p <prompt> --allowedTools WebSearch --output-format json`
//! and extracts the `result` field from the JSON envelope.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::agent::client::{SearchAgent, SearchRequest};
use crate::config::AgentConfig;
use crate::domain::CollectError;

/// Longest stderr/result excerpt carried in an error message
const MAX_ERROR_EXCERPT: usize = 500;

/// Search agent backed by the `claude` command-line tool
#[derive(Debug, Clone)]
pub struct ClaudeCliAgent {
    config: AgentConfig,
}

impl ClaudeCliAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, request: &SearchRequest) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.arg("-p").arg(&request.prompt);
        if !self.config.allowed_tools.is_empty() {
            cmd.arg("--allowedTools").arg(self.config.allowed_tools.join(","));
        }
        cmd.args(["--output-format", "json"]);

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        // The caller's timeout drops this future; the child must die with it
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SearchAgent for ClaudeCliAgent {
    async fn query(&self, request: &SearchRequest) -> Result<String, CollectError> {
        let child = self
            .build_command(request)
            .spawn()
            .map_err(|e| CollectError::Agent(format!("failed to spawn '{}': {}", self.config.command, e)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CollectError::Agent(format!("failed to wait for '{}': {}", self.config.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollectError::Agent(format!(
                "'{}' exited with {:?}: {}",
                self.config.command,
                output.status.code(),
                excerpt(stderr.trim())
            )));
        }

        parse_cli_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct CliEnvelope {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    is_error: bool,
}

/// Extract the payload from the CLI's JSON envelope.
pub fn parse_cli_output(stdout: &[u8]) -> Result<String, CollectError> {
    let envelope: CliEnvelope = serde_json::from_slice(stdout)
        .map_err(|e| CollectError::Malformed(format!("agent output is not a JSON envelope: {}", e)))?;

    if envelope.is_error {
        let detail = envelope.result.as_deref().unwrap_or("no detail");
        return Err(CollectError::Agent(format!("agent reported an error: {}", excerpt(detail))));
    }

    Ok(envelope.result.unwrap_or_default())
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_EXCERPT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
