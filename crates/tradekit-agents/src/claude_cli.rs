use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::model::LanguageModel;

const CLAUDE_BIN: &str = "claude";

#[derive(Debug, Clone)]
pub struct ClaudeCliConfig {
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            timeout: Duration::from_secs(45),
        }
    }
}

/// One-shot, text-mode `claude -p` call. The child is killed if the timeout fires.
pub async fn invoke_claude(
    system_prompt: &str,
    user_prompt: &str,
    config: &ClaudeCliConfig,
) -> Result<String, AgentError> {
    debug!(model = %config.model, prompt_len = user_prompt.len(), "Invoking claude CLI");

    let mut command = Command::new(CLAUDE_BIN);
    command
        .arg("-p")
        .arg(user_prompt)
        .arg("--system-prompt")
        .arg(system_prompt)
        .arg("--model")
        .arg(&config.model)
        .arg("--output-format")
        .arg("text")
        .kill_on_drop(true);

    let output = tokio::time::timeout(config.timeout, command.output())
        .await
        .map_err(|_| AgentError::Timeout(config.timeout.as_secs()))?
        .map_err(|e| AgentError::Cli(format!("Failed to spawn {CLAUDE_BIN}: {e}")))?;

    stdout_text(output)
}

fn stdout_text(output: Output) -> Result<String, AgentError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(status = %output.status, stderr = %stderr, "Claude CLI failed");
        return Err(AgentError::Cli(format!("{CLAUDE_BIN} exited {}: {stderr}", output.status)));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    if text.trim().is_empty() {
        return Err(AgentError::Cli("Claude returned empty response".to_string()));
    }
    Ok(text)
}

pub async fn check_cli_available() -> bool {
    Command::new(CLAUDE_BIN)
        .arg("--version")
        .output()
        .await
        .is_ok_and(|out| out.status.success())
}

/// [`LanguageModel`] backed by the local `claude` CLI.
pub struct ClaudeCli {
    config: ClaudeCliConfig,
}

impl ClaudeCli {
    pub fn new(config: ClaudeCliConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LanguageModel for ClaudeCli {
    fn id(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError> {
        invoke_claude(system_prompt, user_prompt, &self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn default_config() {
        let config = ClaudeCliConfig::default();
        assert_eq!(config.model, "claude-3-5-haiku-latest");
        assert_eq!(config.timeout, Duration::from_secs(45));
    }

    #[test]
    fn stdout_is_returned_on_success() {
        assert_eq!(stdout_text(output(0, "{\"ok\": true}", "")).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn failures_and_blank_output_are_errors() {
        let err = stdout_text(output(1, "", "not logged in")).unwrap_err();
        assert!(err.to_string().contains("not logged in"));
        assert!(matches!(stdout_text(output(0, "  \n", "")), Err(AgentError::Cli(_))));
    }
}
