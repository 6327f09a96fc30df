use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::Provider;

/// Shells out to the local `claude` CLI in print mode.
pub struct ClaudeProvider {
  command: String,
  timeout: Duration
}

impl ClaudeProvider {
  pub fn new(command: String, timeout: Duration) -> Self {
    Self { command, timeout }
  }
}

#[async_trait]
impl Provider for ClaudeProvider {
  async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
    let full_prompt = format!("{}\n\n{}", system, prompt);
    let mut command = Command::new(&self.command);
    command
      .arg("-p")
      .arg(full_prompt)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    let output = tokio::time::timeout(self.timeout, command.output())
      .await
      .with_context(|| format!("{} did not answer within {:?}", self.command, self.timeout))?
      .with_context(|| format!("Failed to run {}", self.command))?;

    if !output.status.success() {
      bail!("{} exited with {}: {}", self.command, output.status, String::from_utf8_lossy(&output.stderr).trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }

  fn name(&self) -> &str {
    "claude"
  }
}
