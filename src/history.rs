//! Hands the final messages to `git filter-branch`.
//!
//! Each replacement is written to `<dir>/<commit id>`. The message filter
//! looks up the file for `$GIT_COMMIT` and passes every other message
//! through unchanged, so no ordering state is shared with git.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::git::GitError;
use crate::profile;

const MESSAGES_DIR_ENV: &str = "GIT_REWORD_MESSAGES";
const MSG_FILTER: &str = r#"if [ -f "$GIT_REWORD_MESSAGES/$GIT_COMMIT" ]; then cat "$GIT_REWORD_MESSAGES/$GIT_COMMIT"; else cat; fi"#;

/// What to rewrite and with which messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
  pub branch:       String,
  /// Parent of the oldest processed commit; `None` rewrites from the root.
  pub base:         Option<String>,
  /// `(commit id, new message)` pairs.
  pub replacements: Vec<(String, String)>
}

impl RewritePlan {
  pub fn range(&self) -> String {
    match &self.base {
      Some(base) => format!("{}..{}", base, self.branch),
      None => self.branch.clone()
    }
  }
}

/// Writes one file per replacement into a fresh temporary directory.
pub fn write_messages(replacements: &[(String, String)]) -> Result<TempDir> {
  let dir = tempfile::Builder::new()
    .prefix("git-reword-")
    .tempdir()
    .context("Failed to create message directory")?;

  for (id, message) in replacements {
    let path = dir.path().join(id);
    let mut contents = message.trim_end().to_string();
    contents.push('\n');
    fs::write(&path, contents).with_context(|| format!("Failed to write message for {}", id))?;
  }

  Ok(dir)
}

/// Runs `git filter-branch` in `workdir` for `plan`. Does nothing when there
/// is nothing to replace.
pub fn rewrite(workdir: &Path, plan: &RewritePlan) -> Result<()> {
  profile!("Rewrite history");

  if plan.replacements.is_empty() {
    log::info!("No messages to rewrite");
    return Ok(());
  }

  let messages = write_messages(&plan.replacements)?;
  let range = plan.range();
  log::debug!("Rewriting {} with {} replacements", range, plan.replacements.len());

  let output = Command::new("git")
    .args(["filter-branch", "-f", "--msg-filter", MSG_FILTER, "--"])
    .arg(&range)
    .current_dir(workdir)
    .env(MESSAGES_DIR_ENV, messages.path())
    .env("FILTER_BRANCH_SQUELCH_WARNING", "1")
    .output()
    .context("Failed to run git filter-branch")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    return Err(GitError::Rewrite(stderr).into());
  }

  log::debug!("filter-branch: {}", String::from_utf8_lossy(&output.stdout).trim());
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_range() {
    let mut plan = RewritePlan { branch: "main".into(), base: Some("abc123".into()), replacements: vec![] };
    assert_eq!(plan.range(), "abc123..main");

    plan.base = None;
    assert_eq!(plan.range(), "main");
  }

  #[test]
  fn test_write_messages() {
    let replacements = vec![("abc".to_string(), "feat: add x\n\n".to_string()), ("def".to_string(), "fix: y".to_string())];

    let dir = write_messages(&replacements).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("abc")).unwrap(), "feat: add x\n");
    assert_eq!(fs::read_to_string(dir.path().join("def")).unwrap(), "fix: y\n");
  }

  #[test]
  fn test_empty_plan_is_a_no_op() {
    let plan = RewritePlan { branch: "main".into(), base: None, replacements: vec![] };
    assert!(rewrite(Path::new("/nonexistent"), &plan).is_ok());
  }
}
