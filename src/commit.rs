use anyhow::{bail, Context, Result};

use crate::config::RunConfig;
use crate::provider::Provider;
use crate::prompt;

/// One commit as read from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
  pub id:               String,
  pub original_message: String,
  pub changed_files:    Vec<String>,
  pub diff:             String
}

impl CommitRecord {
  pub fn short_id(&self) -> &str {
    self.id.get(..7).unwrap_or(&self.id)
  }
}

/// Asks `provider` for a new message for `record`.
pub async fn suggest(provider: &dyn Provider, record: &CommitRecord, config: &RunConfig) -> Result<String> {
  let request = prompt::compose(&record.diff, &record.changed_files, &record.original_message, config);
  log::trace!("Prompt for {}:\n{}", record.short_id(), request.prompt);

  let response = provider
    .generate(&request.prompt, &request.system)
    .await
    .with_context(|| format!("{} failed to generate a message for {}", provider.name(), record.short_id()))?;

  let message = clean_response(&response);
  if message.is_empty() {
    bail!("{} returned an empty message for {}", provider.name(), record.short_id());
  }

  Ok(message)
}

/// Strips the wrapping that models like to add around a commit message:
/// a markdown code fence and matching quotes.
pub fn clean_response(response: &str) -> String {
  let mut message = response.trim();

  if let Some(fenced) = message.strip_prefix("```") {
    // Drop the info string (```text) along with the fence
    let body = fenced.split_once('\n').map(|(_, body)| body).unwrap_or_default();
    message = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
  }

  for quote in ['"', '\'', '`'] {
    if message.len() >= 2 && message.starts_with(quote) && message.ends_with(quote) {
      message = message[1..message.len() - 1].trim();
      break;
    }
  }

  message.to_string()
}
