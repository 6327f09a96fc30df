//! Error types shared across git-reword.
//!
//! Configuration problems are fatal and surface before any commit is touched.
//! Per-commit generation failures never reach this module's callers as errors:
//! the batch degrades them to "keep original" and only logs them.

use anyhow::Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("{provider} API key not found. Set it with --api-key, the OPENAI_API_KEY environment variable or `openai_api_key` in {path}")]
  MissingApiKey { provider: &'static str, path: String },

  #[error("Invalid or placeholder API key")]
  InvalidApiKey,

  #[error("Unknown provider '{0}' (expected one of: openai, ollama, claude)")]
  UnknownProvider(String),

  #[error("Invalid Ollama URL '{url}': {reason}")]
  InvalidOllamaUrl { url: String, reason: String },

  #[error("Failed to load configuration: {0}")]
  Load(#[from] config::ConfigError)
}

/// Checks if a provider failure looks like rejected credentials.
///
/// Only used to sharpen the verbose log line; the batch treats every
/// generation failure the same way.
///
/// ```
/// use anyhow::anyhow;
/// use reword::error::is_auth_error;
///
/// let error = anyhow!("invalid_api_key: Incorrect API key provided");
/// assert!(is_auth_error(&error));
/// ```
pub fn is_auth_error(error: &Error) -> bool {
  let msg = format!("{:#}", error).to_lowercase();

  msg.contains("invalid_api_key") ||
  msg.contains("incorrect api key") ||
  msg.contains("invalid api key") ||
  msg.contains("401 unauthorized") ||
  (msg.contains("authentication") && msg.contains("failed"))
}
