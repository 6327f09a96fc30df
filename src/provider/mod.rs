//! Text generation backends.
//!
//! The rest of the crate only sees [`Provider`]; [`from_settings`] picks the
//! concrete backend from the configured tag.

mod claude;
mod ollama;
mod openai;

use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;

pub use self::claude::ClaudeProvider;
pub use self::ollama::OllamaProvider;
pub use self::openai::OpenAIProvider;
use crate::config::{ConfigPaths, ProviderSettings, PLACEHOLDER_API_KEY};
use crate::error::ConfigError;

/// Something that turns a prompt into a commit message suggestion.
#[async_trait]
pub trait Provider: Send + Sync {
  async fn generate(&self, prompt: &str, system: &str) -> Result<String>;

  /// Name of this provider (for logging)
  fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
  OpenAI,
  Ollama,
  Claude
}

impl FromStr for ProviderKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "openai" => Ok(ProviderKind::OpenAI),
      "ollama" => Ok(ProviderKind::Ollama),
      "claude" | "claude-cli" => Ok(ProviderKind::Claude),
      other => Err(ConfigError::UnknownProvider(other.to_string()))
    }
  }
}

impl Display for ProviderKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ProviderKind::OpenAI => "openai",
      ProviderKind::Ollama => "ollama",
      ProviderKind::Claude => "claude"
    };
    write!(f, "{}", name)
  }
}

/// Builds the configured provider. Fails before any network or process call
/// when the configuration cannot work.
pub fn from_settings(settings: &ProviderSettings) -> Result<Box<dyn Provider>, ConfigError> {
  let kind: ProviderKind = settings.provider.parse()?;
  log::debug!("Using provider: {}", kind);

  let provider: Box<dyn Provider> = match kind {
    ProviderKind::OpenAI => {
      let api_key = get_api_key(settings)?;
      Box::new(OpenAIProvider::new(api_key, settings.model.clone()))
    }
    ProviderKind::Ollama => Box::new(OllamaProvider::new(&settings.ollama_url, settings.model.clone())?),
    ProviderKind::Claude => Box::new(ClaudeProvider::new(settings.claude_command.clone(), settings.timeout))
  };

  Ok(provider)
}

/// Gets the OpenAI API key from settings or the environment
pub fn get_api_key(settings: &ProviderSettings) -> Result<String, ConfigError> {
  if let Some(key) = &settings.openai_api_key {
    return validate_api_key(Some(key.as_str())).map(str::to_string);
  }

  if let Ok(key) = std::env::var("OPENAI_API_KEY") {
    return validate_api_key(Some(key.as_str())).map(str::to_string);
  }

  Err(ConfigError::MissingApiKey { provider: "OpenAI", path: ConfigPaths::display() })
}

/// Validates an API key is present and not the placeholder
pub fn validate_api_key(key: Option<&str>) -> Result<&str, ConfigError> {
  match key.map(str::trim) {
    None => Err(ConfigError::MissingApiKey { provider: "OpenAI", path: ConfigPaths::display() }),
    Some(k) if k.is_empty() || k == PLACEHOLDER_API_KEY => Err(ConfigError::InvalidApiKey),
    Some(k) => Ok(k)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_provider_kind_from_str() {
    assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
    assert_eq!("Ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
    assert_eq!("claude-cli".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
    assert!(matches!("gemini".parse::<ProviderKind>(), Err(ConfigError::UnknownProvider(name)) if name == "gemini"));
  }

  #[test]
  fn test_validate_api_key() {
    assert!(validate_api_key(None).is_err());
    assert!(validate_api_key(Some("")).is_err());
    assert!(validate_api_key(Some(PLACEHOLDER_API_KEY)).is_err());
    assert_eq!(validate_api_key(Some(" sk-valid ")).unwrap(), "sk-valid");
  }

  #[test]
  fn test_unknown_provider_is_config_error() {
    let settings = ProviderSettings { provider: "gemini".into(), ..ProviderSettings::default() };
    assert!(matches!(from_settings(&settings), Err(ConfigError::UnknownProvider(_))));
  }

  #[test]
  fn test_local_providers_need_no_key() {
    let settings = ProviderSettings { provider: "ollama".into(), ..ProviderSettings::default() };
    assert_eq!(from_settings(&settings).unwrap().name(), "ollama");

    let settings = ProviderSettings { provider: "claude".into(), ..ProviderSettings::default() };
    assert_eq!(from_settings(&settings).unwrap().name(), "claude");
  }

  #[test]
  fn test_openai_with_configured_key() {
    let settings = ProviderSettings {
      provider: "openai".into(),
      openai_api_key: Some("sk-test-key".into()),
      ..ProviderSettings::default()
    };
    assert_eq!(from_settings(&settings).unwrap().name(), "openai");
  }
}
