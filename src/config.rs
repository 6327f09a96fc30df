use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use config::{Config, Environment, FileFormat};

use crate::error::ConfigError;

// Constants
const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_CLAUDE_COMMAND: &str = "claude";
const DEFAULT_MIN_QUALITY_SCORE: u8 = 7;
const DEFAULT_DELAY_MS: u64 = 1000;
const DEFAULT_TIMEOUT: u64 = 120;
const ENV_PREFIX: &str = "GIT_REWORD";
pub const PLACEHOLDER_API_KEY: &str = "<PLACE HOLDER FOR YOUR API KEY>";

/// Raw settings as read from the config file, the environment and the CLI.
/// Every field is optional so layers can be merged.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct App {
  pub provider:          Option<String>,
  pub model:             Option<String>,
  pub openai_api_key:    Option<String>,
  pub ollama_url:        Option<String>,
  pub claude_command:    Option<String>,
  pub timeout:           Option<u64>,
  pub min_quality_score: Option<u8>,
  pub skip_well_formed:  Option<bool>,
  pub template:          Option<String>,
  pub language:          Option<String>,
  pub prompt:            Option<String>,
  pub delay_ms:          Option<u64>
}

/// Settings that stay fixed for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
  pub min_quality_score: u8,
  pub skip_well_formed:  bool,
  pub template:          Option<String>,
  pub language:          String,
  pub custom_prompt:     Option<String>,
  pub delay:             Duration
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
      skip_well_formed:  true,
      template:          None,
      language:          DEFAULT_LANGUAGE.to_string(),
      custom_prompt:     None,
      delay:             Duration::from_millis(DEFAULT_DELAY_MS)
    }
  }
}

/// Everything a provider needs to be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
  pub provider:       String,
  pub model:          Option<String>,
  pub openai_api_key: Option<String>,
  pub ollama_url:     String,
  pub claude_command: String,
  pub timeout:        Duration
}

impl Default for ProviderSettings {
  fn default() -> Self {
    App::default().provider_settings()
  }
}

#[derive(Debug)]
pub struct ConfigPaths {
  pub file: PathBuf
}

impl ConfigPaths {
  pub fn new() -> Option<Self> {
    let file = home::home_dir()?.join(".config/git-reword/config.ini");
    Some(Self { file })
  }

  pub fn display() -> String {
    Self::new()
      .map(|paths| paths.file.display().to_string())
      .unwrap_or_else(|| "~/.config/git-reword/config.ini".to_string())
  }
}

impl App {
  /// Loads `~/.config/git-reword/config.ini` (if present) under `GIT_REWORD_*` environment variables.
  pub fn new() -> Result<Self, ConfigError> {
    dotenv::dotenv().ok();
    let paths = ConfigPaths::new();
    Self::load_from(paths.as_ref().map(|paths| paths.file.as_path()))
  }

  pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
    let mut builder = Config::builder()
      .set_default("provider", DEFAULT_PROVIDER)?
      .set_default("language", DEFAULT_LANGUAGE)?
      .set_default("ollama_url", DEFAULT_OLLAMA_URL)?
      .set_default("claude_command", DEFAULT_CLAUDE_COMMAND)?
      .set_default("timeout", DEFAULT_TIMEOUT)?
      .set_default("min_quality_score", DEFAULT_MIN_QUALITY_SCORE as u64)?
      .set_default("skip_well_formed", true)?
      .set_default("delay_ms", DEFAULT_DELAY_MS)?;

    if let Some(file) = file {
      log::debug!("Reading config from {}", file.display());
      builder = builder.add_source(config::File::new(file.to_string_lossy().as_ref(), FileFormat::Ini).required(false));
    }

    let config = builder
      .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
      .build()?;

    Ok(config.try_deserialize()?)
  }

  /// Layers `overrides` on top of `self`; set fields in `overrides` win.
  pub fn merge(self, overrides: App) -> App {
    App {
      provider:          overrides.provider.or(self.provider),
      model:             overrides.model.or(self.model),
      openai_api_key:    overrides.openai_api_key.or(self.openai_api_key),
      ollama_url:        overrides.ollama_url.or(self.ollama_url),
      claude_command:    overrides.claude_command.or(self.claude_command),
      timeout:           overrides.timeout.or(self.timeout),
      min_quality_score: overrides.min_quality_score.or(self.min_quality_score),
      skip_well_formed:  overrides.skip_well_formed.or(self.skip_well_formed),
      template:          overrides.template.or(self.template),
      language:          overrides.language.or(self.language),
      prompt:            overrides.prompt.or(self.prompt),
      delay_ms:          overrides.delay_ms.or(self.delay_ms)
    }
  }

  pub fn run_config(&self) -> RunConfig {
    let defaults = RunConfig::default();

    RunConfig {
      min_quality_score: self.min_quality_score.unwrap_or(defaults.min_quality_score),
      skip_well_formed:  self.skip_well_formed.unwrap_or(defaults.skip_well_formed),
      template:          non_empty(&self.template),
      language:          non_empty(&self.language).unwrap_or(defaults.language),
      custom_prompt:     non_empty(&self.prompt),
      delay:             self.delay_ms.map(Duration::from_millis).unwrap_or(defaults.delay)
    }
  }

  pub fn provider_settings(&self) -> ProviderSettings {
    ProviderSettings {
      provider:       non_empty(&self.provider).unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
      model:          non_empty(&self.model),
      openai_api_key: non_empty(&self.openai_api_key),
      ollama_url:     non_empty(&self.ollama_url).unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
      claude_command: non_empty(&self.claude_command).unwrap_or_else(|| DEFAULT_CLAUDE_COMMAND.to_string()),
      timeout:        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
    }
  }
}

fn non_empty(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .map(str::to_string)
}
