use anyhow::{Context, Result};
use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::Ollama;
use url::Url;

use super::Provider;
use crate::error::ConfigError;

const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_PORT: u16 = 11434;

/// Completions from a local Ollama server.
pub struct OllamaProvider {
  client: Ollama,
  model:  String
}

impl OllamaProvider {
  pub fn new(url: &str, model: Option<String>) -> Result<Self, ConfigError> {
    let (host, port) = parse_endpoint(url)?;
    log::debug!("Ollama endpoint: {}:{}", host, port);

    Ok(Self {
      client: Ollama::new(host, port),
      model:  model.unwrap_or_else(|| DEFAULT_MODEL.to_string())
    })
  }
}

/// Splits `http://host:port` into the pieces `Ollama::new` expects.
fn parse_endpoint(url: &str) -> Result<(String, u16), ConfigError> {
  let invalid = |reason: &str| ConfigError::InvalidOllamaUrl { url: url.to_string(), reason: reason.to_string() };
  let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
  let host = parsed.host_str().ok_or_else(|| invalid("missing host"))?;

  Ok((format!("{}://{}", parsed.scheme(), host), parsed.port().unwrap_or(DEFAULT_PORT)))
}

#[async_trait]
impl Provider for OllamaProvider {
  async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
    // Ollama's completion endpoint takes one prompt, so the roles are spelled out
    let full_prompt = format!("### System:\n{}\n\n### User:\n{}\n\n### Assistant:", system, prompt);
    let request = GenerationRequest::new(self.model.clone(), full_prompt);

    let response = self
      .client
      .generate(request)
      .await
      .with_context(|| format!("Ollama request for model {} failed", self.model))?;

    Ok(response.response)
  }

  fn name(&self) -> &str {
    "ollama"
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_endpoint() {
    assert_eq!(parse_endpoint("http://localhost:11434").unwrap(), ("http://localhost".to_string(), 11434));
    assert_eq!(parse_endpoint("https://ollama.internal").unwrap(), ("https://ollama.internal".to_string(), 11434));
    assert!(matches!(parse_endpoint("not a url"), Err(ConfigError::InvalidOllamaUrl { .. })));
  }
}
