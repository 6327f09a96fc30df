use async_openai::types::{ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::Client;
use async_trait::async_trait;
use anyhow::{anyhow, Context, Result};

use super::Provider;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 256;
const TEMPERATURE: f32 = 0.3;

/// Chat completions against the OpenAI API.
pub struct OpenAIProvider {
  client: Client<OpenAIConfig>,
  model:  String
}

impl OpenAIProvider {
  pub fn new(api_key: String, model: Option<String>) -> Self {
    let config = OpenAIConfig::new().with_api_key(api_key);

    Self {
      client: Client::with_config(config),
      model:  model.unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }
  }
}

#[async_trait]
impl Provider for OpenAIProvider {
  async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
    let request = CreateChatCompletionRequestArgs::default()
      .max_tokens(MAX_TOKENS)
      .temperature(TEMPERATURE)
      .model(self.model.as_str())
      .messages([
        ChatCompletionRequestSystemMessageArgs::default()
          .content(system.to_string())
          .build()?
          .into(),
        ChatCompletionRequestUserMessageArgs::default()
          .content(prompt.to_string())
          .build()?
          .into()
      ])
      .build()?;

    let response = self.client.chat().create(request).await.map_err(|err| {
      match err {
        OpenAIError::ApiError(e) => anyhow!("OpenAI API error: {}", e.message),
        OpenAIError::Reqwest(e) => anyhow!("Network error while calling OpenAI: {}", e),
        other => anyhow!("Unexpected OpenAI error: {}", other)
      }
    })?;

    response
      .choices
      .first()
      .context("No choices returned")?
      .message
      .content
      .clone()
      .context("No content returned")
  }

  fn name(&self) -> &str {
    "openai"
  }
}
