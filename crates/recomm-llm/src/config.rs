//! Provider selection and settings

use crate::{AnyProvider, LlmError, MockProvider, OllamaProvider, OpenAiProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which provider backs the reasoner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Scripted mock; answers every prompt with an empty list
    Mock,
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions
    OpenAi,
}

/// LLM provider configuration (`[llm]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider backend
    pub provider: ProviderKind,

    /// Model name
    pub model: String,

    /// Endpoint or base URL; provider default when unset
    pub endpoint: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            model: "llama3.1".to_string(),
            endpoint: None,
            temperature: 0.2,
            request_timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Build the configured provider
    pub fn build(&self) -> Result<AnyProvider, LlmError> {
        self.validate().map_err(LlmError::Config)?;
        let timeout = Duration::from_secs(self.request_timeout_secs);
        let provider = match self.provider {
            ProviderKind::Mock => AnyProvider::Mock(MockProvider::default()),
            ProviderKind::Ollama => {
                let endpoint = self
                    .endpoint
                    .as_deref()
                    .unwrap_or(crate::ollama::DEFAULT_ENDPOINT);
                AnyProvider::Ollama(
                    OllamaProvider::new(endpoint, &self.model)
                        .with_temperature(self.temperature)
                        .with_request_timeout(timeout),
                )
            }
            ProviderKind::OpenAi => AnyProvider::OpenAi(
                OpenAiProvider::from_env(&self.model, self.endpoint.as_deref())?
                    .with_temperature(self.temperature)
                    .with_request_timeout(timeout),
            ),
        };
        tracing::info!(provider = ?self.provider, model = %self.model, "llm provider configured");
        Ok(provider)
    }
}
