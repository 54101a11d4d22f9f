//! OpenAI-compatible chat completions provider
//!
//! Works against OpenAI itself and against OpenRouter or any other service
//! exposing `/chat/completions`.

use crate::ollama::build_client;
use crate::{block_on, LlmError};
use recomm_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variables checked for an API key, in order
pub const API_KEY_VARS: [&str; 2] = ["OPENROUTER_API_KEY", "OPENAI_API_KEY"];

/// Environment variable overriding the base URL
pub const BASE_URL_VAR: &str = "OPENROUTER_BASE_URL";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are a building-compliance assistant. \
Answer only with a single JSON document and no surrounding prose.";

/// Chat completions provider
pub struct OpenAiProvider {
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider with an explicit key and base URL
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.0,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Create a provider from `OPENROUTER_API_KEY` / `OPENAI_API_KEY`
    ///
    /// The base URL is `base_url` if given, else `OPENROUTER_BASE_URL`, else
    /// the OpenAI default.
    pub fn from_env(model: impl Into<String>, base_url: Option<&str>) -> Result<Self, LlmError> {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                LlmError::Config(format!("Missing {} or {}", API_KEY_VARS[0], API_KEY_VARS[1]))
            })?;
        let base_url = base_url
            .map(str::to_string)
            .or_else(|| std::env::var(BASE_URL_VAR).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(base_url, model, api_key))
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the HTTP request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Send one chat completion request
    pub async fn complete(&self, prompt: &str, json_mode: bool) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        match status {
            reqwest::StatusCode::NOT_FOUND => {
                return Err(LlmError::ModelNotAvailable(self.model.clone()))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(LlmError::RateLimitExceeded),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                return Err(LlmError::Config(format!("HTTP {}: check the API key", status)))
            }
            _ => {}
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        first_content(parsed)
    }
}

fn first_content(response: ChatResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response has no content".to_string()))
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        block_on(self.complete(prompt, false))?
    }

    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error> {
        let prompt = format!("{}\n\nRespond with JSON matching this schema:\n{}", prompt, schema);
        block_on(self.complete(&prompt, true))?
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
