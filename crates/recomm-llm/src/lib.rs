//! Recomm LLM Provider Layer
//!
//! Pluggable LLM provider implementations behind the `LlmProvider` trait from
//! `recomm-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: OpenAI-compatible chat completions (OpenAI, OpenRouter)
//!
//! Providers make exactly one request per call. Retry and backoff policy
//! belongs to the caller.
//!
//! # Examples
//!
//! ```
//! use recomm_llm::MockProvider;
//! use recomm_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("[]");
//! provider.push_response(r#"[{"targets": ["E1"]}]"#);
//! assert_eq!(provider.generate("first").unwrap(), r#"[{"targets": ["E1"]}]"#);
//! assert_eq!(provider.generate("second").unwrap(), "[]");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;
pub mod openai;

use recomm_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use config::{LlmConfig, ProviderKind};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider is misconfigured (missing key, bad endpoint)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Run a provider future to completion from synchronous code
///
/// Uses the ambient runtime when called from a blocking-pool thread, and a
/// throwaway current-thread runtime otherwise.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, LlmError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(future)),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
            Ok(runtime.block_on(future))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
enum Scripted {
    Response(String),
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Scripted responses are consumed in order; once the script is exhausted,
/// prompt-keyed responses and then the default response apply.
///
/// # Examples
///
/// ```
/// use recomm_llm::MockProvider;
/// use recomm_domain::traits::LlmProvider;
///
/// let provider = MockProvider::new("fallback");
/// provider.push_error("provider down");
/// provider.push_response("recovered");
/// assert!(provider.generate("p").is_err());
/// assert_eq!(provider.generate("p").unwrap(), "recovered");
/// assert_eq!(provider.generate("p").unwrap(), "fallback");
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    call_count: Arc<Mutex<usize>>,
    last_prompt: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
            delay: None,
        }
    }

    /// Sleep this long before answering, to exercise caller timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).insert(prompt.into(), response.into());
    }

    /// Queue a response for the next unanswered call
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.script).push_back(Scripted::Response(response.into()));
    }

    /// Queue a failure for the next unanswered call
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.script).push_back(Scripted::Error(message.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }

    /// The most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        lock(&self.last_prompt).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *lock(&self.call_count) += 1;
        *lock(&self.last_prompt) = Some(prompt.to_string());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if let Some(next) = lock(&self.script).pop_front() {
            return match next {
                Scripted::Response(response) => Ok(response),
                Scripted::Error(message) => Err(LlmError::Communication(message)),
            };
        }

        if let Some(response) = lock(&self.responses).get(prompt) {
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Provider selected at runtime from configuration
pub enum AnyProvider {
    /// Scripted mock
    Mock(MockProvider),
    /// Local Ollama
    Ollama(OllamaProvider),
    /// OpenAI-compatible endpoint
    OpenAi(OpenAiProvider),
}

impl LlmProviderTrait for AnyProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        match self {
            AnyProvider::Mock(p) => p.generate(prompt),
            AnyProvider::Ollama(p) => LlmProviderTrait::generate(p, prompt),
            AnyProvider::OpenAi(p) => LlmProviderTrait::generate(p, prompt),
        }
    }

    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error> {
        match self {
            AnyProvider::Mock(p) => p.generate_structured(prompt, schema),
            AnyProvider::Ollama(p) => LlmProviderTrait::generate_structured(p, prompt, schema),
            AnyProvider::OpenAi(p) => LlmProviderTrait::generate_structured(p, prompt, schema),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            AnyProvider::Mock(p) => p.model_name(),
            AnyProvider::Ollama(p) => p.model_name(),
            AnyProvider::OpenAi(p) => p.model_name(),
        }
    }
}
