//! The `Reasoner` seam and its LLM-backed implementation

use crate::parser::parse_response;
use crate::prompt::{PromptBuilder, CANDIDATE_SCHEMA};
use crate::{ReasonerConfig, ReasonerError};
use async_trait::async_trait;
use recomm_domain::traits::LlmProvider;
use recomm_domain::{Candidate, Context};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Turns a context into candidate adaptations
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Propose up to `k` schema-valid candidates for the context
    ///
    /// Fewer than `k` may be returned. Fails with
    /// [`ReasonerError::ReasoningUnavailable`] when the provider stays
    /// unreachable after all retries and with [`ReasonerError::EmptyResult`]
    /// when no valid candidate came back.
    async fn propose(&self, context: &Context, k: usize) -> Result<Vec<Candidate>, ReasonerError>;

    /// Name recorded in recommendation provenance
    fn name(&self) -> &str;
}

/// Reasoner backed by an [`LlmProvider`]
pub struct LlmReasoner<L> {
    llm: Arc<L>,
    config: ReasonerConfig,
    name: String,
    calls: Arc<Semaphore>,
}

impl<L> LlmReasoner<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create a reasoner over a shared provider
    pub fn new(llm: Arc<L>, config: ReasonerConfig) -> Self {
        let name = format!("llm:{}", llm.model_name());
        let calls = Arc::new(Semaphore::new(config.max_concurrent_calls.max(1)));
        Self {
            llm,
            config,
            name,
            calls,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// Call the LLM provider once
    async fn call_llm(&self, prompt: &str) -> Result<String, ReasonerError> {
        let llm = Arc::clone(&self.llm);
        let prompt = prompt.to_string();
        let permit = Arc::clone(&self.calls)
            .acquire_owned()
            .await
            .map_err(|e| ReasonerError::ReasoningUnavailable(e.to_string()))?;

        // The provider is synchronous; a timed-out call keeps running on the
        // blocking pool, holding its permit until the provider returns
        let call = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            llm.generate_structured(&prompt, CANDIDATE_SCHEMA)
                .map_err(|e| ReasonerError::ReasoningUnavailable(e.to_string()))
        });

        match timeout(self.config.timeout(), call).await {
            Ok(joined) => joined.map_err(|e| {
                ReasonerError::ReasoningUnavailable(format!("Task join error: {}", e))
            })?,
            Err(_) => Err(ReasonerError::ReasoningUnavailable(format!(
                "timed out after {}s",
                self.config.timeout_secs
            ))),
        }
    }
}

#[async_trait]
impl<L> Reasoner for LlmReasoner<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    async fn propose(&self, context: &Context, k: usize) -> Result<Vec<Candidate>, ReasonerError> {
        if k == 0 {
            return Err(ReasonerError::Config("k must be greater than 0".to_string()));
        }
        let standard = self.config.standard_suggestions(k);
        let prompt = PromptBuilder::new(context).with_counts(k, standard).build();
        let violation = &context.violation.id;

        let mut attempt: u32 = 0;
        let response = loop {
            match self.call_llm(&prompt).await {
                Ok(response) => break response,
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        violation = %violation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "reasoner call failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(violation = %violation, attempts = attempt + 1, "reasoning unavailable: {}", e);
                    return Err(e);
                }
            }
        };

        let parsed = parse_response(
            &response,
            context,
            k,
            standard,
            self.config.max_description_len,
        );
        debug!(
            violation = %violation,
            kept = parsed.candidates.len(),
            discarded = parsed.discarded,
            "response parsed"
        );

        if parsed.candidates.is_empty() {
            info!(violation = %violation, "no valid candidates, needs manual review");
            return Err(ReasonerError::EmptyResult {
                discarded: parsed.discarded,
            });
        }
        Ok(parsed.candidates)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
