//! Recomm Recommendation Reasoner
//!
//! Turns a violation context into candidate adaptations using an LLM.
//!
//! # Pipeline
//!
//! 1. Build a prompt from the context (element, neighbors, clause, history)
//! 2. Call the LLM on the blocking pool under a per-call timeout
//! 3. Parse the response and discard every item that breaks the output schema
//! 4. Deduplicate and truncate to the requested count
//!
//! Transport failures and timeouts are retried with exponential backoff. A
//! response with no valid candidate is final.
//!
//! # Examples
//!
//! ```no_run
//! use recomm_reasoner::{LlmReasoner, Reasoner, ReasonerConfig};
//! use recomm_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example(context: recomm_domain::Context) {
//! let reasoner = LlmReasoner::new(Arc::new(MockProvider::default()), ReasonerConfig::default());
//! let candidates = reasoner.propose(&context, 5).await;
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod parser;
mod prompt;
mod reasoner;

pub use config::ReasonerConfig;
pub use error::ReasonerError;
pub use parser::{parse_response, ParsedResponse};
pub use prompt::{PromptBuilder, CANDIDATE_SCHEMA};
pub use reasoner::{LlmReasoner, Reasoner};
