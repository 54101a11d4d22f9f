//! Error types for the Reasoner

use thiserror::Error;

/// Errors that can occur while proposing candidates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReasonerError {
    /// Transport or provider failure, including timeouts; retried
    #[error("Reasoning unavailable: {0}")]
    ReasoningUnavailable(String),

    /// No schema-valid candidate was produced; needs manual review
    #[error("Empty result: no valid candidates ({discarded} discarded)")]
    EmptyResult {
        /// Items that failed the output schema
        discarded: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReasonerError {
    /// Whether resending the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ReasonerError::ReasoningUnavailable(_))
    }
}
