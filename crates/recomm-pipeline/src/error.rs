//! Error types for pipeline runs

use thiserror::Error;

/// Errors that abort a whole pipeline run
///
/// Per-violation failures never surface here; they are reported as
/// [`ViolationOutcome`](crate::ViolationOutcome) variants.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Graph access failed before any violation was processed
    #[error("Graph error: {0}")]
    Graph(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
