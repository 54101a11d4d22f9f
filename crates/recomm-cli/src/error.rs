//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Graph error
    #[error(transparent)]
    Graph(#[from] recomm_graph::GraphError),

    /// LLM provider error
    #[error(transparent)]
    Llm(#[from] recomm_llm::LlmError),

    /// Validator setup error
    #[error(transparent)]
    Validator(#[from] recomm_validator::ValidatorError),

    /// Recommendation store error
    #[error(transparent)]
    Store(#[from] recomm_store::StoreError),

    /// Pipeline error
    #[error(transparent)]
    Pipeline(#[from] recomm_pipeline::PipelineError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
