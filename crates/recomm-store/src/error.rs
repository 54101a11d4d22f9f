//! Store error types

use thiserror::Error;

/// Errors that can occur during recommendation lifecycle operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Recommendation, violation, or element not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The recommendation breaks a structural invariant
    #[error("Invalid recommendation: {0}")]
    InvalidRecommendation(String),

    /// The requested status change is not allowed
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Graph access failed
    #[error("Graph error: {0}")]
    Graph(String),
}
