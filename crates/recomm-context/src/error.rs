//! Error types for the Context Builder

use recomm_domain::{ClauseId, ElementId};
use thiserror::Error;

/// Errors that can occur while building a violation context
#[derive(Error, Debug)]
pub enum ContextError {
    /// The violated element is not in the graph
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    /// The violated clause is not in the graph
    #[error("Clause not found: {0}")]
    ClauseNotFound(ClauseId),

    /// Expansion reached more elements than the cap allows
    #[error("Context too large: {count} elements (max: {cap})")]
    ContextTooLarge {
        /// Elements reached when expansion stopped
        count: usize,
        /// Configured cap
        cap: usize,
    },

    /// Graph access failed
    #[error("Graph error: {0}")]
    Graph(String),
}
