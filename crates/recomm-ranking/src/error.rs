//! Ranking error types

use recomm_domain::ElementId;
use thiserror::Error;

/// Errors that can occur while merging proposals
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    /// The proposals share no target element
    #[error("Proposals share no target element")]
    NotPartners,

    /// The proposals change a shared property to different values
    #[error("Incompatible changes to {element}.{property}")]
    Incompatible {
        /// Shared element
        element: ElementId,
        /// Property changed differently
        property: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
