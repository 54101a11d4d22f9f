//! Graph access error types

use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored JSON could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Ingestion file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A referenced node does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A node with the same id already exists
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Status change not allowed by the lifecycle rules
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Connection mutex was poisoned by a panicking writer
    #[error("Lock error: {0}")]
    Lock(String),
}
