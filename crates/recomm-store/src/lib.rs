//! Recomm Recommendation Store
//!
//! Lifecycle operations over stored recommendations: accepting, proposing,
//! rejecting, and reopening, each checked against the violation state machine
//! before it reaches the graph.
//!
//! # Examples
//!
//! ```no_run
//! use recomm_graph::SqliteGraph;
//! use recomm_store::RecommendationStore;
//! use std::sync::Arc;
//!
//! let store = RecommendationStore::new(Arc::new(SqliteGraph::new("building.db").unwrap()));
//! // let ack = store.accept(recommendation)?;
//! ```

#![warn(missing_docs)]

mod error;
mod store;

pub use error::StoreError;
pub use store::RecommendationStore;
