//! Recomm Violation Context Builder
//!
//! Extracts the minimal subgraph needed to reason about one violation: the
//! violated element, its neighbors within a bounded hop radius along an
//! allow-list of relation types, the governing clause, and the element's
//! recommendation history.
//!
//! # Examples
//!
//! ```no_run
//! use recomm_context::{ContextBuilder, ContextConfig};
//! use recomm_graph::SqliteGraph;
//! use std::sync::Arc;
//!
//! let graph = Arc::new(SqliteGraph::new("building.db").unwrap());
//! let builder = ContextBuilder::new(graph, ContextConfig::default());
//! ```

#![warn(missing_docs)]

mod builder;
mod config;
mod error;

pub use builder::ContextBuilder;
pub use config::ContextConfig;
pub use error::ContextError;
