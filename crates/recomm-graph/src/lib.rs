//! Recomm Graph Access Layer
//!
//! Implements the `GraphAccess` trait over an embedded SQLite property graph.
//!
//! # Architecture
//!
//! - `elements` / `relations` tables hold the building model loaded by ingestion
//! - `clauses` and `violations` hold the compliance feed
//! - Violation and recommendation status is an append-only event log; the
//!   `violation_status` and `recommendation_status` views derive the current state
//! - Recommendation writes run in one IMMEDIATE transaction with an optimistic
//!   version check per addressed violation
//!
//! # Examples
//!
//! ```no_run
//! use recomm_graph::SqliteGraph;
//!
//! let graph = SqliteGraph::new("building.db").unwrap();
//! let (elements, relations) = graph.counts().unwrap();
//! println!("{} elements, {} relations", elements, relations);
//! ```

#![warn(missing_docs)]

mod error;
mod ingest;
mod sqlite;

pub use error::GraphError;
pub use ingest::{
    load_clauses, load_graph_dir, load_violations, GraphData, IngestReport, ViolationRecord,
};
pub use sqlite::SqliteGraph;
