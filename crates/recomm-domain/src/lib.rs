//! Recomm Domain Layer
//!
//! Core model of the graph-grounded recommendation engine. This crate has no
//! infrastructure dependencies; it defines the value objects and the trait
//! interfaces that the graph, LLM, and pipeline crates implement or consume.
//!
//! ## Key Concepts
//!
//! - **Element**: a building-model entity (wall, door, space) with typed properties
//! - **Clause**: a regulatory requirement with a machine-checkable predicate
//! - **Violation**: an Element/Clause pair flagged non-compliant by an external checker
//! - **Context**: a violation-scoped, bounded-hop subgraph handed to reasoning
//! - **Candidate**: an unvalidated adaptation proposed by reasoning
//! - **Recommendation**: a validated, ranked Candidate attached to Violations
//!
//! ## Architecture
//!
//! - Pure data and state-machine rules only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod clause;
pub mod context;
pub mod element;
pub mod ids;
pub mod recommendation;
pub mod traits;
pub mod violation;

// Re-exports for convenience
pub use candidate::{Candidate, PropertyChange, SuggestionStyle};
pub use clause::{Clause, Predicate, PredicateRule, Severity};
pub use context::{Context, Neighbor};
pub use element::{Direction, Element, PropertyValue, Relation, RelationCategory, RelationType};
pub use ids::{ClauseId, ElementId, RecommendationId, ViolationId};
pub use recommendation::{Outcome, Provenance, Recommendation, RecommendationStatus};
pub use violation::{Violation, ViolationStatus};

/// Current timestamp in seconds since the Unix epoch
///
/// Returns 0 if the system clock is set before the epoch.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
