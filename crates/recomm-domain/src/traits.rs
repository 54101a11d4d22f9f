//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{
    Clause, ClauseId, Element, ElementId, Recommendation, RecommendationId, RecommendationStatus,
    RelationType, Severity, Violation, ViolationId, ViolationStatus,
};
use std::collections::BTreeMap;

/// Typed read/write interface over the building property graph
///
/// Implemented by the infrastructure layer (recomm-graph). Every read is a
/// point-in-time snapshot. Writes either commit fully or not at all; a write
/// that lost an optimistic race reports [`WriteAck::Conflict`] rather than an
/// error.
pub trait GraphAccess {
    /// Error type for graph operations
    type Error;

    /// Get an element by id
    fn fetch_element(&self, id: &ElementId) -> Result<Option<Element>, Self::Error>;

    /// Elements reachable from `id` within `max_hops` along the given relation
    /// types, in either edge direction, sorted by id and excluding `id` itself
    fn fetch_neighbors(
        &self,
        id: &ElementId,
        relation_types: &[RelationType],
        max_hops: u32,
    ) -> Result<Vec<Element>, Self::Error>;

    /// Read everything a violation context is built from in one snapshot
    ///
    /// Returns `None` when the element does not exist. `neighbors` follows
    /// [`fetch_neighbors`](Self::fetch_neighbors); `recommendations` are the
    /// element's history and stay empty unless `include_history` is set. The
    /// default composes the single reads, so implementations that can should
    /// answer from one transaction instead.
    fn fetch_neighborhood(
        &self,
        element_id: &ElementId,
        clause_id: &ClauseId,
        relation_types: &[RelationType],
        max_hops: u32,
        include_history: bool,
    ) -> Result<Option<Neighborhood>, Self::Error> {
        let Some(element) = self.fetch_element(element_id)? else {
            return Ok(None);
        };
        let recommendations = if include_history {
            self.fetch_recommendations_for_element(element_id)?
        } else {
            Vec::new()
        };
        Ok(Some(Neighborhood {
            element,
            clause: self.fetch_clause(clause_id)?,
            neighbors: self.fetch_neighbors(element_id, relation_types, max_hops)?,
            recommendations,
        }))
    }

    /// Get a clause by id
    fn fetch_clause(&self, id: &ClauseId) -> Result<Option<Clause>, Self::Error>;

    /// Get a violation by id, with its current status and version
    fn fetch_violation(&self, id: &ViolationId) -> Result<Option<Violation>, Self::Error>;

    /// Open violations matching the filter, ordered by id
    fn fetch_open_violations(&self, filter: &ViolationFilter) -> Result<Vec<Violation>, Self::Error>;

    /// Get a recommendation by id, with its current status
    fn fetch_recommendation(
        &self,
        id: RecommendationId,
    ) -> Result<Option<Recommendation>, Self::Error>;

    /// All recommendations addressing a violation, oldest first
    fn fetch_recommendations_for_violation(
        &self,
        id: &ViolationId,
    ) -> Result<Vec<Recommendation>, Self::Error>;

    /// All recommendations targeting an element, oldest first
    fn fetch_recommendations_for_element(
        &self,
        id: &ElementId,
    ) -> Result<Vec<Recommendation>, Self::Error>;

    /// Atomically write a recommendation node plus its edges
    fn write_recommendation(&self, write: &RecommendationWrite) -> Result<WriteAck, Self::Error>;

    /// Append a status event for a recommendation
    fn append_recommendation_event(
        &self,
        id: RecommendationId,
        status: RecommendationStatus,
        reason: &str,
    ) -> Result<(), Self::Error>;

    /// Append a status event for a violation if its version still matches
    fn append_violation_event(
        &self,
        id: &ViolationId,
        expected_version: u64,
        status: ViolationStatus,
        reason: &str,
    ) -> Result<WriteAck, Self::Error>;
}

/// A violated element with its clause, surroundings, and history
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    /// The violated element
    pub element: Element,

    /// The violated clause, if it exists
    pub clause: Option<Clause>,

    /// Reachable elements, sorted by id, excluding `element`
    pub neighbors: Vec<Element>,

    /// Recommendations targeting `element`, oldest first
    pub recommendations: Vec<Recommendation>,
}

/// Criteria for selecting open violations
#[derive(Debug, Clone, Default)]
pub struct ViolationFilter {
    /// Only violations at or above this severity
    pub min_severity: Option<Severity>,

    /// Only violations of this clause
    pub clause_id: Option<ClauseId>,

    /// Only violations on this element
    pub element_id: Option<ElementId>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// How a recommendation write affects the addressed violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Store as accepted: supersede prior live recommendations and mark the
    /// violations addressed
    Accept,
    /// Store as a proposed alternative without touching violation status
    Propose,
}

/// An atomic recommendation write
#[derive(Debug, Clone)]
pub struct RecommendationWrite {
    /// The recommendation to store
    pub recommendation: Recommendation,

    /// Accept or propose
    pub mode: WriteMode,

    /// Violation versions the writer observed; a mismatch is a conflict
    pub expected_versions: BTreeMap<ViolationId, u64>,
}

/// Result of a conditional write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAck {
    /// The write committed; carries the new version of each touched violation
    Committed {
        /// Violation versions after the write
        versions: BTreeMap<ViolationId, u64>,
    },
    /// A violation changed since the writer observed it; nothing was written
    Conflict {
        /// The violation whose version moved
        violation_id: ViolationId,
        /// Version the writer expected
        expected: u64,
        /// Version found in the store
        actual: u64,
    },
}

impl WriteAck {
    /// Whether the write committed
    pub fn is_committed(&self) -> bool {
        matches!(self, WriteAck::Committed { .. })
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (recomm-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output expected to conform to the described JSON schema
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;

    /// Name of the backing model, used for provenance
    fn model_name(&self) -> &str {
        "llm"
    }
}
