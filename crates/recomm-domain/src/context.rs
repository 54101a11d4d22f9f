//! Violation-scoped reasoning context

use crate::{Clause, Element, ElementId, Recommendation, RelationType, Violation};
use serde::{Deserialize, Serialize};

/// An element reached from the violated element during context expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// The neighboring element
    pub element: Element,
    /// Minimum number of hops from the violated element
    pub hops: u32,
    /// Relation through which the element was first reached
    pub via: RelationType,
}

/// The minimal subgraph needed to reason about one violation
///
/// Built fresh per violation and never persisted. Two contexts built from the
/// same graph snapshot with the same hop limit compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// The violation being reasoned about
    pub violation: Violation,

    /// The offending element
    pub element: Element,

    /// The governing clause
    pub clause: Clause,

    /// Elements within the hop radius, sorted by (hops, id)
    pub neighbors: Vec<Neighbor>,

    /// Earlier recommendations for the element, including superseded ones
    pub prior_recommendations: Vec<Recommendation>,

    /// Hop radius used to build this context
    pub hop_radius: u32,
}

impl Context {
    /// Whether an element is part of this context
    pub fn contains(&self, id: &ElementId) -> bool {
        &self.element.id == id || self.neighbors.iter().any(|n| &n.element.id == id)
    }

    /// Look up an element of this context by id
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        if &self.element.id == id {
            return Some(&self.element);
        }
        self.neighbors
            .iter()
            .map(|n| &n.element)
            .find(|e| &e.id == id)
    }

    /// Total number of elements (violated element plus neighbors)
    pub fn node_count(&self) -> usize {
        1 + self.neighbors.len()
    }
}
