//! Stored, ranked recommendations

use crate::{
    ClauseId, ElementId, PropertyChange, PropertyValue, RecommendationId, SuggestionStyle,
    ViolationId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status of a stored recommendation
///
/// Content never changes after storage; only the status moves, and only
/// forward: Proposed/Accepted → Superseded, and any live status → Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    /// Ranked alternative, not acted on
    Proposed,
    /// The recommendation currently addressing its violations
    Accepted,
    /// Replaced by a newer reasoning pass
    Superseded,
    /// Rejected upstream
    Rejected,
}

impl RecommendationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Proposed => "proposed",
            RecommendationStatus::Accepted => "accepted",
            RecommendationStatus::Superseded => "superseded",
            RecommendationStatus::Rejected => "rejected",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "proposed" => Some(RecommendationStatus::Proposed),
            "accepted" => Some(RecommendationStatus::Accepted),
            "superseded" => Some(RecommendationStatus::Superseded),
            "rejected" => Some(RecommendationStatus::Rejected),
            _ => None,
        }
    }

    /// Proposed or Accepted
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            RecommendationStatus::Proposed | RecommendationStatus::Accepted
        )
    }

    /// Whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: RecommendationStatus) -> bool {
        matches!(
            (self, next),
            (RecommendationStatus::Proposed, RecommendationStatus::Superseded)
                | (RecommendationStatus::Accepted, RecommendationStatus::Superseded)
                | (RecommendationStatus::Proposed, RecommendationStatus::Rejected)
                | (RecommendationStatus::Accepted, RecommendationStatus::Rejected)
                | (RecommendationStatus::Superseded, RecommendationStatus::Rejected)
        )
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicted outcome of a recommendation for one violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Clause that was violated
    pub clause_id: ClauseId,
    /// Property the clause constrains
    pub property: String,
    /// Predicted value after the change
    pub predicted_value: PropertyValue,
    /// Distance from the nearest compliant boundary after the change
    pub residual: f64,
}

/// Where a recommendation came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Clauses of the addressed violations
    pub clause_ids: Vec<ClauseId>,
    /// Hop radius of the context the reasoning saw
    pub hop_radius: u32,
    /// Reasoner or model that produced the candidate
    pub reasoner: String,
    /// Violation versions the reasoning was based on
    pub based_on_versions: BTreeMap<ViolationId, u64>,
}

/// A validated, ranked candidate attached to one or more violations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Unique identifier
    pub id: RecommendationId,

    /// Violations addressed (exactly one unless merged), sorted
    pub violation_ids: Vec<ViolationId>,

    /// Elements touched by the adaptation, sorted
    pub target_elements: Vec<ElementId>,

    /// What to change
    pub description: String,

    /// Every property change, sorted by (element, property)
    pub changes: Vec<PropertyChange>,

    /// Predicted outcome per violation
    pub outcomes: BTreeMap<ViolationId, Outcome>,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Rank within its violation (1 = best)
    pub rank: u32,

    /// Standard or creative
    pub style: SuggestionStyle,

    /// Current status (derived from the event log)
    pub status: RecommendationStatus,

    /// Violations whose recommendations contradict this one on a shared element
    pub conflicts_with: Vec<ViolationId>,

    /// Source violations, clauses, and context radius
    pub provenance: Provenance,

    /// Creation timestamp (seconds since Unix epoch)
    pub created_at: u64,
}

impl Recommendation {
    /// Whether this is a merged recommendation covering several violations
    pub fn is_merged(&self) -> bool {
        self.violation_ids.len() > 1
    }

    /// Whether the recommendation addresses the given violation
    pub fn addresses(&self, id: &ViolationId) -> bool {
        self.violation_ids.iter().any(|v| v == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use RecommendationStatus::*;
        assert!(Accepted.can_transition_to(Superseded));
        assert!(Superseded.can_transition_to(Rejected));
        assert!(!Superseded.can_transition_to(Accepted));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Rejected.can_transition_to(Superseded));
        assert!(Proposed.is_live());
        assert!(!Superseded.is_live());
    }
}
