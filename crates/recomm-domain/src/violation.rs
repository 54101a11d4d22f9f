//! Violations and their status lifecycle

use crate::{ClauseId, ElementId, PropertyValue, Severity, ViolationId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a violation
///
/// The lifecycle is:
/// - Open → Addressed when a recommendation is accepted
/// - Addressed → Open when the accepted recommendation is rejected and reopened
/// - Open or Addressed → Dismissed by manual override (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationStatus {
    /// Awaiting an accepted recommendation
    Open,
    /// An accepted recommendation addresses the violation
    Addressed,
    /// Manually overridden; never reasoned over again
    Dismissed,
}

impl ViolationStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationStatus::Open => "open",
            ViolationStatus::Addressed => "addressed",
            ViolationStatus::Dismissed => "dismissed",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(ViolationStatus::Open),
            "addressed" => Some(ViolationStatus::Addressed),
            "dismissed" => Some(ViolationStatus::Dismissed),
            _ => None,
        }
    }

    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Re-accepting an addressed violation (a newer recommendation superseding
    /// the accepted one) is the `Addressed → Addressed` edge.
    pub fn can_transition_to(&self, next: ViolationStatus) -> bool {
        matches!(
            (self, next),
            (ViolationStatus::Open, ViolationStatus::Addressed)
                | (ViolationStatus::Addressed, ViolationStatus::Addressed)
                | (ViolationStatus::Addressed, ViolationStatus::Open)
                | (ViolationStatus::Open, ViolationStatus::Dismissed)
                | (ViolationStatus::Addressed, ViolationStatus::Dismissed)
        )
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, ViolationStatus::Dismissed)
    }
}

impl fmt::Display for ViolationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An Element/Clause pair flagged as non-compliant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier from the compliance feed
    pub id: ViolationId,

    /// The offending element
    pub element_id: ElementId,

    /// The clause that is violated
    pub clause_id: ClauseId,

    /// Measured value of the clause property
    pub measured: PropertyValue,

    /// Required value or threshold as reported by the checker
    pub required: PropertyValue,

    /// Severity as reported by the checker
    pub severity: Severity,

    /// Current status (derived from the event log)
    pub status: ViolationStatus,

    /// Number of status events recorded; used for optimistic concurrency
    pub version: u64,
}

impl Violation {
    /// Create a freshly detected, open violation
    pub fn open(
        id: impl Into<ViolationId>,
        element_id: impl Into<ElementId>,
        clause_id: impl Into<ClauseId>,
        measured: PropertyValue,
        required: PropertyValue,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            element_id: element_id.into(),
            clause_id: clause_id.into(),
            measured,
            required,
            severity,
            status: ViolationStatus::Open,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_edges() {
        use ViolationStatus::*;
        assert!(Open.can_transition_to(Addressed));
        assert!(Addressed.can_transition_to(Open));
        assert!(Addressed.can_transition_to(Addressed));
        assert!(Open.can_transition_to(Dismissed));
        assert!(!Open.can_transition_to(Open));
        assert!(!Dismissed.can_transition_to(Open));
        assert!(!Dismissed.can_transition_to(Addressed));
        assert!(Dismissed.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        for s in [ViolationStatus::Open, ViolationStatus::Addressed, ViolationStatus::Dismissed] {
            assert_eq!(ViolationStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ViolationStatus::parse("pending"), None);
    }

    #[test]
    fn test_open_constructor() {
        let v = Violation::open(
            "V1",
            "E1",
            "corridor-width",
            PropertyValue::Number(0.9),
            PropertyValue::Number(1.2),
            Severity::High,
        );
        assert_eq!(v.status, ViolationStatus::Open);
        assert_eq!(v.version, 0);
    }
}
