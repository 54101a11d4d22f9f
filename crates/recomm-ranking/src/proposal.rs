//! Ranked candidates lifted to the violation level

use crate::Ranked;
use recomm_domain::{
    current_timestamp, Context, ElementId, Outcome, PropertyChange, Provenance, Recommendation,
    RecommendationId, RecommendationStatus, SuggestionStyle, ViolationId,
};
use std::collections::BTreeMap;

/// A ranked adaptation for one or more violations, ready to be stored
///
/// Collections are kept sorted so that equal content compares equal no matter
/// how the proposal was assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    /// Addressed violations, sorted
    pub violation_ids: Vec<ViolationId>,

    /// Touched elements (targets and changed elements), sorted and unique
    pub targets: Vec<ElementId>,

    /// Description per violation
    pub descriptions: BTreeMap<ViolationId, String>,

    /// Property changes, sorted by (element, property) and unique on that pair
    pub changes: Vec<PropertyChange>,

    /// Predicted outcome per violation
    pub outcomes: BTreeMap<ViolationId, Outcome>,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Best rank among the merged inputs
    pub rank: u32,

    /// Standard when any input is standard
    pub style: SuggestionStyle,

    /// Violations whose proposals contradict this one, sorted
    pub conflicts_with: Vec<ViolationId>,

    /// Provenance of the reasoning
    pub provenance: Provenance,
}

impl Proposal {
    /// Lift a ranked candidate into a proposal for the context's violation
    pub fn from_ranked(context: &Context, ranked: &Ranked, reasoner: &str) -> Self {
        let violation = &context.violation;
        let candidate = &ranked.candidate;

        let mut targets: Vec<ElementId> = candidate
            .targets
            .iter()
            .chain(candidate.changes.iter().map(|c| &c.element))
            .cloned()
            .collect();
        targets.sort();
        targets.dedup();

        let mut changes = candidate.changes.clone();
        sort_changes(&mut changes);

        let outcome = Outcome {
            clause_id: context.clause.id.clone(),
            property: context.clause.predicate.property.clone(),
            predicted_value: candidate.predicted_value.clone(),
            residual: ranked.residual,
        };

        Self {
            violation_ids: vec![violation.id.clone()],
            targets,
            descriptions: BTreeMap::from([(violation.id.clone(), candidate.description.clone())]),
            changes,
            outcomes: BTreeMap::from([(violation.id.clone(), outcome)]),
            confidence: candidate.confidence,
            rank: ranked.rank,
            style: candidate.style,
            conflicts_with: Vec::new(),
            provenance: Provenance {
                clause_ids: vec![context.clause.id.clone()],
                hop_radius: context.hop_radius,
                reasoner: reasoner.to_string(),
                based_on_versions: BTreeMap::from([(violation.id.clone(), violation.version)]),
            },
        }
    }

    /// Whether both proposals touch at least one common element
    pub fn shares_target(&self, other: &Proposal) -> bool {
        self.targets
            .iter()
            .any(|t| other.targets.binary_search(t).is_ok())
    }

    /// Single description text, prefixed per violation when merged
    pub fn description(&self) -> String {
        if self.descriptions.len() == 1 {
            return self.descriptions.values().next().cloned().unwrap_or_default();
        }
        self.descriptions
            .iter()
            .map(|(id, text)| format!("{}: {}", id, text))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Re-base the proposal on fresher violation versions
    pub fn rebase(&mut self, versions: &BTreeMap<ViolationId, u64>) {
        for (id, version) in versions {
            if let Some(v) = self.provenance.based_on_versions.get_mut(id) {
                *v = *version;
            }
        }
    }

    /// Build the stored form with a fresh id
    pub fn to_recommendation(&self, status: RecommendationStatus) -> Recommendation {
        Recommendation {
            id: RecommendationId::new(),
            violation_ids: self.violation_ids.clone(),
            target_elements: self.targets.clone(),
            description: self.description(),
            changes: self.changes.clone(),
            outcomes: self.outcomes.clone(),
            confidence: self.confidence,
            rank: self.rank,
            style: self.style,
            status,
            conflicts_with: self.conflicts_with.clone(),
            provenance: self.provenance.clone(),
            created_at: current_timestamp(),
        }
    }
}

pub(crate) fn sort_changes(changes: &mut Vec<PropertyChange>) {
    changes.sort_by(|a, b| {
        a.element
            .cmp(&b.element)
            .then_with(|| a.property.cmp(&b.property))
    });
    changes.dedup_by(|a, b| a.element == b.element && a.property == b.property);
}

#[cfg(test)]
mod tests {
    use super::*;
    use recomm_domain::{
        Candidate, Clause, Element, Predicate, PredicateRule, PropertyValue, Severity, Violation,
    };

    fn context() -> Context {
        let mut violation = Violation::open(
            "V1",
            "E1",
            "corridor-width",
            PropertyValue::Number(0.9),
            PropertyValue::Number(1.2),
            Severity::High,
        );
        violation.version = 1;
        Context {
            violation,
            element: Element::new("E1", "Corridor").with_property("width", 0.9),
            clause: Clause {
                id: "corridor-width".into(),
                description: "Corridors shall be at least 1.2 m wide".to_string(),
                predicate: Predicate::new("width", PredicateRule::AtLeast { min: 1.2 }),
                severity: Severity::High,
            },
            neighbors: Vec::new(),
            prior_recommendations: Vec::new(),
            hop_radius: 1,
        }
    }

    fn ranked() -> Ranked {
        Ranked {
            candidate: Candidate {
                targets: vec![ElementId::new("E1")],
                description: "Widen corridor to 1.25 m".to_string(),
                predicted_value: PropertyValue::Number(1.25),
                confidence: 0.8,
                style: SuggestionStyle::Standard,
                changes: vec![
                    PropertyChange {
                        element: ElementId::new("W1"),
                        property: "position".to_string(),
                        value: PropertyValue::Text("moved 0.35 m".to_string()),
                    },
                    PropertyChange {
                        element: ElementId::new("E1"),
                        property: "width".to_string(),
                        value: PropertyValue::Number(1.25),
                    },
                ],
                reasoning: String::new(),
            },
            residual: 0.05,
            rank: 1,
        }
    }

    #[test]
    fn test_from_ranked() {
        let proposal = Proposal::from_ranked(&context(), &ranked(), "llm:mock");
        assert_eq!(proposal.violation_ids, vec![ViolationId::new("V1")]);
        // Changed elements count as targets
        assert_eq!(proposal.targets, vec![ElementId::new("E1"), ElementId::new("W1")]);
        assert_eq!(proposal.changes[0].element.as_str(), "E1");
        assert_eq!(proposal.provenance.based_on_versions[&ViolationId::new("V1")], 1);
        assert_eq!(proposal.description(), "Widen corridor to 1.25 m");
    }

    #[test]
    fn test_to_recommendation() {
        let proposal = Proposal::from_ranked(&context(), &ranked(), "llm:mock");
        let rec = proposal.to_recommendation(RecommendationStatus::Proposed);
        assert_eq!(rec.violation_ids, proposal.violation_ids);
        assert_eq!(rec.outcomes[&ViolationId::new("V1")].residual, 0.05);
        assert_eq!(rec.provenance.reasoner, "llm:mock");
        assert!(!rec.is_merged());
    }

    #[test]
    fn test_rebase() {
        let mut proposal = Proposal::from_ranked(&context(), &ranked(), "llm:mock");
        proposal.rebase(&BTreeMap::from([
            (ViolationId::new("V1"), 3),
            (ViolationId::new("V9"), 7),
        ]));
        assert_eq!(proposal.provenance.based_on_versions.len(), 1);
        assert_eq!(proposal.provenance.based_on_versions[&ViolationId::new("V1")], 3);
    }
}
