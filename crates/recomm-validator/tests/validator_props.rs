//! Property tests: acceptance implies the clause is satisfied

use proptest::prelude::*;
use recomm_domain::{
    Candidate, Clause, Context, Element, ElementId, Predicate, PredicateRule, PropertyChange,
    PropertyValue, Severity, SuggestionStyle, Violation,
};
use recomm_validator::{CandidateValidator, RejectionReason, ValidationStatus};

fn rule_strategy() -> impl Strategy<Value = PredicateRule> {
    prop_oneof![
        (0.0f64..5.0).prop_map(|min| PredicateRule::AtLeast { min }),
        (0.0f64..5.0).prop_map(|max| PredicateRule::AtMost { max }),
        (0.0f64..2.5, 0.0f64..2.5).prop_map(|(a, b)| PredicateRule::Between {
            min: a.min(b),
            max: a.max(b),
        }),
    ]
}

fn context(rule: PredicateRule) -> Context {
    Context {
        violation: Violation::open(
            "V1",
            "E1",
            "c1",
            PropertyValue::Number(0.0),
            PropertyValue::Number(0.0),
            Severity::Medium,
        ),
        element: Element::new("E1", "Space").with_property("clear_height", 0.0),
        clause: Clause {
            id: "c1".into(),
            description: "Clear height requirement".to_string(),
            predicate: Predicate::new("clear_height", rule),
            severity: Severity::Medium,
        },
        neighbors: Vec::new(),
        prior_recommendations: Vec::new(),
        hop_radius: 0,
    }
}

fn candidate(value: f64) -> Candidate {
    Candidate {
        targets: vec![ElementId::new("E1")],
        description: "Adjust clear height".to_string(),
        predicted_value: PropertyValue::Number(value),
        confidence: 0.5,
        style: SuggestionStyle::Standard,
        changes: vec![PropertyChange {
            element: ElementId::new("E1"),
            property: "clear_height".to_string(),
            value: PropertyValue::Number(value),
        }],
        reasoning: String::new(),
    }
}

proptest! {
    #[test]
    fn prop_accepted_candidates_satisfy_predicate(rule in rule_strategy(), value in -1.0f64..6.0) {
        let context = context(rule);
        let candidate = candidate(value);
        let result = CandidateValidator::default_config().validate(&candidate, &context);
        let satisfied = context.clause.predicate.evaluate(&candidate.predicted_value);

        if result.status == ValidationStatus::Accepted {
            prop_assert!(satisfied);
        } else {
            prop_assert!(!satisfied);
            let is_resolution_failure = matches!(
                result.reasons[0],
                RejectionReason::DoesNotResolve { deviation, .. } if deviation > 0.0
            );
            prop_assert!(is_resolution_failure);
        }
    }

    #[test]
    fn prop_partition_accepts_only_resolving(values in prop::collection::vec(-1.0f64..6.0, 0..12)) {
        let context = context(PredicateRule::AtLeast { min: 2.4 });
        let batch: Vec<Candidate> = values.iter().copied().map(candidate).collect();
        let out = CandidateValidator::default_config().partition(batch, &context);

        prop_assert_eq!(out.accepted.len() + out.rejected.len(), values.len());
        for accepted in &out.accepted {
            prop_assert!(context.clause.predicate.evaluate(&accepted.predicted_value));
        }
    }
}
