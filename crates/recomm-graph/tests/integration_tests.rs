//! Integration tests for recomm-graph
//!
//! These tests cover reads, neighbor expansion, conditional writes, and ingestion.

use recomm_domain::traits::{
    GraphAccess, RecommendationWrite, ViolationFilter, WriteAck, WriteMode,
};
use recomm_domain::{
    Clause, Element, ElementId, Outcome, Predicate, PredicateRule, PropertyChange,
    PropertyValue, Provenance, Recommendation, RecommendationId, RecommendationStatus,
    RelationType, Severity, SuggestionStyle, Violation, ViolationId, ViolationStatus,
};
use recomm_graph::{load_graph_dir, GraphError, SqliteGraph};
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;

/// Corridor E1 contained in storey S1, adjacent to door D1, supported by wall W1
fn corridor_graph() -> SqliteGraph {
    let graph = SqliteGraph::in_memory().unwrap();
    let elements = vec![
        Element::new("E1", "Corridor").with_property("width", 0.9),
        Element::new("D1", "Door").with_property("width", 0.8),
        Element::new("W1", "Wall")
            .with_property("is_load_bearing", true)
            .with_property("locked_properties", "position"),
        Element::new("S1", "Storey"),
        Element::new("X1", "Space"),
    ];
    let relations = vec![
        (ElementId::new("E1"), ElementId::new("D1"), RelationType::Adjacent),
        (ElementId::new("W1"), ElementId::new("E1"), RelationType::Supports),
        (ElementId::new("E1"), ElementId::new("S1"), RelationType::Contained),
        (ElementId::new("S1"), ElementId::new("X1"), RelationType::Contained),
    ];
    graph.insert_batch(&elements, &relations).unwrap();
    graph
        .insert_clause(&Clause {
            id: "corridor-width".into(),
            description: "Corridors shall be at least 1.2 m wide".to_string(),
            predicate: Predicate::new("width", PredicateRule::AtLeast { min: 1.2 }),
            severity: Severity::High,
        })
        .unwrap();
    graph
        .insert_violation(&Violation::open(
            "V1",
            "E1",
            "corridor-width",
            PropertyValue::Number(0.9),
            PropertyValue::Number(1.2),
            Severity::High,
        ))
        .unwrap();
    graph
}

fn recommendation(violations: &[(&str, u64)], target: &str) -> Recommendation {
    let based_on_versions: BTreeMap<ViolationId, u64> = violations
        .iter()
        .map(|(id, v)| (ViolationId::new(*id), *v))
        .collect();
    let outcomes = violations
        .iter()
        .map(|(id, _)| {
            (
                ViolationId::new(*id),
                Outcome {
                    clause_id: "corridor-width".into(),
                    property: "width".to_string(),
                    predicted_value: PropertyValue::Number(1.3),
                    residual: 0.1,
                },
            )
        })
        .collect();
    Recommendation {
        id: RecommendationId::new(),
        violation_ids: based_on_versions.keys().cloned().collect(),
        target_elements: vec![ElementId::new(target)],
        description: "Widen corridor to 1.3 m".to_string(),
        changes: vec![PropertyChange {
            element: ElementId::new(target),
            property: "width".to_string(),
            value: PropertyValue::Number(1.3),
        }],
        outcomes,
        confidence: 0.8,
        rank: 1,
        style: SuggestionStyle::Standard,
        status: RecommendationStatus::Proposed,
        conflicts_with: Vec::new(),
        provenance: Provenance {
            clause_ids: vec!["corridor-width".into()],
            hop_radius: 2,
            reasoner: "mock".to_string(),
            based_on_versions: based_on_versions.clone(),
        },
        created_at: 1000,
    }
}

fn write(recommendation: Recommendation, mode: WriteMode) -> RecommendationWrite {
    RecommendationWrite {
        expected_versions: recommendation.provenance.based_on_versions.clone(),
        recommendation,
        mode,
    }
}

#[test]
fn test_neighborhood_matches_single_reads() {
    let graph = corridor_graph();
    let e1 = ElementId::new("E1");
    let types = [RelationType::Adjacent, RelationType::Supports];
    graph
        .write_recommendation(&write(recommendation(&[("V1", 1)], "E1"), WriteMode::Propose))
        .unwrap();

    let neighborhood = graph
        .fetch_neighborhood(&e1, &"corridor-width".into(), &types, 2, true)
        .unwrap()
        .unwrap();
    assert_eq!(neighborhood.element, graph.fetch_element(&e1).unwrap().unwrap());
    assert_eq!(
        neighborhood.clause,
        graph.fetch_clause(&"corridor-width".into()).unwrap()
    );
    assert_eq!(neighborhood.neighbors, graph.fetch_neighbors(&e1, &types, 2).unwrap());
    assert_eq!(neighborhood.recommendations.len(), 1);

    let without_history = graph
        .fetch_neighborhood(&e1, &"no-such-clause".into(), &types, 1, false)
        .unwrap()
        .unwrap();
    assert!(without_history.clause.is_none());
    assert!(without_history.recommendations.is_empty());

    assert!(graph
        .fetch_neighborhood(&ElementId::new("nowhere"), &"corridor-width".into(), &types, 1, true)
        .unwrap()
        .is_none());
}

#[test]
fn test_fetch_element_and_clause() {
    let graph = corridor_graph();

    let e1 = graph.fetch_element(&ElementId::new("E1")).unwrap().unwrap();
    assert_eq!(e1.element_type, "Corridor");
    assert_eq!(e1.number("width"), Some(0.9));
    assert_eq!(e1.relations.len(), 3);

    let clause = graph.fetch_clause(&"corridor-width".into()).unwrap().unwrap();
    assert_eq!(clause.severity, Severity::High);
    assert!(graph.fetch_element(&ElementId::new("missing")).unwrap().is_none());
}

#[test]
fn test_fresh_violation_is_open_at_version_one() {
    let graph = corridor_graph();
    let v1 = graph.fetch_violation(&ViolationId::new("V1")).unwrap().unwrap();
    assert_eq!(v1.status, ViolationStatus::Open);
    assert_eq!(v1.version, 1);
}

#[test]
fn test_neighbors_respect_hops_and_relation_types() {
    let graph = corridor_graph();
    let e1 = ElementId::new("E1");

    let one_hop = graph.fetch_neighbors(&e1, &RelationType::ALL, 1).unwrap();
    let ids: Vec<&str> = one_hop.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["D1", "S1", "W1"]);

    let two_hops = graph.fetch_neighbors(&e1, &RelationType::ALL, 2).unwrap();
    assert_eq!(two_hops.len(), 4);

    let structural = graph
        .fetch_neighbors(&e1, &[RelationType::Supports], 2)
        .unwrap();
    assert_eq!(structural.len(), 1);
    assert_eq!(structural[0].id.as_str(), "W1");

    assert!(graph.fetch_neighbors(&e1, &RelationType::ALL, 0).unwrap().is_empty());
}

#[test]
fn test_open_violation_filter() {
    let graph = corridor_graph();
    graph
        .insert_violation(&Violation::open(
            "V2",
            "D1",
            "corridor-width",
            PropertyValue::Number(0.8),
            PropertyValue::Number(1.2),
            Severity::Low,
        ))
        .unwrap();

    let all = graph.fetch_open_violations(&ViolationFilter::default()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id.as_str(), "V1");

    let severe = graph
        .fetch_open_violations(&ViolationFilter {
            min_severity: Some(Severity::High),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(severe.len(), 1);

    let on_door = graph
        .fetch_open_violations(&ViolationFilter {
            element_id: Some(ElementId::new("D1")),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(on_door[0].id.as_str(), "V2");
}

#[test]
fn test_accept_marks_addressed_and_supersedes() {
    let graph = corridor_graph();

    let first = recommendation(&[("V1", 1)], "E1");
    let ack = graph.write_recommendation(&write(first.clone(), WriteMode::Accept)).unwrap();
    assert_eq!(
        ack,
        WriteAck::Committed {
            versions: BTreeMap::from([(ViolationId::new("V1"), 2)])
        }
    );

    let v1 = graph.fetch_violation(&ViolationId::new("V1")).unwrap().unwrap();
    assert_eq!(v1.status, ViolationStatus::Addressed);
    assert!(graph
        .fetch_open_violations(&ViolationFilter::default())
        .unwrap()
        .is_empty());

    let second = recommendation(&[("V1", 2)], "E1");
    assert!(graph
        .write_recommendation(&write(second.clone(), WriteMode::Accept))
        .unwrap()
        .is_committed());

    let stored = graph
        .fetch_recommendations_for_violation(&ViolationId::new("V1"))
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id, first.id);
    assert_eq!(stored[0].status, RecommendationStatus::Superseded);
    assert_eq!(stored[1].status, RecommendationStatus::Accepted);

    let for_element = graph
        .fetch_recommendations_for_element(&ElementId::new("E1"))
        .unwrap();
    assert_eq!(for_element.len(), 2);
}

#[test]
fn test_propose_leaves_violation_open() {
    let graph = corridor_graph();
    let alt = recommendation(&[("V1", 1)], "E1");
    let ack = graph.write_recommendation(&write(alt.clone(), WriteMode::Propose)).unwrap();
    assert!(ack.is_committed());

    let v1 = graph.fetch_violation(&ViolationId::new("V1")).unwrap().unwrap();
    assert_eq!(v1.status, ViolationStatus::Open);
    assert_eq!(v1.version, 1);

    let stored = graph.fetch_recommendation(alt.id).unwrap().unwrap();
    assert_eq!(stored.status, RecommendationStatus::Proposed);
    assert_eq!(stored.description, alt.description);
}

#[test]
fn test_stale_version_is_conflict_and_writes_nothing() {
    let graph = corridor_graph();
    let stale = recommendation(&[("V1", 0)], "E1");
    let ack = graph.write_recommendation(&write(stale.clone(), WriteMode::Accept)).unwrap();
    assert_eq!(
        ack,
        WriteAck::Conflict {
            violation_id: ViolationId::new("V1"),
            expected: 0,
            actual: 1
        }
    );
    assert!(graph.fetch_recommendation(stale.id).unwrap().is_none());
}

#[test]
fn test_missing_target_rejected() {
    let graph = corridor_graph();
    let bad = recommendation(&[("V1", 1)], "nowhere");
    assert!(matches!(
        graph.write_recommendation(&write(bad, WriteMode::Accept)),
        Err(GraphError::NotFound(_))
    ));
}

#[test]
fn test_dismissed_violation_rejects_writes() {
    let graph = corridor_graph();
    let ack = graph
        .append_violation_event(&ViolationId::new("V1"), 1, ViolationStatus::Dismissed, "manual")
        .unwrap();
    assert!(ack.is_committed());

    let rec = recommendation(&[("V1", 2)], "E1");
    assert!(matches!(
        graph.write_recommendation(&write(rec, WriteMode::Accept)),
        Err(GraphError::InvalidTransition(_))
    ));
    assert!(matches!(
        graph.append_violation_event(&ViolationId::new("V1"), 2, ViolationStatus::Open, "undo"),
        Err(GraphError::InvalidTransition(_))
    ));
}

#[test]
fn test_recommendation_event_rules() {
    let graph = corridor_graph();
    let rec = recommendation(&[("V1", 1)], "E1");
    graph.write_recommendation(&write(rec.clone(), WriteMode::Accept)).unwrap();

    graph
        .append_recommendation_event(rec.id, RecommendationStatus::Rejected, "reviewer")
        .unwrap();
    assert!(matches!(
        graph.append_recommendation_event(rec.id, RecommendationStatus::Accepted, "again"),
        Err(GraphError::InvalidTransition(_))
    ));
    assert!(matches!(
        graph.append_recommendation_event(RecommendationId::new(), RecommendationStatus::Rejected, "x"),
        Err(GraphError::NotFound(_))
    ));
}

#[test]
fn test_concurrent_accepts_one_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.db");
    {
        let graph = SqliteGraph::new(&path).unwrap();
        graph.insert_element(&Element::new("E1", "Corridor")).unwrap();
        graph
            .insert_violation(&Violation::open(
                "V1",
                "E1",
                "corridor-width",
                PropertyValue::Number(0.9),
                PropertyValue::Number(1.2),
                Severity::High,
            ))
            .unwrap();
    }

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            thread::spawn(move || {
                let graph = SqliteGraph::new(&path).unwrap();
                let rec = recommendation(&[("V1", 1)], "E1");
                barrier.wait();
                graph.write_recommendation(&write(rec, WriteMode::Accept)).unwrap()
            })
        })
        .collect();

    let acks: Vec<WriteAck> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(acks.iter().filter(|a| a.is_committed()).count(), 1);
    assert!(acks
        .iter()
        .any(|a| matches!(a, WriteAck::Conflict { expected: 1, actual: 2, .. })));

    let graph = SqliteGraph::new(&path).unwrap();
    let stored = graph
        .fetch_recommendations_for_violation(&ViolationId::new("V1"))
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, RecommendationStatus::Accepted);
}

#[test]
fn test_ingest_model_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("v-IfcWall.json"),
        r#"{"W1": {"height": 3.0, "is_load_bearing": true, "note": null}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("v-IfcSlab.json"),
        r#"{"S1": {"thickness": 0.2}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("e-structural_support.json"),
        r#"{"level_0": [["W1", "S1"], ["W1", "S1"]]}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("e-unknown_things.json"), r#"[]"#).unwrap();

    let data = load_graph_dir(dir.path()).unwrap();
    assert_eq!(data.elements.len(), 2);
    assert_eq!(data.relations.len(), 1);
    assert_eq!(data.skipped_files.len(), 1);

    let wall = data.elements.iter().find(|e| e.id.as_str() == "W1").unwrap();
    assert_eq!(wall.element_type, "IfcWall");
    assert_eq!(wall.property("is_load_bearing"), Some(&PropertyValue::Bool(true)));
    assert!(wall.property("note").is_none());

    let graph = SqliteGraph::in_memory().unwrap();
    let report = graph.ingest(&data, false).unwrap();
    assert_eq!(report.elements, 2);
    assert!(!report.unchanged);

    let again = graph.ingest(&data, false).unwrap();
    assert!(again.unchanged);

    let forced = graph.ingest(&data, true).unwrap();
    assert!(!forced.unchanged);
    assert_eq!(graph.counts().unwrap(), (2, 1));
}

#[test]
fn test_ingest_violations_skips_oversized_and_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("violations.json");
    let related: Vec<String> = (0..10).map(|i| format!("R{}", i)).collect();
    let feed = serde_json::json!([
        {"id": "V1", "element_id": "E1", "clause_id": "C1", "measured": 0.9, "required": 1.2, "severity": "high"},
        {"id": "V1", "element_id": "E1", "clause_id": "C1", "measured": 0.9, "required": 1.2, "severity": "high"},
        {"id": "V2", "element_id": "E2", "clause_id": "C1", "measured": 0.9, "required": 1.2,
         "severity": "low", "related_elements": related}
    ]);
    std::fs::write(&path, feed.to_string()).unwrap();

    let graph = SqliteGraph::in_memory().unwrap();
    let records = recomm_graph::load_violations(&path).unwrap();
    let report = graph.ingest_violations(records, 10).unwrap();
    assert_eq!(report.violations, 1);
    assert_eq!(report.skipped, 2);
}
