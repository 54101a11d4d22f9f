//! Recommendation lifecycle tests over SQLite

use recomm_domain::traits::{GraphAccess, WriteAck};
use recomm_domain::{
    Clause, Element, ElementId, Outcome, Predicate, PredicateRule, PropertyChange, PropertyValue,
    Provenance, Recommendation, RecommendationId, RecommendationStatus, RelationType, Severity,
    SuggestionStyle, Violation, ViolationId, ViolationStatus,
};
use recomm_graph::SqliteGraph;
use recomm_store::{RecommendationStore, StoreError};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

fn seed(graph: &SqliteGraph) {
    graph
        .insert_batch(
            &[
                Element::new("E1", "Corridor").with_property("width", 0.9),
                Element::new("D1", "Door").with_property("width", 0.8),
            ],
            &[(ElementId::new("E1"), ElementId::new("D1"), RelationType::Adjacent)],
        )
        .unwrap();
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
}

fn store() -> RecommendationStore<SqliteGraph> {
    let graph = SqliteGraph::in_memory().unwrap();
    seed(&graph);
    RecommendationStore::new(Arc::new(graph))
}

fn file_store(path: &Path) -> RecommendationStore<SqliteGraph> {
    RecommendationStore::new(Arc::new(SqliteGraph::new(path).unwrap()))
}

fn recommendation(width: f64, version: u64) -> Recommendation {
    let v1 = ViolationId::new("V1");
    Recommendation {
        id: RecommendationId::new(),
        violation_ids: vec![v1.clone()],
        target_elements: vec![ElementId::new("E1")],
        description: format!("Widen corridor to {} m", width),
        changes: vec![PropertyChange {
            element: ElementId::new("E1"),
            property: "width".to_string(),
            value: PropertyValue::Number(width),
        }],
        outcomes: BTreeMap::from([(
            v1.clone(),
            Outcome {
                clause_id: "corridor-width".into(),
                property: "width".to_string(),
                predicted_value: PropertyValue::Number(width),
                residual: width - 1.2,
            },
        )]),
        confidence: 0.8,
        rank: 1,
        style: SuggestionStyle::Standard,
        status: RecommendationStatus::Proposed,
        conflicts_with: Vec::new(),
        provenance: Provenance {
            clause_ids: vec!["corridor-width".into()],
            hop_radius: 1,
            reasoner: "llm:mock".to_string(),
            based_on_versions: BTreeMap::from([(v1, version)]),
        },
        created_at: 1_000,
    }
}

fn v1() -> ViolationId {
    ViolationId::new("V1")
}

#[test]
fn test_accept_addresses_violation() {
    let store = store();
    let rec = recommendation(1.25, 1);
    let ack = store.accept(rec.clone()).unwrap();
    assert!(ack.is_committed());

    let violation = store.violation(&v1()).unwrap();
    assert_eq!(violation.status, ViolationStatus::Addressed);
    assert_eq!(violation.version, 2);

    let accepted = store.accepted_for(&v1()).unwrap().unwrap();
    assert_eq!(accepted.id, rec.id);
    assert_eq!(accepted.status, RecommendationStatus::Accepted);
}

#[test]
fn test_propose_keeps_violation_open() {
    let store = store();
    store.propose(recommendation(1.3, 1)).unwrap();

    let violation = store.violation(&v1()).unwrap();
    assert_eq!(violation.status, ViolationStatus::Open);
    assert_eq!(violation.version, 1);
    let history = store.recommendations_for_violation(&v1()).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, RecommendationStatus::Proposed);
}

#[test]
fn test_reaccept_supersedes_previous() {
    let store = store();
    let first = recommendation(1.25, 1);
    store.accept(first.clone()).unwrap();
    let second = recommendation(1.3, 2);
    assert!(store.accept(second.clone()).unwrap().is_committed());

    let history = store.recommendations_for_violation(&v1()).unwrap();
    let status_of = |id: RecommendationId| history.iter().find(|r| r.id == id).map(|r| r.status);
    assert_eq!(status_of(first.id), Some(RecommendationStatus::Superseded));
    assert_eq!(status_of(second.id), Some(RecommendationStatus::Accepted));
    // Superseded recommendations are kept
    assert_eq!(history.len(), 2);
}

#[test]
fn test_stale_accept_conflicts() {
    let store = store();
    store.accept(recommendation(1.25, 1)).unwrap();
    let ack = store.accept(recommendation(1.3, 1)).unwrap();
    assert_eq!(
        ack,
        WriteAck::Conflict {
            violation_id: v1(),
            expected: 1,
            actual: 2
        }
    );
}

#[test]
fn test_invariants_checked_before_write() {
    let store = store();

    let mut no_targets = recommendation(1.25, 1);
    no_targets.target_elements.clear();
    assert!(matches!(
        store.accept(no_targets),
        Err(StoreError::InvalidRecommendation(_))
    ));

    let mut no_violations = recommendation(1.25, 1);
    no_violations.violation_ids.clear();
    assert!(matches!(
        store.accept(no_violations),
        Err(StoreError::InvalidRecommendation(_))
    ));

    let mut ghost_target = recommendation(1.25, 1);
    ghost_target.target_elements.push(ElementId::new("GHOST"));
    assert!(matches!(store.accept(ghost_target), Err(StoreError::NotFound(_))));

    let mut ghost_violation = recommendation(1.25, 1);
    ghost_violation.violation_ids = vec![ViolationId::new("V404")];
    ghost_violation
        .provenance
        .based_on_versions
        .insert(ViolationId::new("V404"), 1);
    assert!(matches!(
        store.accept(ghost_violation),
        Err(StoreError::NotFound(_))
    ));

    // Nothing was written
    assert!(store.recommendations_for_violation(&v1()).unwrap().is_empty());
}

#[test]
fn test_dismissed_violation_refuses_writes() {
    let store = store();
    store
        .graph()
        .append_violation_event(&v1(), 1, ViolationStatus::Dismissed, "manual override")
        .unwrap();
    assert!(matches!(
        store.accept(recommendation(1.25, 2)),
        Err(StoreError::InvalidTransition(_))
    ));
    assert!(matches!(
        store.reopen(&v1(), "try"),
        Err(StoreError::InvalidTransition(_))
    ));
}

#[test]
fn test_reject_then_reopen() {
    let store = store();
    let rec = recommendation(1.25, 1);
    store.accept(rec.clone()).unwrap();

    // Still accepted: cannot reopen
    assert!(matches!(
        store.reopen(&v1(), "not yet"),
        Err(StoreError::InvalidTransition(_))
    ));

    let reopenable = store.reject(rec.id, "client declined").unwrap();
    assert_eq!(reopenable, vec![v1()]);
    // Rejecting never changes the violation
    assert_eq!(store.violation(&v1()).unwrap().status, ViolationStatus::Addressed);

    let ack = store.reopen(&v1(), "accepted fix rejected").unwrap();
    assert!(ack.is_committed());
    let violation = store.violation(&v1()).unwrap();
    assert_eq!(violation.status, ViolationStatus::Open);
    assert_eq!(violation.version, 3);

    // A second rejection of the same recommendation is refused
    assert!(matches!(
        store.reject(rec.id, "again"),
        Err(StoreError::InvalidTransition(_))
    ));
}

#[test]
fn test_reject_proposed_leaves_nothing_to_reopen() {
    let store = store();
    let accepted = recommendation(1.25, 1);
    store.accept(accepted).unwrap();
    let alternative = recommendation(1.4, 2);
    store.propose(alternative.clone()).unwrap();

    let reopenable = store.reject(alternative.id, "too wide").unwrap();
    assert!(reopenable.is_empty());
}

#[test]
fn test_reopen_open_violation_refused() {
    let store = store();
    assert!(matches!(
        store.reopen(&v1(), "nothing to reopen"),
        Err(StoreError::InvalidTransition(_))
    ));
}

#[test]
fn test_exports() {
    let store = store();
    let rec = recommendation(1.25, 1);
    store.accept(rec.clone()).unwrap();

    let by_element = store.recommendations_for_element(&ElementId::new("E1")).unwrap();
    assert_eq!(by_element.len(), 1);
    assert_eq!(by_element[0].provenance.reasoner, "llm:mock");
    assert_eq!(
        by_element[0].outcomes[&v1()].predicted_value,
        PropertyValue::Number(1.25)
    );
    assert!(store
        .recommendations_for_element(&ElementId::new("D1"))
        .unwrap()
        .is_empty());

    assert!(matches!(
        store.recommendations_for_element(&ElementId::new("nowhere")),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.recommendations_for_violation(&ViolationId::new("V404")),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_concurrent_accepts_one_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.db");
    let graph = SqliteGraph::new(&path).unwrap();
    seed(&graph);
    drop(graph);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [1.25, 1.3]
        .into_iter()
        .map(|width| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                // Each thread has its own connection to the same database
                let store = file_store(&path);
                let rec = recommendation(width, 1);
                barrier.wait();
                store.accept(rec).unwrap()
            })
        })
        .collect();

    let acks: Vec<WriteAck> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let committed = acks.iter().filter(|a| a.is_committed()).count();
    assert_eq!(committed, 1);
    assert!(acks.iter().any(|a| matches!(
        a,
        WriteAck::Conflict {
            expected: 1,
            actual: 2,
            ..
        }
    )));

    let store = file_store(&path);
    let violation = store.violation(&v1()).unwrap();
    assert_eq!(violation.status, ViolationStatus::Addressed);
    assert_eq!(violation.version, 2);
}
