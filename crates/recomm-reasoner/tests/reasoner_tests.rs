//! LlmReasoner behavior against a scripted provider

use recomm_domain::{
    Clause, Context, Element, Neighbor, Predicate, PredicateRule, PropertyValue, RelationType,
    Severity, SuggestionStyle, Violation,
};
use recomm_domain::traits::LlmProvider;
use recomm_llm::MockProvider;
use recomm_reasoner::{LlmReasoner, Reasoner, ReasonerConfig, ReasonerError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const VALID: &str = r#"{"suggestions": [
    {"targets": ["E1"], "description": "Widen corridor to 1.25 m", "predicted_value": 1.25,
     "confidence": 0.8, "style": "standard"},
    {"targets": ["E1", "D1"], "description": "Swap door swing and widen", "predicted_value": 1.3,
     "confidence": 0.6, "style": "creative"}
]}"#;

fn context() -> Context {
    Context {
        violation: Violation::open(
            "V1",
            "E1",
            "corridor-width",
            PropertyValue::Number(0.9),
            PropertyValue::Number(1.2),
            Severity::High,
        ),
        element: Element::new("E1", "Corridor").with_property("width", 0.9),
        clause: Clause {
            id: "corridor-width".into(),
            description: "Corridors shall be at least 1.2 m wide".to_string(),
            predicate: Predicate::new("width", PredicateRule::AtLeast { min: 1.2 }),
            severity: Severity::High,
        },
        neighbors: vec![Neighbor {
            element: Element::new("D1", "Door").with_property("width", 0.8),
            hops: 1,
            via: RelationType::Adjacent,
        }],
        prior_recommendations: Vec::new(),
        hop_radius: 1,
    }
}

fn fast_config() -> ReasonerConfig {
    ReasonerConfig {
        max_retries: 3,
        base_backoff_ms: 1,
        max_backoff_ms: 4,
        ..ReasonerConfig::default()
    }
}

#[tokio::test]
async fn test_propose_returns_valid_candidates() {
    let provider = Arc::new(MockProvider::new(VALID));
    let reasoner = LlmReasoner::new(Arc::clone(&provider), fast_config());

    let candidates = reasoner.propose(&context(), 5).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[1].style, SuggestionStyle::Creative);
    assert_eq!(reasoner.name(), "llm:mock");

    let prompt = provider.last_prompt().unwrap();
    assert!(prompt.contains("Corridors shall be at least 1.2 m wide"));
    assert!(prompt.contains("Produce exactly 5 suggestions"));
}

#[tokio::test]
async fn test_propose_truncates_to_k() {
    let reasoner = LlmReasoner::new(Arc::new(MockProvider::new(VALID)), fast_config());
    let candidates = reasoner.propose(&context(), 1).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].predicted_value, PropertyValue::Number(1.25));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let provider = Arc::new(MockProvider::new(VALID));
    provider.push_error("connection reset");
    provider.push_error("connection reset");
    let reasoner = LlmReasoner::new(Arc::clone(&provider), fast_config());

    let candidates = reasoner.propose(&context(), 5).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let provider = Arc::new(MockProvider::new(VALID));
    for _ in 0..5 {
        provider.push_error("down");
    }
    let config = ReasonerConfig {
        max_retries: 2,
        ..fast_config()
    };
    let reasoner = LlmReasoner::new(Arc::clone(&provider), config);

    let result = reasoner.propose(&context(), 5).await;
    assert!(matches!(result, Err(ReasonerError::ReasoningUnavailable(_))));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_empty_result_is_not_retried() {
    let provider = Arc::new(MockProvider::new("[]"));
    let reasoner = LlmReasoner::new(Arc::clone(&provider), fast_config());

    let result = reasoner.propose(&context(), 5).await;
    assert_eq!(result, Err(ReasonerError::EmptyResult { discarded: 0 }));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_invalid_after_transient_failure_is_empty_result() {
    let provider = Arc::new(MockProvider::new(
        r#"[{"targets": ["NOPE"], "description": "Move a ghost", "predicted_value": 1.3, "confidence": 0.9}]"#,
    ));
    provider.push_error("timeout");
    let reasoner = LlmReasoner::new(Arc::clone(&provider), fast_config());

    let result = reasoner.propose(&context(), 5).await;
    assert_eq!(result, Err(ReasonerError::EmptyResult { discarded: 1 }));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_timeout_is_unavailable() {
    let provider = Arc::new(MockProvider::new(VALID).with_delay(Duration::from_millis(1_500)));
    let config = ReasonerConfig {
        timeout_secs: 1,
        max_retries: 0,
        ..fast_config()
    };
    let reasoner = LlmReasoner::new(Arc::clone(&provider), config);

    let result = reasoner.propose(&context(), 5).await;
    match result {
        Err(ReasonerError::ReasoningUnavailable(message)) => assert!(message.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_k_is_config_error() {
    let reasoner = LlmReasoner::new(Arc::new(MockProvider::new(VALID)), fast_config());
    assert!(matches!(
        reasoner.propose(&context(), 0).await,
        Err(ReasonerError::Config(_))
    ));
}

/// Sleeps on every call and records how many calls overlap
struct SlowProvider {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowProvider {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl LlmProvider for SlowProvider {
    type Error = String;

    fn generate(&self, prompt: &str) -> Result<String, String> {
        self.generate_structured(prompt, "")
    }

    fn generate_structured(&self, _prompt: &str, _schema: &str) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(VALID.to_string())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timed_out_calls_hold_their_slot() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(1_200)));
    let config = ReasonerConfig {
        timeout_secs: 1,
        max_retries: 2,
        max_concurrent_calls: 1,
        ..fast_config()
    };
    let reasoner = LlmReasoner::new(Arc::clone(&provider), config);

    let result = reasoner.propose(&context(), 3).await;
    assert!(matches!(result, Err(ReasonerError::ReasoningUnavailable(_))));
    // Each retry waited for the abandoned call to finish first
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert_eq!(provider.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_proposals_share_call_limit() {
    let provider = Arc::new(SlowProvider::new(Duration::from_millis(50)));
    let config = ReasonerConfig {
        max_concurrent_calls: 2,
        ..fast_config()
    };
    let reasoner = Arc::new(LlmReasoner::new(Arc::clone(&provider), config));
    let context = context();

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let reasoner = Arc::clone(&reasoner);
        let context = context.clone();
        tasks.push(tokio::spawn(async move { reasoner.propose(&context, 2).await }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().len(), 2);
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
    assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 2);
}
