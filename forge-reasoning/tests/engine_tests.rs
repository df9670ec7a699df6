use forge_core::{ComplexityLevel, ForgeError};
use forge_model::{MockLlm, MockReply};
use forge_reasoning::{
    NO_VIABLE_OUTPUT, ReasoningConfig, ReasoningEngine, ReasoningEvent, StepKind,
};
use futures::StreamExt;
use std::sync::Arc;

fn engine(mock: &Arc<MockLlm>, kind: StepKind) -> ReasoningEngine {
    ReasoningEngine::new(mock.clone(), "mock-model")
        .with_config(ReasoningConfig::default().with_kind(kind))
}

#[tokio::test]
async fn low_complexity_without_revision_yields_one_batch() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response("COMPLEXITY: low\n1. Hello there\n2. Hi friend\n3. Good morning"),
    );
    let result = engine(&mock, StepKind::Draft).run("give 3 short greetings").await.unwrap();

    assert_eq!(result.complexity, ComplexityLevel::Low);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].kind, StepKind::Draft);
    assert_eq!(result.full_reasoning_text, "1. Hello there\n2. Hi friend\n3. Good morning");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn endless_revision_requests_stop_at_the_ceiling() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response("COMPLEXITY: very-high\n1. Break the problem down\nIMPROVE_NEEDED: yes")
            .with_fallback(MockReply::text("1. Refine the idea further\nIMPROVE_NEEDED: yes")),
    );
    let result = engine(&mock, StepKind::Thought).run("prove it").await.unwrap();

    assert_eq!(result.complexity, ComplexityLevel::VeryHigh);
    assert_eq!(result.steps.len(), 5);
    assert_eq!(mock.call_count(), 5);
    assert_eq!(result.full_reasoning_text.matches("\n---\n").count(), 4);
}

#[tokio::test]
async fn later_complexity_claims_are_ignored() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response("COMPLEXITY: low\n1. Start simple\nIMPROVE_NEEDED: yes")
            .with_fallback(MockReply::text(
                "COMPLEXITY: very-high\n1. Actually this is hard\nIMPROVE_NEEDED: yes",
            )),
    );
    let result = engine(&mock, StepKind::Thought).run("question").await.unwrap();
    assert_eq!(result.complexity, ComplexityLevel::Low);
    assert_eq!(result.steps.len(), 2);
}

#[tokio::test]
async fn follow_up_prompts_include_previous_batches() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response("COMPLEXITY: medium\n1. First idea\nIMPROVE_NEEDED: yes")
            .with_response("1. Better idea\nIMPROVE_NEEDED: no"),
    );
    engine(&mock, StepKind::Thought).run("plan a trip").await.unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].prompt.contains("plan a trip"));
    assert!(calls[1].prompt.contains("1. First idea"));
    assert!(calls.iter().all(|call| call.history.is_empty()));
}

#[tokio::test]
async fn malformed_reply_degrades_to_sentinel() {
    let mock = Arc::new(MockLlm::new("mock").with_response("I refuse to number things."));
    let result = engine(&mock, StepKind::Thought).run("anything").await.unwrap();
    assert_eq!(result.steps[0].items, vec![NO_VIABLE_OUTPUT.to_string()]);
    assert_eq!(result.complexity, ComplexityLevel::Low);
}

#[tokio::test]
async fn provider_errors_propagate_without_retry() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response("COMPLEXITY: high\n1. Step one\nIMPROVE_NEEDED: yes")
            .with_reply(MockReply::error("503 Service Unavailable")),
    );
    let err = engine(&mock, StepKind::Thought).run("hard question").await.unwrap_err();
    assert!(matches!(err, ForgeError::Provider(_)));
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn stream_emits_each_batch_before_the_next_call() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response("COMPLEXITY: medium\n1. a\n2. b\nIMPROVE_NEEDED: yes")
            .with_response("1. c\nIMPROVE_NEEDED: no"),
    );
    let mut stream = engine(&mock, StepKind::Draft).run_stream("q");

    let mut first_batch = Vec::new();
    while let Some(event) = stream.next().await {
        let event = event.unwrap();
        let done = event == ReasoningEvent::StepComplete(0);
        first_batch.push(event);
        if done {
            break;
        }
    }
    assert_eq!(mock.call_count(), 1);
    assert_eq!(
        first_batch,
        vec![
            ReasoningEvent::ComplexityDetected(ComplexityLevel::Medium),
            ReasoningEvent::Item { batch_index: 0, text: "a".into() },
            ReasoningEvent::Item { batch_index: 0, text: "b".into() },
            ReasoningEvent::StepComplete(0),
        ]
    );

    let rest: Vec<ReasoningEvent> = stream.map(|e| e.unwrap()).collect().await;
    assert_eq!(rest[0], ReasoningEvent::Item { batch_index: 1, text: "c".into() });
    assert_eq!(rest[1], ReasoningEvent::StepComplete(1));
    assert!(matches!(rest.last(), Some(ReasoningEvent::Finished(r)) if r.steps.len() == 2));
}

#[tokio::test]
async fn word_cap_override_applies() {
    let mock = Arc::new(MockLlm::new("mock").with_response("1. one two three four five six seven"));
    let config = ReasoningConfig { word_cap: Some(3), ..ReasoningConfig::default() };
    let result = ReasoningEngine::new(mock, "m").with_config(config).run("q").await.unwrap();
    assert_eq!(result.steps[0].items, vec!["one two three".to_string()]);
}
