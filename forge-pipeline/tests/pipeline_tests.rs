use forge_core::ForgeError;
use forge_model::{MockLlm, MockReply};
use forge_pipeline::{
    AgentPipeline, PipelineConfig, PipelineError, PipelineOutcome, Stage,
};
use forge_session::{InMemoryGateway, ProjectFileStore};
use std::sync::Arc;
use std::time::Duration;

const PLAN: &str = r#"{"plan":{"structure":[{"path":"src/main.rs","type":"file","description":"entry point"}],"dependencies":["clap"],"challenges":[]}}"#;
const FILES: &str = r#"{"files":[{"path":"src/main.rs","content":"fn main() {}","dependencies":[],"validationChecks":["compiles"]}]}"#;
const CLEAN: &str = r#"{"validation":[{"filePath":"src/main.rs","issues":[]}]}"#;
const ISSUES: &str = r#"{"validation":[{"filePath":"src/main.rs","issues":[{"type":"bug","message":"main does nothing","suggestion":"print something"}]},{"filePath":"README.md","issues":[]}]}"#;
const ACTIONS: &str = r#"{"actions":[{"type":"create","filePath":"src/main.rs","content":"fn main() {}","commitMsg":"add main"},{"type":"update","filePath":"src/main.rs","content":"fn main() { println!(\"hi\"); }","commitMsg":"greet"}]}"#;

fn pipeline(mock: &Arc<MockLlm>, gateway: &InMemoryGateway) -> AgentPipeline {
    AgentPipeline::new(
        mock.clone(),
        "mock-model",
        Arc::new(gateway.clone()),
        Arc::new(gateway.clone()),
    )
}

#[tokio::test(start_paused = true)]
async fn all_stages_succeed_and_actions_apply_in_order() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response(PLAN)
            .with_response(FILES)
            .with_response(CLEAN)
            .with_response(ACTIONS),
    );
    let gateway = InMemoryGateway::new();

    let outcome = pipeline(&mock, &gateway).run("p1", "a hello-world CLI", "").await.unwrap();
    match outcome {
        PipelineOutcome::Completed { state, applied } => {
            assert_eq!(applied, 2);
            assert!(state.plan.is_some());
            assert_eq!(state.generated_files.len(), 1);
            assert!(state.validation_errors.is_empty());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let versions = gateway.file_versions("p1", "src/main.rs");
    let messages: Vec<&str> = versions.iter().map(|v| v.commit_msg.as_str()).collect();
    assert_eq!(messages, vec!["add main", "greet"]);

    let steps = gateway.pipeline_steps("p1");
    let names: Vec<&str> = steps.iter().map(|s| s.stage.as_str()).collect();
    assert_eq!(names, vec!["project-architect", "file-generator", "code-validator", "execution-agent"]);
    assert!(steps.iter().all(|s| s.attempt_number == 1));
}

#[tokio::test(start_paused = true)]
async fn third_attempt_success_is_recorded_with_its_attempt_number() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response(PLAN)
            .with_reply(MockReply::error("503 Service Unavailable"))
            .with_response(r#"{"files": []}"#)
            .with_response(format!("```json\n{FILES}\n```"))
            .with_response(CLEAN)
            .with_response(r#"{"actions": []}"#),
    );
    let gateway = InMemoryGateway::new();
    let started = tokio::time::Instant::now();

    let outcome = pipeline(&mock, &gateway).run("p2", "req", "ctx").await.unwrap();
    assert!(matches!(outcome, PipelineOutcome::Completed { applied: 0, .. }));
    // 500ms after attempt 1, 1000ms after attempt 2.
    assert!(started.elapsed() >= Duration::from_millis(1500));

    let generator = gateway
        .pipeline_steps("p2")
        .into_iter()
        .find(|s| s.stage == "file-generator")
        .unwrap();
    assert_eq!(generator.attempt_number, 3);

    let calls = mock.calls();
    assert!(!calls[1].prompt.contains("Format correction needed"));
    assert!(calls[2].prompt.contains("Format correction needed: Provider error: 503"));
    assert!(calls[3].prompt.contains("Format correction needed: Validation error"));
    assert!(calls[3].prompt.contains("Format correction needed: Provider error: 503"));
    assert!(calls.iter().all(|c| c.history.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn exhausted_stage_surfaces_partial_state_without_side_effects() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response(PLAN)
            .with_fallback(MockReply::text("Sorry, I cannot produce JSON.")),
    );
    let gateway = InMemoryGateway::new();

    let err = pipeline(&mock, &gateway).run("p3", "req", "").await.unwrap_err();
    match &err {
        PipelineError::ExhaustedRetries { stage, attempts, last_error, state } => {
            assert_eq!(*stage, Stage::FileGenerator);
            assert_eq!(*attempts, 3);
            assert!(matches!(last_error, ForgeError::Format(_)));
            assert!(state.plan.is_some());
            assert!(state.generated_files.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.stage().name(), "file-generator");
    assert_eq!(mock.call_count(), 4);
    assert_eq!(gateway.pipeline_steps("p3").len(), 1);
    assert!(gateway.file_content("p3", "src/main.rs").is_none());
}

#[tokio::test(start_paused = true)]
async fn validation_issues_halt_before_execution() {
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response(PLAN)
            .with_response(FILES)
            .with_response(ISSUES)
            .with_fallback(MockReply::text(ACTIONS)),
    );
    let gateway = InMemoryGateway::new();

    let outcome = pipeline(&mock, &gateway).run("p4", "req", "").await.unwrap();
    match outcome {
        PipelineOutcome::Halted { state, issues } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].file_path, "src/main.rs");
            assert_eq!(state.validation_errors, issues);
            assert!(state.execution_plan.is_empty());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(mock.call_count(), 3);
    assert!(gateway.file_content("p4", "src/main.rs").is_none());
    assert_eq!(gateway.pipeline_steps("p4").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_action_leaves_earlier_actions_applied() {
    let actions = r#"{"actions":[
        {"type":"create","filePath":"a.rs","content":"a","commitMsg":"add a"},
        {"type":"update","filePath":"missing.rs","content":"b","commitMsg":"edit"},
        {"type":"create","filePath":"c.rs","content":"c","commitMsg":"add c"}
    ]}"#;
    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response(PLAN)
            .with_response(FILES)
            .with_response(CLEAN)
            .with_response(actions),
    );
    let gateway = InMemoryGateway::new();

    let err = pipeline(&mock, &gateway).run("p5", "req", "").await.unwrap_err();
    match &err {
        PipelineError::ActionFailed { index, action, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(action.file_path, "missing.rs");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.state().execution_plan.len(), 3);
    assert_eq!(gateway.file_content("p5", "a.rs").as_deref(), Some("a"));
    assert!(gateway.file_content("p5", "c.rs").is_none());
}

#[tokio::test(start_paused = true)]
async fn revert_actions_restore_previous_versions() {
    let gateway = InMemoryGateway::new();
    gateway.create_file_version("p6", "lib.rs", "old", "init").await.unwrap();
    gateway.update_file("p6", "lib.rs", "broken", "oops").await.unwrap();

    let mock = Arc::new(
        MockLlm::new("mock")
            .with_response(PLAN)
            .with_response(FILES)
            .with_response(CLEAN)
            .with_response(r#"{"actions":[{"type":"revert","filePath":"lib.rs","commitMsg":"revert oops"}]}"#),
    );
    let outcome = pipeline(&mock, &gateway).run("p6", "req", "").await.unwrap();
    assert!(matches!(outcome, PipelineOutcome::Completed { applied: 1, .. }));
    assert_eq!(gateway.file_content("p6", "lib.rs").as_deref(), Some("old"));
}

#[tokio::test(start_paused = true)]
async fn custom_attempt_budget_is_honoured() {
    let mock = Arc::new(MockLlm::new("mock").with_fallback(MockReply::error("timeout")));
    let gateway = InMemoryGateway::new();
    let config = PipelineConfig { max_attempts: 1, ..PipelineConfig::default() };

    let err =
        pipeline(&mock, &gateway).with_config(config).run("p7", "req", "").await.unwrap_err();
    assert!(matches!(err, PipelineError::ExhaustedRetries { stage: Stage::ProjectArchitect, attempts: 1, .. }));
    assert_eq!(mock.call_count(), 1);
}
