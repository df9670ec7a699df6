//! Span helpers for model calls, reasoning runs and pipeline stages.

use tracing::Span;

/// Span around one provider call.
///
/// ```
/// use forge_telemetry::model_call_span;
/// let span = model_call_span("openai", "gpt-4o-mini");
/// let _enter = span.enter();
/// ```
pub fn model_call_span(family: &str, model: &str) -> Span {
    tracing::info_span!("model.call", provider.family = family, model.name = model, otel.kind = "client")
}

/// Span around a whole reasoning run.
pub fn reasoning_span(kind: &str, message_len: usize) -> Span {
    tracing::info_span!(
        "reasoning.run",
        reasoning.kind = kind,
        message.len = message_len,
        complexity = tracing::field::Empty,
        iterations = tracing::field::Empty,
    )
}

pub fn reasoning_iteration_span(iteration: usize) -> Span {
    tracing::debug_span!("reasoning.iteration", iteration = iteration)
}

/// Span around one attempt of a pipeline stage.
pub fn pipeline_stage_span(stage: &str, attempt: u32) -> Span {
    tracing::info_span!("pipeline.stage", stage = stage, attempt = attempt, otel.kind = "internal")
}

pub fn chat_stream_span(model: &str, reasoning: bool) -> Span {
    tracing::info_span!(
        "chat.stream",
        model.name = model,
        reasoning = reasoning,
        thread.id = tracing::field::Empty,
    )
}
