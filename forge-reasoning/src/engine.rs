use crate::config::ReasoningConfig;
use crate::parse::parse_batch;
use crate::prompt::build_prompt;
use crate::state::ReasoningLoop;
use crate::step::ReasoningResult;
use forge_core::{ComplexityLevel, ForgeError, GenerateOptions, Llm, Result};
use forge_telemetry::{Instrument, reasoning_iteration_span, reasoning_span};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;

/// Progress of a reasoning run, in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasoningEvent {
    /// Emitted at most once, after the first batch.
    ComplexityDetected(ComplexityLevel),
    Item { batch_index: usize, text: String },
    StepComplete(usize),
    /// Always the last event of a successful run.
    Finished(ReasoningResult),
}

pub type ReasoningStream = Pin<Box<dyn Stream<Item = Result<ReasoningEvent>> + Send>>;

/// Drives a [`ReasoningLoop`] against one model.
///
/// Each iteration is a single model call with no retry: a provider error ends the run, while a
/// malformed reply only degrades that batch to the sentinel item.
pub struct ReasoningEngine {
    llm: Arc<dyn Llm>,
    model: String,
    config: ReasoningConfig,
}

impl ReasoningEngine {
    pub fn new(llm: Arc<dyn Llm>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into(), config: ReasoningConfig::default() }
    }

    #[must_use]
    pub fn with_config(mut self, config: ReasoningConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    /// Run to completion.
    pub async fn run(&self, message: &str) -> Result<ReasoningResult> {
        let mut events = self.run_stream(message);
        while let Some(event) = events.next().await {
            if let ReasoningEvent::Finished(result) = event? {
                return Ok(result);
            }
        }
        Err(ForgeError::Provider("reasoning stream ended without a result".to_string()))
    }

    /// Lazily run the loop, yielding each batch as soon as its reply is parsed.
    pub fn run_stream(&self, message: &str) -> ReasoningStream {
        let llm = Arc::clone(&self.llm);
        let model = self.model.clone();
        let config = self.config.clone();
        let message = message.to_string();
        let span = reasoning_span(config.kind.as_str(), message.len());

        let stream = async_stream::try_stream! {
            let word_cap = config.effective_word_cap();
            let mut options = GenerateOptions::new();
            options.temperature = config.temperature;
            let mut state = ReasoningLoop::from_config(&config);

            loop {
                let iteration = state.iteration();
                let prompt =
                    build_prompt(config.kind, &message, state.steps(), config.max_items, word_cap);
                let iteration_span = span.in_scope(|| reasoning_iteration_span(iteration));
                let reply = llm.generate(&prompt, &model, &options).instrument(iteration_span).await?;

                let batch = parse_batch(&reply.content, config.max_items, word_cap);
                if batch.is_sentinel() {
                    span.in_scope(|| {
                        tracing::warn!(iteration, "reasoning reply had no numbered items");
                    });
                }

                let transition = state.advance(batch);
                if let Some(level) = transition.complexity_detected {
                    span.record("complexity", level.as_str());
                    yield ReasoningEvent::ComplexityDetected(level);
                }
                let batch_index = transition.step.batch_index;
                for text in transition.step.items {
                    yield ReasoningEvent::Item { batch_index, text };
                }
                yield ReasoningEvent::StepComplete(batch_index);

                if transition.finished {
                    break;
                }
            }

            let result = state.into_result();
            span.record("iterations", result.iterations());
            span.in_scope(|| {
                tracing::debug!(
                    complexity = %result.complexity,
                    iterations = result.iterations(),
                    "reasoning finished"
                );
            });
            yield ReasoningEvent::Finished(result);
        };
        Box::pin(stream)
    }
}
