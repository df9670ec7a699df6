use crate::memory::MemoryExtractor;
use crate::multiplexer::{AnswerFactory, ChatIdFuture, FinishHook, StreamMultiplexer, error_stream};
use forge_core::{ChatMessage, EventStream, GenerateOptions, Llm, Result, Role, TokenStream, Usage};
use forge_model::{ModelRegistry, ResolvedModel};
use forge_reasoning::{ReasoningConfig, ReasoningEngine, ReasoningResult, StepKind};
use forge_session::PersistenceGateway;
use forge_telemetry::{Instrument, Span, chat_stream_span};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One chat turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    /// Earlier turns, in conversation order.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Registry default when unset.
    #[serde(default)]
    pub model: Option<String>,
    /// Run the reasoning engine first with this step kind.
    #[serde(default)]
    pub reasoning: Option<StepKind>,
    /// Continue this thread; a new thread is created when unset or unknown.
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub options: GenerateOptions,
}

impl ChatRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), message: message.into(), ..Self::default() }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_reasoning(mut self, kind: StepKind) -> Self {
        self.reasoning = Some(kind);
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub thread_id: String,
    pub model: String,
    pub content: String,
    pub usage: Usage,
    pub reasoning: Option<ReasoningResult>,
}

/// Fold the reasoning text into the prompt sent for the final answer.
pub fn final_prompt(message: &str, reasoning: Option<&ReasoningResult>) -> String {
    match reasoning {
        Some(result) => format!(
            "Use the reasoning below to answer the message. Do not repeat the reasoning itself.\n\n\
             Reasoning (complexity: {}):\n{}\n\nMessage:\n{message}",
            result.complexity, result.full_reasoning_text
        ),
        None => message.to_string(),
    }
}

/// Routes chat turns: model resolution, optional reasoning, persistence and the final call.
pub struct ChatService {
    registry: Arc<ModelRegistry>,
    gateway: Arc<dyn PersistenceGateway>,
    reasoning: ReasoningConfig,
    extract_memories: bool,
}

impl ChatService {
    pub fn new(registry: Arc<ModelRegistry>, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { registry, gateway, reasoning: ReasoningConfig::default(), extract_memories: true }
    }

    #[must_use]
    pub fn with_reasoning_config(mut self, config: ReasoningConfig) -> Self {
        self.reasoning = config;
        self
    }

    #[must_use]
    pub fn with_memory_extraction(mut self, enabled: bool) -> Self {
        self.extract_memories = enabled;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    fn reasoning_engine(&self, resolved: &ResolvedModel, kind: StepKind) -> ReasoningEngine {
        ReasoningEngine::new(Arc::clone(&resolved.adapter), resolved.descriptor.id.clone())
            .with_config(self.reasoning.clone().with_kind(kind))
    }

    fn memory_extractor(&self, resolved: &ResolvedModel) -> Option<MemoryExtractor> {
        self.extract_memories.then(|| {
            MemoryExtractor::new(
                Arc::clone(&resolved.adapter),
                resolved.descriptor.id.clone(),
                Arc::clone(&self.gateway),
            )
        })
    }

    /// Complete one turn and return the whole answer.
    pub async fn send(&self, request: ChatRequest) -> Result<ChatReply> {
        let resolved = self.registry.resolve_or_default(request.model.as_deref())?;
        let model = resolved.descriptor.id.clone();

        let reasoning = match request.reasoning {
            Some(kind) => Some(self.reasoning_engine(&resolved, kind).run(&request.message).await?),
            None => None,
        };

        let thread_id = open_thread(self.gateway.as_ref(), &request).await?;
        self.gateway.append_message(&thread_id, Role::User, &request.message).await?;

        let prompt = final_prompt(&request.message, reasoning.as_ref());
        let response = resolved
            .adapter
            .generate_with_history(&prompt, &request.history, &model, &request.options)
            .await?;

        self.gateway.append_message(&thread_id, Role::Assistant, &response.content).await?;
        if let Some(extractor) = self.memory_extractor(&resolved) {
            extractor.spawn(request.user_id.clone(), request.message.clone(), response.content.clone());
        }

        Ok(ChatReply { thread_id, model, content: response.content, usage: response.usage, reasoning })
    }

    /// Stream one turn as ordered [`StreamEvent`](forge_core::StreamEvent)s. Failures, including
    /// an unknown model, arrive as a terminal `Error` event.
    pub fn stream(&self, request: ChatRequest) -> EventStream {
        let resolved = match self.registry.resolve_or_default(request.model.as_deref()) {
            Ok(resolved) => resolved,
            Err(error) => return error_stream(error.to_string()),
        };
        let model = resolved.descriptor.id.clone();
        let span = chat_stream_span(&model, request.reasoning.is_some());
        let request = Arc::new(request);

        let chat_id: ChatIdFuture = {
            let gateway = Arc::clone(&self.gateway);
            let request = Arc::clone(&request);
            let span = span.clone();
            async move {
                let thread_id = open_thread(gateway.as_ref(), &request).await?;
                Span::current().record("thread.id", thread_id.as_str());
                gateway.append_message(&thread_id, Role::User, &request.message).await?;
                Ok(thread_id)
            }
            .instrument(span)
            .boxed()
        };

        let answer: AnswerFactory = {
            let adapter = Arc::clone(&resolved.adapter);
            let request = Arc::clone(&request);
            let model = model.clone();
            let streaming = resolved.descriptor.supports_streaming;
            let span = span.clone();
            Box::new(move |reasoning: Option<ReasoningResult>| {
                async move {
                    let prompt = final_prompt(&request.message, reasoning.as_ref());
                    open_answer(adapter.as_ref(), streaming, &prompt, &request, &model).await
                }
                .instrument(span)
                .boxed()
            })
        };

        let on_finish: FinishHook = {
            let gateway = Arc::clone(&self.gateway);
            let extractor = self.memory_extractor(&resolved);
            let request = Arc::clone(&request);
            Box::new(move |thread_id: String, answer: String| {
                async move {
                    gateway.append_message(&thread_id, Role::Assistant, &answer).await?;
                    if let Some(extractor) = extractor {
                        extractor.spawn(request.user_id.clone(), request.message.clone(), answer);
                    }
                    Ok(())
                }
                .instrument(span)
                .boxed()
            })
        };

        let mut multiplexer = StreamMultiplexer::new(chat_id, answer).on_finish(on_finish);
        if let Some(kind) = request.reasoning {
            multiplexer =
                multiplexer.with_reasoning(self.reasoning_engine(&resolved, kind).run_stream(&request.message));
        }
        multiplexer.into_stream()
    }
}

/// Reuse the requested thread when it exists, otherwise create one titled after the message.
async fn open_thread(gateway: &dyn PersistenceGateway, request: &ChatRequest) -> Result<String> {
    if let Some(thread_id) = &request.thread_id {
        if let Some(thread) = gateway.find_thread(thread_id).await? {
            return Ok(thread.id);
        }
        tracing::warn!(thread.id = %thread_id, "requested thread not found; starting a new one");
    }
    gateway.create_thread(&request.user_id, &thread_title(&request.message)).await
}

fn thread_title(message: &str) -> String {
    let title = message.split_whitespace().take(8).collect::<Vec<_>>().join(" ");
    if title.is_empty() { "New chat".to_string() } else { title }
}

/// Models without streaming support are called once and delivered as a single fragment.
async fn open_answer(
    adapter: &dyn Llm,
    streaming: bool,
    prompt: &str,
    request: &ChatRequest,
    model: &str,
) -> Result<TokenStream> {
    if streaming {
        return adapter
            .generate_stream_with_history(prompt, &request.history, model, &request.options)
            .await;
    }
    let response =
        adapter.generate_with_history(prompt, &request.history, model, &request.options).await?;
    let fragments: Vec<Result<String>> = vec![Ok(response.content)];
    Ok(Box::pin(futures::stream::iter(fragments)))
}
