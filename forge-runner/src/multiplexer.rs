use forge_core::{EventStream, Result, StreamEvent, TokenStream};
use forge_reasoning::{ReasoningEvent, ReasoningResult, ReasoningStream};
use futures::StreamExt;
use futures::future::BoxFuture;

/// Resolves the thread id once reasoning is over.
pub type ChatIdFuture = BoxFuture<'static, Result<String>>;

/// Opens the answer stream, given the reasoning result when reasoning ran.
pub type AnswerFactory =
    Box<dyn FnOnce(Option<ReasoningResult>) -> BoxFuture<'static, Result<TokenStream>> + Send>;

/// Runs after the last answer token with `(chat_id, full_answer)`, before `Done`.
pub type FinishHook = Box<dyn FnOnce(String, String) -> BoxFuture<'static, Result<()>> + Send>;

/// Merges an optional reasoning stream and an answer stream into one ordered event stream:
/// thinking events, one `ChatIdAssigned`, answer tokens, then exactly one `Done` or `Error`.
///
/// Nothing runs until the returned stream is polled, and each upstream item is forwarded
/// before the next one is requested, so a slow consumer stalls the provider read. Dropping the
/// stream drops the upstream streams and cancels their requests.
pub struct StreamMultiplexer {
    reasoning: Option<ReasoningStream>,
    chat_id: ChatIdFuture,
    answer: AnswerFactory,
    on_finish: Option<FinishHook>,
}

impl StreamMultiplexer {
    pub fn new(chat_id: ChatIdFuture, answer: AnswerFactory) -> Self {
        Self { reasoning: None, chat_id, answer, on_finish: None }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: ReasoningStream) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    #[must_use]
    pub fn on_finish(mut self, hook: FinishHook) -> Self {
        self.on_finish = Some(hook);
        self
    }

    pub fn into_stream(self) -> EventStream {
        let Self { reasoning, chat_id, answer, on_finish } = self;

        let stream = async_stream::stream! {
            let mut reasoning_result = None;
            if let Some(mut reasoning) = reasoning {
                while let Some(event) = reasoning.next().await {
                    match event {
                        Ok(ReasoningEvent::ComplexityDetected(level)) => {
                            yield StreamEvent::ComplexityDetected(level);
                        }
                        Ok(ReasoningEvent::Item { text, .. }) => yield StreamEvent::ThinkingToken(text),
                        Ok(ReasoningEvent::StepComplete(index)) => yield StreamEvent::StepComplete(index),
                        Ok(ReasoningEvent::Finished(result)) => reasoning_result = Some(result),
                        Err(error) => {
                            yield StreamEvent::Error(error.to_string());
                            return;
                        }
                    }
                }
            }

            let chat_id = match chat_id.await {
                Ok(id) => id,
                Err(error) => {
                    yield StreamEvent::Error(error.to_string());
                    return;
                }
            };
            yield StreamEvent::ChatIdAssigned(chat_id.clone());

            let mut tokens = match answer(reasoning_result).await {
                Ok(tokens) => tokens,
                Err(error) => {
                    yield StreamEvent::Error(error.to_string());
                    return;
                }
            };
            let mut full_answer = String::new();
            while let Some(fragment) = tokens.next().await {
                match fragment {
                    Ok(text) => {
                        full_answer.push_str(&text);
                        yield StreamEvent::Token(text);
                    }
                    Err(error) => {
                        yield StreamEvent::Error(error.to_string());
                        return;
                    }
                }
            }

            if let Some(hook) = on_finish {
                if let Err(error) = hook(chat_id, full_answer).await {
                    yield StreamEvent::Error(error.to_string());
                    return;
                }
            }
            yield StreamEvent::Done;
        };
        Box::pin(stream)
    }
}

/// A stream holding only `Error(message)`.
pub(crate) fn error_stream(message: String) -> EventStream {
    Box::pin(futures::stream::iter([StreamEvent::Error(message)]))
}
