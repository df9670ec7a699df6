use async_trait::async_trait;
use forge_core::{
    ChatMessage, ForgeError, GenerateOptions, Llm, Response, Result, TokenStream, Usage,
};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Streamed as these exact fragments; joined for batch calls.
    Fragments(Vec<String>),
    /// The call itself fails.
    ProviderError(String),
    /// The stream yields `fragments`, then fails with `error`. Batch calls fail outright.
    StreamError { fragments: Vec<String>, error: String },
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fragments(fragments.into_iter().map(Into::into).collect())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::ProviderError(message.into())
    }
}

/// What a call to the mock looked like.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub history: Vec<ChatMessage>,
    pub model: String,
    pub options: GenerateOptions,
    pub streamed: bool,
}

/// Scripted adapter: replies are consumed in order, then `fallback` (if any) repeats forever.
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<MockReply>>,
    fallback: Option<MockReply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        lock(&self.script).push_back(reply);
        self
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_reply(MockReply::text(text))
    }

    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    fn next_reply(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
        streamed: bool,
    ) -> Result<MockReply> {
        lock(&self.calls).push(RecordedCall {
            prompt: prompt.to_string(),
            history: history.to_vec(),
            model: model.to_string(),
            options: options.clone(),
            streamed,
        });
        lock(&self.script)
            .pop_front()
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| ForgeError::Provider(format!("{}: script exhausted", self.name)))
    }
}

// A panicking test thread must not hide the script from the assertions that follow.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<Response> {
        let content = match self.next_reply(prompt, history, model, options, false)? {
            MockReply::Text(text) => text,
            MockReply::Fragments(fragments) => fragments.concat(),
            MockReply::ProviderError(message) | MockReply::StreamError { error: message, .. } => {
                return Err(ForgeError::Provider(message));
            }
        };
        let usage = Usage::new(word_count(prompt), word_count(&content));
        Ok(Response::new(content).with_usage(usage))
    }

    async fn generate_stream_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<TokenStream> {
        let (fragments, error) = match self.next_reply(prompt, history, model, options, true)? {
            MockReply::Text(text) => (vec![text], None),
            MockReply::Fragments(fragments) => (fragments, None),
            MockReply::ProviderError(message) => return Err(ForgeError::Provider(message)),
            MockReply::StreamError { fragments, error } => (fragments, Some(error)),
        };
        let stream = async_stream::stream! {
            for fragment in fragments {
                yield Ok(fragment);
            }
            if let Some(error) = error {
                yield Err(ForgeError::Provider(error));
            }
        };
        Ok(Box::pin(stream))
    }
}

fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::collect_stream;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_script_is_consumed_in_order() {
        let mock = MockLlm::new("mock")
            .with_response("first")
            .with_reply(MockReply::fragments(["a", "b"]))
            .with_fallback(MockReply::text("again"));
        let options = GenerateOptions::new();

        assert_eq!(mock.generate("p", "m", &options).await.unwrap().content, "first");
        assert_eq!(mock.generate("p", "m", &options).await.unwrap().content, "ab");
        assert_eq!(mock.generate("p", "m", &options).await.unwrap().content, "again");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_a_provider_error() {
        let mock = MockLlm::new("mock");
        let err = mock.generate("p", "m", &GenerateOptions::new()).await.unwrap_err();
        assert!(matches!(err, ForgeError::Provider(_)));
    }

    #[tokio::test]
    async fn test_stream_error_after_fragments() {
        let mock = MockLlm::new("mock").with_reply(MockReply::StreamError {
            fragments: vec!["partial".into()],
            error: "connection reset".into(),
        });
        let mut stream =
            mock.generate_stream("p", "m", &GenerateOptions::new()).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_records_history_and_streaming_flag() {
        let mock = MockLlm::new("mock").with_fallback(MockReply::text("ok"));
        let history = vec![ChatMessage::user("earlier")];
        let stream = mock
            .generate_stream_with_history("now", &history, "m", &GenerateOptions::new())
            .await
            .unwrap();
        assert_eq!(collect_stream(stream).await.unwrap(), "ok");

        let call = &mock.calls()[0];
        assert!(call.streamed);
        assert_eq!(call.history.len(), 1);
        assert_eq!(call.prompt, "now");
    }
}
