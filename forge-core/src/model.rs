use crate::{Result, types::ChatMessage};
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;

/// Lazy, finite, non-restartable sequence of plain-text fragments.
///
/// Polling performs network I/O; dropping the stream drops the underlying response body and
/// aborts the request.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Uniform wrapper over one vendor's chat-completion API.
///
/// Implementors only provide the `*_with_history` calls; the history-less variants forward
/// with an empty history.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Provider family name (e.g. "openai", "anthropic").
    fn name(&self) -> &str;

    async fn generate_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<Response>;

    async fn generate_stream_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<TokenStream>;

    async fn generate(&self, prompt: &str, model: &str, options: &GenerateOptions) -> Result<Response> {
        self.generate_with_history(prompt, &[], model, options).await
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
    ) -> Result<TokenStream> {
        self.generate_stream_with_history(prompt, &[], model, options).await
    }
}

/// Configuration bag passed through to the vendor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Unrecognized keys, merged verbatim into the vendor request body.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Merge `extra` into a vendor JSON body. Keys already set by the adapter are overwritten,
    /// so callers can override any vendor field.
    pub fn merge_extra_into(&self, body: &mut Value) {
        if let Value::Object(map) = body {
            for (key, value) in &self.extra {
                map.insert(key.clone(), value.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self { prompt_tokens, completion_tokens, total_tokens: prompt_tokens + completion_tokens }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub usage: Usage,
}

impl Response {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), usage: Usage::default() }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

/// Drain a token stream into one string.
pub async fn collect_stream(mut stream: TokenStream) -> Result<String> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}
