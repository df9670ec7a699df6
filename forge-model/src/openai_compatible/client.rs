use super::config::OpenAiCompatibleConfig;
use super::convert::{self, ChatCompletionResponse};
use crate::framing::{Framing, token_stream};
use crate::http::{http_client, join_url, read_json, send};
use crate::keys::KeyRotation;
use crate::retry::RetryConfig;
use async_trait::async_trait;
use forge_core::{ChatMessage, GenerateOptions, Llm, Response, Result, TokenStream};
use forge_telemetry::{Instrument, model_call_span};
use reqwest::Client;
use serde_json::Value;

/// Client for OpenAI-compatible chat-completion endpoints.
///
/// # Example
///
/// ```rust,ignore
/// use forge_model::openai_compatible::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
///
/// let client = OpenAiCompatibleClient::new(OpenAiCompatibleConfig::groq(api_key))?;
/// let reply = client.generate("hello", "llama-3.3-70b-versatile", &Default::default()).await?;
/// ```
pub struct OpenAiCompatibleClient {
    client: Client,
    config: OpenAiCompatibleConfig,
    keys: KeyRotation,
    retry_config: RetryConfig,
}

impl OpenAiCompatibleClient {
    /// Fails with a configuration error when no API key is present.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self> {
        let keys = KeyRotation::new(config.api_keys.clone())?;
        let client = http_client(&config.name, config.timeout_secs)?;
        Ok(Self { client, config, keys, retry_config: RetryConfig::disabled() })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn config(&self) -> &OpenAiCompatibleConfig {
        &self.config
    }

    fn vendor(&self) -> &'static str {
        match self.config.name.as_str() {
            "openai" => "OpenAI",
            "groq" => "Groq",
            "deepseek" => "DeepSeek",
            "xai" => "xAI",
            _ => "OpenAI-compatible",
        }
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let url = join_url(&self.config.base_url, "chat/completions");
        let api_key = self.keys.next_key().to_string();
        send(&self.retry_config, self.vendor(), || {
            self.client.post(&url).bearer_auth(&api_key).json(body)
        })
        .await
    }
}

#[async_trait]
impl Llm for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn generate_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<Response> {
        let span = model_call_span(&self.config.name, model);
        async {
            let body = convert::build_body(prompt, history, model, options, false)?;
            let response = self.post(&body).await?;
            let parsed: ChatCompletionResponse = read_json(self.vendor(), response).await?;
            let (content, usage) = convert::into_content(self.vendor(), parsed)?;
            Ok(Response::new(content).with_usage(usage))
        }
        .instrument(span)
        .await
    }

    async fn generate_stream_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<TokenStream> {
        let span = model_call_span(&self.config.name, model);
        async {
            let body = convert::build_body(prompt, history, model, options, true)?;
            let response = self.post(&body).await?;
            let vendor = self.vendor();
            Ok(token_stream(response, Framing::Sse, vendor, move |payload| {
                convert::stream_chunk(vendor, payload)
            }))
        }
        .instrument(span)
        .await
    }
}
