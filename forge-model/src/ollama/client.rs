use super::convert::{self, ChatResponse};
use crate::framing::{Framing, token_stream};
use crate::http::{DEFAULT_TIMEOUT_SECS, http_client, join_url, read_json, send};
use crate::retry::RetryConfig;
use async_trait::async_trait;
use forge_core::{ChatMessage, GenerateOptions, Llm, Response, Result, TokenStream};
use forge_telemetry::{Instrument, model_call_span};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OLLAMA_DEFAULT_HOST: &str = "http://localhost:11434";

const VENDOR: &str = "Ollama";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    /// Whole-request deadline in seconds, streamed bodies included.
    #[serde(default = "crate::http::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(OLLAMA_DEFAULT_HOST)
    }
}

impl OllamaConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
    retry_config: RetryConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = http_client(VENDOR, config.timeout_secs)?;
        Ok(Self { client, config, retry_config: RetryConfig::disabled() })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let url = join_url(&self.config.host, "api/chat");
        send(&self.retry_config, VENDOR, || self.client.post(&url).json(body)).await
    }
}

#[async_trait]
impl Llm for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<Response> {
        async {
            let body = convert::build_body(prompt, history, model, options, false)?;
            let response = self.post(&body).await?;
            let parsed: ChatResponse = read_json(VENDOR, response).await?;
            let (content, usage) = convert::into_content(parsed)?;
            Ok(Response::new(content).with_usage(usage))
        }
        .instrument(model_call_span("ollama", model))
        .await
    }

    async fn generate_stream_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<TokenStream> {
        async {
            let body = convert::build_body(prompt, history, model, options, true)?;
            let response = self.post(&body).await?;
            Ok(token_stream(response, Framing::Ndjson, VENDOR, convert::stream_chunk))
        }
        .instrument(model_call_span("ollama", model))
        .await
    }
}
