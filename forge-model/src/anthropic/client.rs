use super::convert::{self, MessagesResponse};
use crate::framing::{Framing, token_stream};
use crate::http::{DEFAULT_TIMEOUT_SECS, http_client, join_url, read_json, send};
use crate::keys::KeyRotation;
use crate::retry::RetryConfig;
use async_trait::async_trait;
use forge_core::{ChatMessage, GenerateOptions, Llm, Response, Result, TokenStream};
use forge_telemetry::{Instrument, model_call_span};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const VENDOR: &str = "Anthropic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    /// Whole-request deadline in seconds, streamed bodies included.
    #[serde(default = "crate::http::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_keys: vec![api_key.into()],
            base_url: ANTHROPIC_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_keys(mut self, api_keys: Vec<String>) -> Self {
        self.api_keys = api_keys;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
    keys: KeyRotation,
    retry_config: RetryConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let keys = KeyRotation::new(config.api_keys.clone())?;
        let client = http_client(VENDOR, config.timeout_secs)?;
        Ok(Self { client, config, keys, retry_config: RetryConfig::disabled() })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let url = join_url(&self.config.base_url, "v1/messages");
        let api_key = self.keys.next_key().to_string();
        send(&self.retry_config, VENDOR, || {
            self.client
                .post(&url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(body)
        })
        .await
    }
}

#[async_trait]
impl Llm for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
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
            let parsed: MessagesResponse = read_json(VENDOR, response).await?;
            let (content, usage) = convert::into_content(parsed);
            Ok(Response::new(content).with_usage(usage))
        }
        .instrument(model_call_span("anthropic", model))
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
            Ok(token_stream(response, Framing::Sse, VENDOR, convert::stream_chunk))
        }
        .instrument(model_call_span("anthropic", model))
        .await
    }
}
