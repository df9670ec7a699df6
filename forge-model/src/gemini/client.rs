use super::convert::{self, GenerateContentResponse};
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

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const VENDOR: &str = "Gemini";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Several keys are rotated round-robin per request.
    pub api_keys: Vec<String>,
    pub base_url: String,
    /// Whole-request deadline in seconds, streamed bodies included.
    #[serde(default = "crate::http::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_keys(vec![api_key.into()])
    }

    pub fn with_keys(api_keys: Vec<String>) -> Self {
        Self {
            api_keys,
            base_url: GEMINI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    keys: KeyRotation,
    retry_config: RetryConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let keys = KeyRotation::new(config.api_keys.clone())?;
        let client = http_client(VENDOR, config.timeout_secs)?;
        Ok(Self { client, config, keys, retry_config: RetryConfig::disabled() })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        let url = join_url(&self.config.base_url, path);
        let api_key = self.keys.next_key().to_string();
        send(&self.retry_config, VENDOR, || {
            self.client.post(&url).header("x-goog-api-key", &api_key).json(body)
        })
        .await
    }
}

#[async_trait]
impl Llm for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_with_history(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        model: &str,
        options: &GenerateOptions,
    ) -> Result<Response> {
        async {
            let body = convert::build_body(prompt, history, options)?;
            let path = format!("models/{model}:generateContent");
            let response = self.post(&path, &body).await?;
            let parsed: GenerateContentResponse = read_json(VENDOR, response).await?;
            let (content, usage) = convert::into_content(parsed)?;
            Ok(Response::new(content).with_usage(usage))
        }
        .instrument(model_call_span("gemini", model))
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
            let body = convert::build_body(prompt, history, options)?;
            let path = format!("models/{model}:streamGenerateContent?alt=sse");
            let response = self.post(&path, &body).await?;
            Ok(token_stream(response, Framing::Sse, VENDOR, convert::stream_chunk))
        }
        .instrument(model_call_span("gemini", model))
        .await
    }
}
