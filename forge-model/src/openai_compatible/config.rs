use crate::http::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com";
pub const XAI_API_BASE: &str = "https://api.x.ai/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiCompatibleConfig {
    /// Family name reported by the client ("openai", "groq", ...).
    pub name: String,
    /// One or more keys; several keys are rotated round-robin.
    pub api_keys: Vec<String>,
    pub base_url: String,
    /// Whole-request deadline in seconds, streamed bodies included.
    #[serde(default = "crate::http::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OpenAiCompatibleConfig {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_keys: vec![api_key.into()],
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", OPENAI_API_BASE, api_key)
    }

    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new("groq", GROQ_API_BASE, api_key)
    }

    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self::new("deepseek", DEEPSEEK_API_BASE, api_key)
    }

    pub fn xai(api_key: impl Into<String>) -> Self {
        Self::new("xai", XAI_API_BASE, api_key)
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
