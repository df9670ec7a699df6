//! Static model table and per-family adapter resolution.
//!
//! A family whose adapter fails to build (usually a missing API key) is recorded as
//! unavailable; the remaining families keep working.

use crate::anthropic::{AnthropicClient, AnthropicConfig};
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::ollama::{OllamaClient, OllamaConfig};
use crate::openai_compatible::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
use forge_core::{ForgeError, Llm, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
    Gemini,
    Groq,
    DeepSeek,
    Xai,
    Ollama,
}

impl ProviderFamily {
    pub const ALL: [ProviderFamily; 7] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Gemini,
        Self::Groq,
        Self::DeepSeek,
        Self::Xai,
        Self::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::DeepSeek => "deepseek",
            Self::Xai => "xai",
            Self::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-sonnet-latest",
            Self::Gemini => "gemini-2.0-flash",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::DeepSeek => "deepseek-chat",
            Self::Xai => "grok-2-latest",
            Self::Ollama => "llama3.2",
        }
    }

    /// Environment variables consulted, in order, when no key is configured.
    pub fn env_keys(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["OPENAI_API_KEY"],
            Self::Anthropic => &["ANTHROPIC_API_KEY"],
            Self::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Self::Groq => &["GROQ_API_KEY"],
            Self::DeepSeek => &["DEEPSEEK_API_KEY"],
            Self::Xai => &["XAI_API_KEY"],
            Self::Ollama => &[],
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderFamily {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ForgeError::Config(format!("unknown provider family '{s}'")))
    }
}

// (id, family, supports_streaming)
const MODEL_TABLE: &[(&str, ProviderFamily, bool)] = &[
    ("gpt-4o", ProviderFamily::OpenAi, true),
    ("gpt-4o-mini", ProviderFamily::OpenAi, true),
    ("gpt-4.1", ProviderFamily::OpenAi, true),
    ("gpt-4.1-mini", ProviderFamily::OpenAi, true),
    ("o1", ProviderFamily::OpenAi, false),
    ("o3-mini", ProviderFamily::OpenAi, true),
    ("claude-3-5-sonnet-latest", ProviderFamily::Anthropic, true),
    ("claude-3-5-haiku-latest", ProviderFamily::Anthropic, true),
    ("claude-3-7-sonnet-latest", ProviderFamily::Anthropic, true),
    ("claude-sonnet-4-20250514", ProviderFamily::Anthropic, true),
    ("gemini-2.0-flash", ProviderFamily::Gemini, true),
    ("gemini-2.5-pro", ProviderFamily::Gemini, true),
    ("gemini-1.5-pro", ProviderFamily::Gemini, true),
    ("gemini-1.5-flash", ProviderFamily::Gemini, true),
    ("llama-3.3-70b-versatile", ProviderFamily::Groq, true),
    ("llama-3.1-8b-instant", ProviderFamily::Groq, true),
    ("mixtral-8x7b-32768", ProviderFamily::Groq, true),
    ("deepseek-chat", ProviderFamily::DeepSeek, true),
    ("deepseek-reasoner", ProviderFamily::DeepSeek, true),
    ("grok-2-latest", ProviderFamily::Xai, true),
    ("grok-beta", ProviderFamily::Xai, true),
    ("llama3.2", ProviderFamily::Ollama, true),
    ("mistral", ProviderFamily::Ollama, true),
    ("qwen2.5", ProviderFamily::Ollama, true),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub family: ProviderFamily,
    pub supports_streaming: bool,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, family: ProviderFamily, supports_streaming: bool) -> Self {
        Self { id: id.into(), family, supports_streaming }
    }
}

/// Credentials and endpoint override for one family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub api_keys: Vec<String>,
    pub base_url: Option<String>,
    pub enabled: bool,
    /// Overrides the adapter's request deadline.
    pub timeout_secs: Option<u64>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_keys: Vec::new(),
            base_url: None,
            enabled: true,
            timeout_secs: None,
        }
    }
}

impl ProviderSettings {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// All configured keys, `api_key` first, blanks removed.
    pub fn keys(&self) -> Vec<String> {
        self.api_key
            .iter()
            .chain(self.api_keys.iter())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Per-family provider settings, as found under `[providers.<family>]` in `forge.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub gemini: ProviderSettings,
    pub groq: ProviderSettings,
    pub deepseek: ProviderSettings,
    pub xai: ProviderSettings,
    pub ollama: ProviderSettings,
}

impl ProvidersConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_fallback(|name| std::env::var(name).ok())
    }

    pub fn settings(&self, family: ProviderFamily) -> &ProviderSettings {
        match family {
            ProviderFamily::OpenAi => &self.openai,
            ProviderFamily::Anthropic => &self.anthropic,
            ProviderFamily::Gemini => &self.gemini,
            ProviderFamily::Groq => &self.groq,
            ProviderFamily::DeepSeek => &self.deepseek,
            ProviderFamily::Xai => &self.xai,
            ProviderFamily::Ollama => &self.ollama,
        }
    }

    pub fn settings_mut(&mut self, family: ProviderFamily) -> &mut ProviderSettings {
        match family {
            ProviderFamily::OpenAi => &mut self.openai,
            ProviderFamily::Anthropic => &mut self.anthropic,
            ProviderFamily::Gemini => &mut self.gemini,
            ProviderFamily::Groq => &mut self.groq,
            ProviderFamily::DeepSeek => &mut self.deepseek,
            ProviderFamily::Xai => &mut self.xai,
            ProviderFamily::Ollama => &mut self.ollama,
        }
    }

    /// Fill missing keys from the environment. A comma-separated variable yields several keys.
    /// `OLLAMA_HOST` supplies the Ollama base URL.
    pub fn with_env_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for family in ProviderFamily::ALL {
            let settings = self.settings_mut(family);
            if settings.keys().is_empty() {
                let found = family.env_keys().iter().find_map(|name| lookup(name));
                if let Some(value) = found {
                    settings.api_keys = value.split(',').map(|k| k.trim().to_string()).collect();
                }
            }
        }
        if self.ollama.base_url.is_none() {
            self.ollama.base_url = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty());
        }
        self
    }
}

/// A resolved model: its descriptor and the family adapter that serves it.
#[derive(Clone)]
pub struct ResolvedModel {
    pub descriptor: ModelDescriptor,
    pub adapter: Arc<dyn Llm>,
}

impl fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("descriptor", &self.descriptor)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Read-only after construction; share it behind an `Arc`.
pub struct ModelRegistry {
    descriptors: BTreeMap<String, ModelDescriptor>,
    adapters: BTreeMap<ProviderFamily, Arc<dyn Llm>>,
    unavailable: BTreeMap<ProviderFamily, String>,
    default_model: String,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Registry with the static model table and no adapters.
    pub fn new() -> Self {
        let descriptors = MODEL_TABLE
            .iter()
            .map(|(id, family, streaming)| {
                (id.to_string(), ModelDescriptor::new(*id, *family, *streaming))
            })
            .collect();
        Self {
            descriptors,
            adapters: BTreeMap::new(),
            unavailable: BTreeMap::new(),
            default_model: ProviderFamily::OpenAi.default_model().to_string(),
        }
    }

    /// Build one adapter per family. The default model is the first available family's default.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let mut registry = Self::new();
        for family in ProviderFamily::ALL {
            match build_adapter(family, config.settings(family)) {
                Ok(adapter) => {
                    tracing::debug!(family = %family, "provider adapter ready");
                    registry.adapters.insert(family, adapter);
                }
                Err(error) => {
                    tracing::warn!(family = %family, error = %error, "provider unavailable");
                    registry.unavailable.insert(family, error.to_string());
                }
            }
        }
        if let Some(family) = registry.adapters.keys().next() {
            registry.default_model = family.default_model().to_string();
        }
        registry
    }

    #[must_use]
    pub fn with_adapter(mut self, family: ProviderFamily, adapter: Arc<dyn Llm>) -> Self {
        self.unavailable.remove(&family);
        self.adapters.insert(family, adapter);
        self
    }

    #[must_use]
    pub fn with_descriptor(mut self, descriptor: ModelDescriptor) -> Self {
        self.descriptors.insert(descriptor.id.clone(), descriptor);
        self
    }

    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn descriptor(&self, id: &str) -> Option<&ModelDescriptor> {
        self.descriptors.get(id)
    }

    /// Pure lookup: never touches the network.
    pub fn resolve(&self, id: &str) -> Result<ResolvedModel> {
        let descriptor =
            self.descriptors.get(id).ok_or_else(|| ForgeError::UnknownModel(id.to_string()))?;
        let adapter = self.adapters.get(&descriptor.family).ok_or_else(|| {
            ForgeError::ProviderUnavailable {
                family: descriptor.family.to_string(),
                reason: self
                    .unavailable
                    .get(&descriptor.family)
                    .cloned()
                    .unwrap_or_else(|| "not configured".to_string()),
            }
        })?;
        Ok(ResolvedModel { descriptor: descriptor.clone(), adapter: Arc::clone(adapter) })
    }

    pub fn resolve_or_default(&self, id: Option<&str>) -> Result<ResolvedModel> {
        self.resolve(id.unwrap_or(&self.default_model))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.descriptors.values()
    }

    pub fn is_available(&self, family: ProviderFamily) -> bool {
        self.adapters.contains_key(&family)
    }

    pub fn available_families(&self) -> Vec<ProviderFamily> {
        self.adapters.keys().copied().collect()
    }

    pub fn unavailable_reason(&self, family: ProviderFamily) -> Option<&str> {
        self.unavailable.get(&family).map(String::as_str)
    }
}

fn build_adapter(family: ProviderFamily, settings: &ProviderSettings) -> Result<Arc<dyn Llm>> {
    if !settings.enabled {
        return Err(ForgeError::Config("disabled in configuration".to_string()));
    }
    let keys = settings.keys();
    let missing_key = || {
        ForgeError::Config(format!("missing API key (set {})", family.env_keys().join(" or ")))
    };

    let adapter: Arc<dyn Llm> = match family {
        ProviderFamily::OpenAi
        | ProviderFamily::Groq
        | ProviderFamily::DeepSeek
        | ProviderFamily::Xai => {
            let first = keys.first().cloned().ok_or_else(missing_key)?;
            let mut config = match family {
                ProviderFamily::Groq => OpenAiCompatibleConfig::groq(first),
                ProviderFamily::DeepSeek => OpenAiCompatibleConfig::deepseek(first),
                ProviderFamily::Xai => OpenAiCompatibleConfig::xai(first),
                _ => OpenAiCompatibleConfig::openai(first),
            }
            .with_api_keys(keys);
            if let Some(base_url) = &settings.base_url {
                config = config.with_base_url(base_url.clone());
            }
            if let Some(timeout_secs) = settings.timeout_secs {
                config = config.with_timeout_secs(timeout_secs);
            }
            Arc::new(OpenAiCompatibleClient::new(config)?)
        }
        ProviderFamily::Anthropic => {
            let first = keys.first().cloned().ok_or_else(missing_key)?;
            let mut config = AnthropicConfig::new(first).with_api_keys(keys);
            if let Some(base_url) = &settings.base_url {
                config = config.with_base_url(base_url.clone());
            }
            if let Some(timeout_secs) = settings.timeout_secs {
                config = config.with_timeout_secs(timeout_secs);
            }
            Arc::new(AnthropicClient::new(config)?)
        }
        ProviderFamily::Gemini => {
            if keys.is_empty() {
                return Err(missing_key());
            }
            let mut config = GeminiConfig::with_keys(keys);
            if let Some(base_url) = &settings.base_url {
                config = config.with_base_url(base_url.clone());
            }
            if let Some(timeout_secs) = settings.timeout_secs {
                config = config.with_timeout_secs(timeout_secs);
            }
            Arc::new(GeminiClient::new(config)?)
        }
        ProviderFamily::Ollama => {
            let host = settings.base_url.clone().ok_or_else(|| {
                ForgeError::Config("no host configured (set OLLAMA_HOST)".to_string())
            })?;
            let mut config = OllamaConfig::new(host);
            if let Some(timeout_secs) = settings.timeout_secs {
                config = config.with_timeout_secs(timeout_secs);
            }
            Arc::new(OllamaClient::new(config)?)
        }
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_default_is_in_table() {
        let registry = ModelRegistry::new();
        for family in ProviderFamily::ALL {
            let descriptor = registry.descriptor(family.default_model()).unwrap();
            assert_eq!(descriptor.family, family);
        }
    }

    #[test]
    fn test_family_parsing() {
        assert_eq!("OpenAI".parse::<ProviderFamily>().unwrap(), ProviderFamily::OpenAi);
        assert_eq!("deepseek".parse::<ProviderFamily>().unwrap(), ProviderFamily::DeepSeek);
        assert!("cohere".parse::<ProviderFamily>().is_err());
    }

    #[test]
    fn test_env_fallback_splits_key_lists() {
        let config = ProvidersConfig::default().with_env_fallback(|name| match name {
            "GOOGLE_API_KEY" => Some("g1, g2".to_string()),
            "OLLAMA_HOST" => Some("http://10.0.0.2:11434".to_string()),
            _ => None,
        });
        assert_eq!(config.gemini.keys(), vec!["g1".to_string(), "g2".to_string()]);
        assert_eq!(config.ollama.base_url.as_deref(), Some("http://10.0.0.2:11434"));
        assert!(config.openai.keys().is_empty());
    }

    #[test]
    fn test_configured_key_wins_over_env() {
        let mut config = ProvidersConfig::default();
        config.openai = ProviderSettings::default().with_api_key("from-file");
        let config = config.with_env_fallback(|_| Some("from-env".to_string()));
        assert_eq!(config.openai.keys(), vec!["from-file".to_string()]);
    }
}
