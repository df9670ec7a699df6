use anyhow::{Context, Result};
use forge_model::{ModelRegistry, ProvidersConfig};
use forge_pipeline::PipelineConfig;
use forge_reasoning::ReasoningConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Export spans to this OTLP collector when set.
    pub otlp_endpoint: Option<String>,
}

/// Contents of `forge.toml`. Every table is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub default_model: Option<String>,
    pub providers: ProvidersConfig,
    pub reasoning: ReasoningConfig,
    pub pipeline: PipelineConfig,
    pub telemetry: TelemetryConfig,
}

impl ForgeConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Build the registry from the configured providers, falling back to `lookup` for
    /// credentials the file leaves out.
    pub fn build_registry<F>(&self, lookup: F) -> ModelRegistry
    where
        F: Fn(&str) -> Option<String>,
    {
        let providers = self.providers.clone().with_env_fallback(lookup);
        let registry = ModelRegistry::from_config(&providers);
        match &self.default_model {
            Some(model) => registry.with_default_model(model.clone()),
            None => registry,
        }
    }
}
