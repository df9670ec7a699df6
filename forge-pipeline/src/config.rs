use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Loaded from the `[pipeline]` table of `forge.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Model used by every stage; the registry default when unset.
    pub model: Option<String>,
    pub max_attempts: u32,
    /// Delay unit: attempt `n` failing waits `n × backoff_base_ms`.
    pub backoff_base_ms: u64,
    pub temperature: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { model: None, max_attempts: 3, backoff_base_ms: 500, temperature: Some(0.2) }
    }
}

impl PipelineConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}
