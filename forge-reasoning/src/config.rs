use crate::step::StepKind;
use serde::{Deserialize, Serialize};

/// Tuning for one reasoning run; loaded from the `[reasoning]` table of `forge.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub kind: StepKind,
    /// Revision is only honoured while the iteration count is below this value.
    pub revision_ceiling: usize,
    /// Items kept per batch.
    pub max_items: usize,
    /// Overrides the kind's default word cap.
    pub word_cap: Option<usize>,
    pub temperature: Option<f32>,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            kind: StepKind::Thought,
            revision_ceiling: 5,
            max_items: 8,
            word_cap: None,
            temperature: Some(0.3),
        }
    }
}

impl ReasoningConfig {
    pub fn with_kind(mut self, kind: StepKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn effective_word_cap(&self) -> usize {
        self.word_cap.unwrap_or_else(|| self.kind.word_cap()).max(1)
    }
}
