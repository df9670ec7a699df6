use forge_core::{ComplexityLevel, ForgeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator placed between rendered batches in [`ReasoningResult::full_reasoning_text`].
pub const BATCH_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Chain-of-thought: full sentences, up to 20 words per item.
    #[default]
    Thought,
    /// Chain-of-drafts: terse notes, up to 5 words per item.
    Draft,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thought => "thought",
            Self::Draft => "draft",
        }
    }

    pub fn word_cap(&self) -> usize {
        match self {
            Self::Thought => 20,
            Self::Draft => 5,
        }
    }

    /// Iteration bound fixed by the complexity declared on the first iteration.
    pub fn max_iterations(&self, complexity: ComplexityLevel) -> usize {
        match (self, complexity) {
            (_, ComplexityLevel::Low) => 2,
            (_, ComplexityLevel::Medium) => 4,
            (_, ComplexityLevel::High) => 8,
            (Self::Thought, ComplexityLevel::VeryHigh) => 20,
            (Self::Draft, ComplexityLevel::VeryHigh) => 8,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thought" | "thoughts" | "cot" => Ok(Self::Thought),
            "draft" | "drafts" | "cod" => Ok(Self::Draft),
            other => Err(ForgeError::Config(format!("unknown reasoning kind '{other}'"))),
        }
    }
}

/// One iteration's numbered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub batch_index: usize,
    pub items: Vec<String>,
    pub kind: StepKind,
}

impl ReasoningStep {
    /// `1. first\n2. second`
    pub fn render(&self) -> String {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Terminal artifact of one reasoning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningResult {
    pub full_reasoning_text: String,
    pub steps: Vec<ReasoningStep>,
    pub complexity: ComplexityLevel,
}

impl ReasoningResult {
    pub fn new(steps: Vec<ReasoningStep>, complexity: ComplexityLevel) -> Self {
        let full_reasoning_text =
            steps.iter().map(ReasoningStep::render).collect::<Vec<_>>().join(BATCH_SEPARATOR);
        Self { full_reasoning_text, steps, complexity }
    }

    pub fn iterations(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let expected_thought = [2, 4, 8, 20];
        let expected_draft = [2, 4, 8, 8];
        for (i, level) in ComplexityLevel::ALL.into_iter().enumerate() {
            assert_eq!(StepKind::Thought.max_iterations(level), expected_thought[i]);
            assert_eq!(StepKind::Draft.max_iterations(level), expected_draft[i]);
        }
    }

    #[test]
    fn test_full_text_rendering() {
        let steps = vec![
            ReasoningStep { batch_index: 0, items: vec!["a".into(), "b".into()], kind: StepKind::Draft },
            ReasoningStep { batch_index: 1, items: vec!["c".into()], kind: StepKind::Draft },
        ];
        let result = ReasoningResult::new(steps, ComplexityLevel::Medium);
        assert_eq!(result.full_reasoning_text, "1. a\n2. b\n---\n1. c");
        assert_eq!(result.iterations(), 2);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Draft".parse::<StepKind>().unwrap(), StepKind::Draft);
        assert_eq!("cot".parse::<StepKind>().unwrap(), StepKind::Thought);
        assert!("plan".parse::<StepKind>().is_err());
    }
}
