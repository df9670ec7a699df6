use crate::payload::{ExecutionAction, FileValidation, GeneratedFile, ProjectPlan};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};

/// Accumulator threaded through the stages. Only the driver mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub requirements: String,
    pub project_context: String,
    pub plan: Option<ProjectPlan>,
    pub generated_files: Vec<GeneratedFile>,
    /// Only files with at least one issue.
    pub validation_errors: Vec<FileValidation>,
    pub execution_plan: Vec<ExecutionAction>,
}

impl PipelineState {
    pub fn new(requirements: impl Into<String>, project_context: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into(),
            project_context: project_context.into(),
            ..Self::default()
        }
    }
}

/// One try at a stage. Lives only for the duration of the call and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAttempt {
    pub stage: Stage,
    /// 1-based.
    pub attempt_number: u32,
    /// One note per rejected attempt, oldest first.
    pub corrections: Vec<String>,
}

impl StageAttempt {
    pub fn first(stage: Stage) -> Self {
        Self { stage, attempt_number: 1, corrections: Vec::new() }
    }

    /// The follow-up attempt after `error` rejected this one. Earlier notes are kept.
    pub fn retry_after(&self, error: &impl std::fmt::Display) -> Self {
        let mut corrections = self.corrections.clone();
        corrections.push(format!("Format correction needed: {error}"));
        Self { stage: self.stage, attempt_number: self.attempt_number + 1, corrections }
    }
}
