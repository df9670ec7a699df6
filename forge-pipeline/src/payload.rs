//! Structured replies of each stage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectReply {
    pub plan: ProjectPlan,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub structure: Vec<PlanEntry>,
    #[serde(default)]
    pub dependencies: Vec<Value>,
    #[serde(default)]
    pub challenges: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorReply {
    pub files: Vec<GeneratedFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub validation_checks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorReply {
    pub validation: Vec<FileValidation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidation {
    pub file_path: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorReply {
    pub actions: Vec<ExecutionAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Revert,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Revert => "revert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub file_path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub commit_msg: String,
}

/// One validated stage reply. Each stage produces exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Plan(ProjectPlan),
    Files(Vec<GeneratedFile>),
    Validation(Vec<FileValidation>),
    Actions(Vec<ExecutionAction>),
}

impl StageOutput {
    /// Short description persisted with the stage record.
    pub fn summary(&self) -> String {
        match self {
            Self::Plan(plan) => format!(
                "planned {} entries, {} dependencies",
                plan.structure.len(),
                plan.dependencies.len()
            ),
            Self::Files(files) => format!("generated {} files", files.len()),
            Self::Validation(reports) => {
                let flagged = reports.iter().filter(|r| !r.issues.is_empty()).count();
                format!("validated {} files, {flagged} with issues", reports.len())
            }
            Self::Actions(actions) => format!("planned {} actions", actions.len()),
        }
    }
}
