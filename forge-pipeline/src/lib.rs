//! # forge-pipeline
//!
//! Four specialised stages over one [`PipelineState`]:
//!
//! | Stage | Reply |
//! |-------|-------|
//! | `project-architect` | `{"plan":{"structure":[...],"dependencies":[],"challenges":[]}}` |
//! | `file-generator` | `{"files":[{"path","content","dependencies","validationChecks"}]}` |
//! | `code-validator` | `{"validation":[{"filePath","issues":[...]}]}` |
//! | `execution-agent` | `{"actions":[{"type","filePath","content","commitMsg"}]}` |
//!
//! Replies may be wrapped in markdown fences. A reply that is not JSON, does not match its
//! schema, or fails its stage's structural check consumes one attempt, exactly like a transport
//! failure. Validation issues halt the run before any file is written.

pub mod config;
pub mod driver;
pub mod error;
pub mod parse;
pub mod payload;
pub mod prompt;
pub mod stage;
pub mod state;

pub use config::PipelineConfig;
pub use driver::{AgentPipeline, PipelineOutcome};
pub use error::{PipelineError, Result};
pub use parse::{parse_stage_output, strip_code_fences};
pub use payload::{
    ActionKind, ExecutionAction, FileValidation, GeneratedFile, Issue, PlanEntry, ProjectPlan,
    StageOutput,
};
pub use stage::Stage;
pub use state::{PipelineState, StageAttempt};
