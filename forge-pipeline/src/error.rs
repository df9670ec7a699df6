use crate::payload::ExecutionAction;
use crate::stage::Stage;
use crate::state::PipelineState;
use forge_core::ForgeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Terminal pipeline failures. Each carries the state accumulated so far.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        stage: Stage,
        attempts: u32,
        last_error: ForgeError,
        state: Box<PipelineState>,
    },

    /// A non-retryable error ended the stage on its first occurrence.
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: ForgeError,
        state: Box<PipelineState>,
    },

    /// Actions before `index` stay applied.
    #[error("Action {index} ({:?} {}) failed: {source}", .action.kind, .action.file_path)]
    ActionFailed {
        index: usize,
        action: ExecutionAction,
        #[source]
        source: ForgeError,
        state: Box<PipelineState>,
    },

    #[error("Recording stage '{stage}' failed: {source}")]
    Persistence {
        stage: Stage,
        #[source]
        source: ForgeError,
        state: Box<PipelineState>,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::ExhaustedRetries { stage, .. }
            | Self::StageFailed { stage, .. }
            | Self::Persistence { stage, .. } => *stage,
            Self::ActionFailed { .. } => Stage::ExecutionAgent,
        }
    }

    /// State accumulated before the failure.
    pub fn state(&self) -> &PipelineState {
        match self {
            Self::ExhaustedRetries { state, .. }
            | Self::StageFailed { state, .. }
            | Self::ActionFailed { state, .. }
            | Self::Persistence { state, .. } => state,
        }
    }
}
