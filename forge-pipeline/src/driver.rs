use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::parse::parse_stage_output;
use crate::payload::{ActionKind, ExecutionAction, FileValidation, StageOutput};
use crate::prompt::{build_prompt, system_prompt};
use crate::stage::Stage;
use crate::state::{PipelineState, StageAttempt};
use forge_core::{ForgeError, GenerateOptions, Llm};
use forge_model::RetryConfig;
use forge_session::{PersistenceGateway, ProjectFileStore, StageRecord};
use forge_telemetry::{Instrument, pipeline_stage_span};
use std::sync::Arc;

/// Terminal, non-error results of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Every stage ran; `applied` actions were written to the project store.
    Completed { state: PipelineState, applied: usize },
    /// The code validator reported issues, so the execution agent never ran.
    Halted { state: PipelineState, issues: Vec<FileValidation> },
}

impl PipelineOutcome {
    pub fn state(&self) -> &PipelineState {
        match self {
            Self::Completed { state, .. } | Self::Halted { state, .. } => state,
        }
    }
}

/// Sequential driver for `project-architect → file-generator → code-validator →
/// execution-agent`.
///
/// Each stage gets up to `max_attempts` calls. A rejected reply (transport, format or
/// validation error) is described to the next attempt through its prompt only; the history
/// sent to the model stays empty.
pub struct AgentPipeline {
    llm: Arc<dyn Llm>,
    model: String,
    config: PipelineConfig,
    gateway: Arc<dyn PersistenceGateway>,
    files: Arc<dyn ProjectFileStore>,
}

impl AgentPipeline {
    pub fn new(
        llm: Arc<dyn Llm>,
        model: impl Into<String>,
        gateway: Arc<dyn PersistenceGateway>,
        files: Arc<dyn ProjectFileStore>,
    ) -> Self {
        Self { llm, model: model.into(), config: PipelineConfig::default(), gateway, files }
    }

    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn run(
        &self,
        project_id: &str,
        requirements: &str,
        project_context: &str,
    ) -> Result<PipelineOutcome> {
        let mut state = PipelineState::new(requirements, project_context);
        tracing::info!(project.id = %project_id, model = %self.model, "pipeline started");

        for stage in Stage::ORDER {
            let (output, attempt_number) = self.run_stage(stage, &state).await?;
            let summary = output.summary();

            match output {
                StageOutput::Plan(plan) => state.plan = Some(plan),
                StageOutput::Files(files) => state.generated_files = files,
                StageOutput::Validation(reports) => {
                    state.validation_errors =
                        reports.into_iter().filter(|r| !r.issues.is_empty()).collect();
                }
                StageOutput::Actions(actions) => state.execution_plan = actions,
            }

            let record = StageRecord { stage: stage.name().to_string(), attempt_number, summary };
            if let Err(source) = self.gateway.record_pipeline_step(project_id, record).await {
                return Err(PipelineError::Persistence { stage, source, state: Box::new(state) });
            }

            if stage == Stage::CodeValidator && !state.validation_errors.is_empty() {
                tracing::info!(
                    project.id = %project_id,
                    files_with_issues = state.validation_errors.len(),
                    "pipeline halted before execution"
                );
                let issues = state.validation_errors.clone();
                return Ok(PipelineOutcome::Halted { state, issues });
            }
        }

        self.apply_actions(project_id, state).await
    }

    /// Call the model until a reply passes the stage's checks or attempts run out.
    async fn run_stage(&self, stage: Stage, state: &PipelineState) -> Result<(StageOutput, u32)> {
        let max_attempts = self.config.max_attempts.max(1);
        let backoff = RetryConfig::linear(max_attempts - 1, self.config.backoff_base());
        let mut options = GenerateOptions::new().with_system_prompt(system_prompt(stage));
        options.temperature = self.config.temperature;

        let mut attempt = StageAttempt::first(stage);
        loop {
            let span = pipeline_stage_span(stage.name(), attempt.attempt_number);
            let prompt = build_prompt(state, &attempt);
            let result = async {
                let reply = self.llm.generate(&prompt, &self.model, &options).await?;
                parse_stage_output(stage, &reply.content)
            }
            .instrument(span.clone())
            .await;

            let error = match result {
                Ok(output) => {
                    span.in_scope(|| tracing::debug!(summary = %output.summary(), "stage accepted"));
                    return Ok((output, attempt.attempt_number));
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(PipelineError::StageFailed {
                    stage,
                    source: error,
                    state: Box::new(state.clone()),
                });
            }
            if attempt.attempt_number >= max_attempts {
                span.in_scope(|| tracing::error!(error = %error, "stage attempts exhausted"));
                return Err(PipelineError::ExhaustedRetries {
                    stage,
                    attempts: attempt.attempt_number,
                    last_error: error,
                    state: Box::new(state.clone()),
                });
            }

            let delay = backoff.delay_after(attempt.attempt_number);
            span.in_scope(|| {
                tracing::warn!(
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "stage attempt rejected; retrying"
                );
            });
            tokio::time::sleep(delay).await;
            attempt = attempt.retry_after(&error);
        }
    }

    /// Apply actions one at a time in list order. Earlier actions stay applied when a later
    /// one fails.
    async fn apply_actions(&self, project_id: &str, state: PipelineState) -> Result<PipelineOutcome> {
        for (index, action) in state.execution_plan.iter().enumerate() {
            if let Err(source) = self.apply(project_id, action).await {
                tracing::error!(index, path = %action.file_path, error = %source, "action failed");
                return Err(PipelineError::ActionFailed {
                    index,
                    action: action.clone(),
                    source,
                    state: Box::new(state.clone()),
                });
            }
        }
        let applied = state.execution_plan.len();
        tracing::info!(project.id = %project_id, applied, "pipeline completed");
        Ok(PipelineOutcome::Completed { state, applied })
    }

    async fn apply(&self, project_id: &str, action: &ExecutionAction) -> forge_core::Result<()> {
        let content = || {
            action.content.as_deref().ok_or_else(|| {
                ForgeError::Validation(format!("{} has no content", action.file_path))
            })
        };
        match action.kind {
            ActionKind::Create => {
                self.files
                    .create_file_version(project_id, &action.file_path, content()?, &action.commit_msg)
                    .await
            }
            ActionKind::Update => {
                self.files
                    .update_file(project_id, &action.file_path, content()?, &action.commit_msg)
                    .await
            }
            ActionKind::Revert => {
                self.files.revert_file(project_id, &action.file_path, &action.commit_msg).await
            }
        }
    }
}
