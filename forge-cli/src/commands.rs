use crate::cli::{Commands, ListFormat};
use crate::config::ForgeConfig;
use anyhow::{Context, Result, anyhow};
use forge_core::StreamEvent;
use forge_model::{ModelRegistry, ProviderFamily};
use forge_pipeline::{AgentPipeline, PipelineOutcome};
use forge_reasoning::StepKind;
use forge_runner::{ChatRequest, ChatService, encode_legacy};
use forge_session::InMemoryGateway;
use futures::StreamExt;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Executes parsed commands against one registry and an in-memory gateway.
pub struct App {
    config: ForgeConfig,
    registry: Arc<ModelRegistry>,
    gateway: InMemoryGateway,
}

impl App {
    pub fn new(config: ForgeConfig, registry: ModelRegistry) -> Self {
        Self { config, registry: Arc::new(registry), gateway: InMemoryGateway::new() }
    }

    pub fn gateway(&self) -> &InMemoryGateway {
        &self.gateway
    }

    pub async fn run<W: Write>(&self, command: Commands, out: &mut W) -> Result<()> {
        match command {
            Commands::Chat { message, model, reasoning, stream, legacy_markers, thread, user_id } => {
                let mut request = ChatRequest::new(user_id, message);
                request.model = model;
                request.reasoning = reasoning;
                request.thread_id = thread;
                if stream || legacy_markers {
                    self.chat_stream(request, legacy_markers, out).await
                } else {
                    self.chat(request, out).await
                }
            }
            Commands::Pipeline { requirements, context_file, project } => {
                self.pipeline(&requirements, context_file, project, out).await
            }
            Commands::Models { format } => self.models(format, out),
        }
    }

    fn chat_service(&self) -> ChatService {
        // Extracted memories would not outlive the process.
        ChatService::new(Arc::clone(&self.registry), Arc::new(self.gateway.clone()))
            .with_reasoning_config(self.config.reasoning.clone())
            .with_memory_extraction(false)
    }

    async fn chat<W: Write>(&self, request: ChatRequest, out: &mut W) -> Result<()> {
        let reply = self.chat_service().send(request).await?;
        if let Some(reasoning) = &reply.reasoning {
            writeln!(out, "[reasoning: {} complexity]", reasoning.complexity)?;
            writeln!(out, "{}\n", reasoning.full_reasoning_text)?;
        }
        writeln!(out, "{}", reply.content)?;
        writeln!(
            out,
            "\n[thread {} | model {} | {} tokens]",
            reply.thread_id, reply.model, reply.usage.total_tokens
        )?;
        Ok(())
    }

    async fn chat_stream<W: Write>(
        &self,
        request: ChatRequest,
        legacy_markers: bool,
        out: &mut W,
    ) -> Result<()> {
        let kind = request.reasoning.unwrap_or_default();
        let mut events = self.chat_service().stream(request);

        while let Some(event) = events.next().await {
            if legacy_markers {
                if let Some(frame) = encode_legacy(&event) {
                    write!(out, "{frame}")?;
                }
            } else {
                write_event(out, &event, kind)?;
            }
            out.flush()?;
            if let StreamEvent::Error(message) = event {
                return Err(anyhow!(message));
            }
        }
        Ok(())
    }

    async fn pipeline<W: Write>(
        &self,
        requirements: &str,
        context_file: Option<PathBuf>,
        project: Option<String>,
        out: &mut W,
    ) -> Result<()> {
        let context = match context_file {
            Some(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read context file {}", path.display()))?,
            None => String::new(),
        };
        let project_id = project.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let resolved = self.registry.resolve_or_default(self.config.pipeline.model.as_deref())?;

        let gateway = Arc::new(self.gateway.clone());
        let pipeline = AgentPipeline::new(
            resolved.adapter,
            resolved.descriptor.id,
            gateway.clone(),
            gateway,
        )
        .with_config(self.config.pipeline.clone());

        let outcome = pipeline
            .run(&project_id, requirements, &context)
            .await
            .with_context(|| format!("pipeline failed for project {project_id}"))?;

        writeln!(out, "project {project_id}")?;
        for record in self.gateway.pipeline_steps(&project_id) {
            writeln!(out, "  {} (attempt {}): {}", record.stage, record.attempt_number, record.summary)?;
        }
        match outcome {
            PipelineOutcome::Completed { state, applied } => {
                writeln!(out, "completed: {applied} actions applied")?;
                for action in &state.execution_plan {
                    writeln!(out, "  {} {}", action.kind.as_str(), action.file_path)?;
                }
            }
            PipelineOutcome::Halted { issues, .. } => {
                writeln!(out, "halted: code validation reported issues")?;
                for report in &issues {
                    for issue in &report.issues {
                        writeln!(out, "  {} [{}] {}", report.file_path, issue.kind, issue.message)?;
                        if let Some(suggestion) = &issue.suggestion {
                            writeln!(out, "    suggestion: {suggestion}")?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn models<W: Write>(&self, format: ListFormat, out: &mut W) -> Result<()> {
        let rows: Vec<ModelRow> = self
            .registry
            .descriptors()
            .map(|d| ModelRow {
                id: d.id.clone(),
                family: d.family,
                streaming: d.supports_streaming,
                available: self.registry.is_available(d.family),
                default: d.id == self.registry.default_model(),
            })
            .collect();

        match format {
            ListFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?,
            ListFormat::Table => {
                writeln!(out, "{:<32} {:<10} {:<9} {}", "MODEL", "FAMILY", "STREAMING", "STATUS")?;
                for row in &rows {
                    let status = match (row.available, row.default) {
                        (true, true) => "available (default)".to_string(),
                        (true, false) => "available".to_string(),
                        (false, _) => self
                            .registry
                            .unavailable_reason(row.family)
                            .unwrap_or("unavailable")
                            .to_string(),
                    };
                    let streaming = if row.streaming { "yes" } else { "no" };
                    writeln!(out, "{:<32} {:<10} {:<9} {status}", row.id, row.family.as_str(), streaming)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ModelRow {
    id: String,
    family: ProviderFamily,
    streaming: bool,
    available: bool,
    default: bool,
}

fn write_event<W: Write>(out: &mut W, event: &StreamEvent, kind: StepKind) -> std::io::Result<()> {
    match event {
        StreamEvent::ComplexityDetected(level) => writeln!(out, "[{kind} complexity: {level}]"),
        StreamEvent::ThinkingToken(text) => writeln!(out, "  - {text}"),
        StreamEvent::StepComplete(index) => writeln!(out, "  [step {} complete]", index + 1),
        StreamEvent::ChatIdAssigned(id) => writeln!(out, "[thread {id}]"),
        StreamEvent::Token(text) => write!(out, "{text}"),
        StreamEvent::Error(message) => writeln!(out, "\n[error] {message}"),
        StreamEvent::Done => writeln!(out),
    }
}
