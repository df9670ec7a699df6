//! Reply parsing: fence stripping, JSON decoding, schema and structural checks.
//!
//! Unparseable text is a [`ForgeError::Format`]; JSON that does not match the stage schema or
//! fails its structural check is a [`ForgeError::Validation`]. Both consume a retry attempt.

use crate::payload::{
    ActionKind, ArchitectReply, ExecutionAction, ExecutorReply, FileValidation, GeneratedFile,
    GeneratorReply, ProjectPlan, StageOutput, ValidatorReply,
};
use crate::stage::Stage;
use forge_core::{ForgeError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Remove a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        // Single-line fence: ```json {...}```
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_stage_output(stage: Stage, raw: &str) -> Result<StageOutput> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| ForgeError::Format(format!("{stage} reply is not valid JSON: {e}")))?;

    match stage {
        Stage::ProjectArchitect => {
            let reply: ArchitectReply = decode(stage, value)?;
            validate_plan(&reply.plan)?;
            Ok(StageOutput::Plan(reply.plan))
        }
        Stage::FileGenerator => {
            let reply: GeneratorReply = decode(stage, value)?;
            validate_files(&reply.files)?;
            Ok(StageOutput::Files(reply.files))
        }
        Stage::CodeValidator => {
            let reply: ValidatorReply = decode(stage, value)?;
            validate_reports(&reply.validation)?;
            Ok(StageOutput::Validation(reply.validation))
        }
        Stage::ExecutionAgent => {
            let reply: ExecutorReply = decode(stage, value)?;
            validate_actions(&reply.actions)?;
            Ok(StageOutput::Actions(reply.actions))
        }
    }
}

fn decode<T: DeserializeOwned>(stage: Stage, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ForgeError::Validation(format!("{stage} reply does not match schema: {e}")))
}

fn invalid(message: impl Into<String>) -> ForgeError {
    ForgeError::Validation(message.into())
}

fn validate_plan(plan: &ProjectPlan) -> Result<()> {
    if plan.structure.is_empty() {
        return Err(invalid("plan.structure must not be empty"));
    }
    if let Some(i) = plan.structure.iter().position(|e| e.path.trim().is_empty()) {
        return Err(invalid(format!("plan.structure[{i}] has no path")));
    }
    Ok(())
}

fn validate_files(files: &[GeneratedFile]) -> Result<()> {
    if files.is_empty() {
        return Err(invalid("files must not be empty"));
    }
    if let Some(i) = files.iter().position(|f| f.path.trim().is_empty()) {
        return Err(invalid(format!("files[{i}] has no path")));
    }
    Ok(())
}

fn validate_reports(reports: &[FileValidation]) -> Result<()> {
    if let Some(i) = reports.iter().position(|r| r.file_path.trim().is_empty()) {
        return Err(invalid(format!("validation[{i}] has no filePath")));
    }
    Ok(())
}

fn validate_actions(actions: &[ExecutionAction]) -> Result<()> {
    for (i, action) in actions.iter().enumerate() {
        if action.file_path.trim().is_empty() {
            return Err(invalid(format!("actions[{i}] has no filePath")));
        }
        let needs_content = matches!(action.kind, ActionKind::Create | ActionKind::Update);
        if needs_content && action.content.is_none() {
            return Err(invalid(format!("actions[{i}] ({:?}) has no content", action.kind)));
        }
    }
    Ok(())
}
