use crate::stage::Stage;
use crate::state::{PipelineState, StageAttempt};
use serde::Serialize;

/// Role description sent as the system prompt for each stage.
pub fn system_prompt(stage: Stage) -> &'static str {
    match stage {
        Stage::ProjectArchitect => {
            "You are a software architect. You design project layouts and reply with JSON only."
        }
        Stage::FileGenerator => {
            "You are a senior engineer. You write complete source files and reply with JSON only."
        }
        Stage::CodeValidator => {
            "You are a meticulous code reviewer. You report concrete problems and reply with JSON only."
        }
        Stage::ExecutionAgent => {
            "You turn reviewed files into version-control actions and reply with JSON only."
        }
    }
}

pub fn build_prompt(state: &PipelineState, attempt: &StageAttempt) -> String {
    let mut prompt = match attempt.stage {
        Stage::ProjectArchitect => format!(
            "Design the project structure for these requirements.\n\n\
             Requirements:\n{}\n\nExisting project context:\n{}\n\n\
             Reply with {{\"plan\":{{\"structure\":[{{\"path\":\"...\",\"type\":\"file|directory\",\
             \"description\":\"...\"}}],\"dependencies\":[],\"challenges\":[]}}}}",
            state.requirements,
            context_or_none(&state.project_context),
        ),
        Stage::FileGenerator => format!(
            "Write every file of this plan.\n\nRequirements:\n{}\n\nPlan:\n{}\n\n\
             Reply with {{\"files\":[{{\"path\":\"...\",\"content\":\"...\",\"dependencies\":[],\
             \"validationChecks\":[]}}]}}",
            state.requirements,
            to_json(&state.plan),
        ),
        Stage::CodeValidator => format!(
            "Review these files against the requirements.\n\nRequirements:\n{}\n\nFiles:\n{}\n\n\
             Reply with {{\"validation\":[{{\"filePath\":\"...\",\"issues\":[{{\"type\":\"...\",\
             \"message\":\"...\",\"suggestion\":\"...\"}}]}}]}}. Use an empty issues list for \
             files without problems.",
            state.requirements,
            to_json(&state.generated_files),
        ),
        Stage::ExecutionAgent => format!(
            "Produce the actions that apply these files to the project.\n\nProject context:\n{}\n\n\
             Files:\n{}\n\n\
             Reply with {{\"actions\":[{{\"type\":\"create|update|revert\",\"filePath\":\"...\",\
             \"content\":\"...\",\"commitMsg\":\"...\"}}]}}",
            context_or_none(&state.project_context),
            to_json(&state.generated_files),
        ),
    };

    if !attempt.corrections.is_empty() {
        prompt.push_str("\n\nYour previous replies were rejected:");
        for (index, note) in attempt.corrections.iter().enumerate() {
            prompt.push_str(&format!("\n{}. {note}", index + 1));
        }
        prompt.push_str("\nReply with the JSON object only.");
    }
    prompt
}

fn context_or_none(context: &str) -> &str {
    if context.trim().is_empty() { "(none)" } else { context }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
