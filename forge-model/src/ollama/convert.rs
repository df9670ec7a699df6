use crate::framing::Chunk;
use forge_core::{ChatMessage, ForgeError, GenerateOptions, Result, Usage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

pub(super) fn build_body(
    prompt: &str,
    history: &[ChatMessage],
    model: &str,
    options: &GenerateOptions,
    stream: bool,
) -> Result<Value> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = &options.system_prompt {
        messages.push(WireMessage { role: "system", content: system.clone() });
    }
    messages.extend(
        history.iter().map(|m| WireMessage { role: m.role.as_str(), content: m.content.clone() }),
    );
    messages.push(WireMessage { role: "user", content: prompt.to_string() });

    let model_options = if options.temperature.is_some() || options.max_tokens.is_some() {
        Some(ModelOptions { temperature: options.temperature, num_predict: options.max_tokens })
    } else {
        None
    };
    let request = ChatRequest { model: model.to_string(), messages, stream, options: model_options };
    let mut body = serde_json::to_value(request)?;
    options.merge_extra_into(&mut body);
    Ok(body)
}

pub(super) fn into_content(response: ChatResponse) -> Result<(String, Usage)> {
    if let Some(error) = response.error {
        return Err(ForgeError::Provider(format!("Ollama error: {error}")));
    }
    let usage = Usage::new(response.prompt_eval_count, response.eval_count);
    Ok((response.message.map(|m| m.content).unwrap_or_default(), usage))
}

pub(super) fn stream_chunk(payload: &str) -> Result<Chunk> {
    let chunk: ChatResponse = serde_json::from_str(payload)
        .map_err(|e| ForgeError::Provider(format!("Ollama stream line malformed: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(ForgeError::Provider(format!("Ollama stream error: {error}")));
    }
    let text = chunk.message.map(|m| m.content).unwrap_or_default();
    Ok(if chunk.done { Chunk::Final(text) } else { Chunk::Text(text) })
}
