//! Wire types for the chat-completions dialect.

use crate::framing::Chunk;
use forge_core::{ChatMessage, ForgeError, GenerateOptions, Result, Usage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub(super) struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    #[serde(default)]
    pub error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Choice {
    #[serde(default)]
    pub message: Option<MessageBody>,
    #[serde(default)]
    pub delta: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MessageBody {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireError {
    #[serde(default)]
    pub message: String,
}

/// Build the JSON body: system prompt first, then history, then the new user turn.
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

    let request = ChatCompletionRequest {
        model: model.to_string(),
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        stream,
    };
    let mut body = serde_json::to_value(request)?;
    options.merge_extra_into(&mut body);
    Ok(body)
}

pub(super) fn into_content(vendor: &str, response: ChatCompletionResponse) -> Result<(String, Usage)> {
    if let Some(error) = response.error {
        return Err(ForgeError::Provider(format!("{vendor} API error: {}", error.message)));
    }
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default();
    let usage = response
        .usage
        .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();
    Ok((content, usage))
}

/// Decode one SSE payload.
pub(super) fn stream_chunk(vendor: &str, payload: &str) -> Result<Chunk> {
    if payload.trim() == "[DONE]" {
        return Ok(Chunk::Done);
    }
    let chunk: ChatCompletionResponse = serde_json::from_str(payload)
        .map_err(|e| ForgeError::Provider(format!("{vendor} stream chunk malformed: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(ForgeError::Provider(format!("{vendor} stream error: {}", error.message)));
    }
    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .unwrap_or_default();
    Ok(if text.is_empty() { Chunk::Skip } else { Chunk::Text(text) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_body_orders_messages_and_merges_extra() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let options = GenerateOptions::new()
            .with_system_prompt("be brief")
            .with_temperature(0.2)
            .with_extra("response_format", json!({"type": "json_object"}));

        let body = build_body("next", &history, "gpt-4o", &options, true).unwrap();
        let roles: Vec<&str> =
            body["messages"].as_array().unwrap().iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(body["messages"][3]["content"], "next");
        assert_eq!(body["stream"], true);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_stream_chunk_variants() {
        let text = r#"{"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(stream_chunk("openai", text).unwrap(), Chunk::Text("Hel".into()));
        let role_only = r#"{"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(stream_chunk("openai", role_only).unwrap(), Chunk::Skip);
        assert_eq!(stream_chunk("openai", "[DONE]").unwrap(), Chunk::Done);
        assert!(stream_chunk("openai", "{not json").is_err());
    }
}
