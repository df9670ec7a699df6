use crate::framing::Chunk;
use forge_core::{ChatMessage, ForgeError, GenerateOptions, Result, Role, Usage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The Messages API requires `max_tokens`.
pub(super) const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

/// System content goes in the top-level `system` field: the options prompt first, then any
/// system turns found in history. Remaining turns keep their order.
pub(super) fn build_body(
    prompt: &str,
    history: &[ChatMessage],
    model: &str,
    options: &GenerateOptions,
    stream: bool,
) -> Result<Value> {
    let mut system_parts: Vec<&str> = options.system_prompt.as_deref().into_iter().collect();
    let mut messages = Vec::with_capacity(history.len() + 1);
    for message in history {
        match message.role {
            Role::System => system_parts.push(&message.content),
            role => messages.push(WireMessage { role: role.as_str(), content: message.content.clone() }),
        }
    }
    messages.push(WireMessage { role: "user", content: prompt.to_string() });

    let request = MessagesRequest {
        model: model.to_string(),
        max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        messages,
        system: if system_parts.is_empty() { None } else { Some(system_parts.join("\n\n")) },
        temperature: options.temperature,
        stream,
    };
    let mut body = serde_json::to_value(request)?;
    options.merge_extra_into(&mut body);
    Ok(body)
}

pub(super) fn into_content(response: MessagesResponse) -> (String, Usage) {
    let content = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<String>();
    let usage = response
        .usage
        .map(|u| Usage::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();
    (content, usage)
}

pub(super) fn stream_chunk(payload: &str) -> Result<Chunk> {
    let event: StreamEvent = serde_json::from_str(payload)
        .map_err(|e| ForgeError::Provider(format!("Anthropic stream event malformed: {e}")))?;
    match event.kind.as_str() {
        "content_block_delta" => {
            let text = event
                .delta
                .filter(|d| d.kind == "text_delta")
                .and_then(|d| d.text)
                .unwrap_or_default();
            Ok(if text.is_empty() { Chunk::Skip } else { Chunk::Text(text) })
        }
        "message_stop" => Ok(Chunk::Done),
        "error" => {
            let error = event.error.unwrap_or(StreamError {
                kind: "unknown_error".to_string(),
                message: String::new(),
            });
            let retryability =
                if error.kind == "overloaded_error" { "retryable" } else { "non-retryable" };
            Err(ForgeError::Provider(format!(
                "Anthropic stream error ({}, {retryability}): {}",
                error.kind, error.message
            )))
        }
        _ => Ok(Chunk::Skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_turns_are_hoisted() {
        let history = vec![ChatMessage::system("rules"), ChatMessage::user("q"), ChatMessage::assistant("a")];
        let options = GenerateOptions::new().with_system_prompt("persona");
        let body = build_body("next", &history, "claude-3-5-sonnet-latest", &options, false).unwrap();

        assert_eq!(body["system"], "persona\n\nrules");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        let roles: Vec<&str> =
            body["messages"].as_array().unwrap().iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[test]
    fn test_stream_events() {
        let delta = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        assert_eq!(stream_chunk(delta).unwrap(), Chunk::Text("Hi".into()));
        assert_eq!(stream_chunk(r#"{"type":"ping"}"#).unwrap(), Chunk::Skip);
        assert_eq!(stream_chunk(r#"{"type":"message_stop"}"#).unwrap(), Chunk::Done);

        let error = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = stream_chunk(error).unwrap_err();
        assert!(err.to_string().contains("overloaded_error"));
    }
}
