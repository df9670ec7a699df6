use crate::framing::Chunk;
use forge_core::{ChatMessage, ForgeError, GenerateOptions, Result, Role, Usage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
}

impl GenerateContentResponse {
    fn text(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(ForgeError::Provider(format!("Gemini API error: {}", error.message)));
        }
        Ok(self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default())
    }
}

/// Gemini names the assistant role "model"; system turns move into `systemInstruction`.
pub(super) fn build_body(
    prompt: &str,
    history: &[ChatMessage],
    options: &GenerateOptions,
) -> Result<Value> {
    let mut system_parts: Vec<TextPart> = options
        .system_prompt
        .iter()
        .map(|text| TextPart { text: text.clone() })
        .collect();
    let mut contents = Vec::with_capacity(history.len() + 1);
    for message in history {
        let role = match message.role {
            Role::System => {
                system_parts.push(TextPart { text: message.content.clone() });
                continue;
            }
            Role::User => "user",
            Role::Assistant => "model",
        };
        contents.push(Content { role, parts: vec![TextPart { text: message.content.clone() }] });
    }
    contents.push(Content { role: "user", parts: vec![TextPart { text: prompt.to_string() }] });

    let generation_config = if options.temperature.is_some() || options.max_tokens.is_some() {
        Some(GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
        })
    } else {
        None
    };

    let request = GenerateContentRequest {
        contents,
        system_instruction: if system_parts.is_empty() {
            None
        } else {
            Some(SystemInstruction { parts: system_parts })
        },
        generation_config,
    };
    let mut body = serde_json::to_value(request)?;
    options.merge_extra_into(&mut body);
    Ok(body)
}

pub(super) fn into_content(response: GenerateContentResponse) -> Result<(String, Usage)> {
    let usage = response
        .usage_metadata
        .as_ref()
        .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();
    Ok((response.text()?, usage))
}

/// Every SSE payload is a complete response object; the stream ends at EOF.
pub(super) fn stream_chunk(payload: &str) -> Result<Chunk> {
    let chunk: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|e| ForgeError::Provider(format!("Gemini stream chunk malformed: {e}")))?;
    let text = chunk.text()?;
    Ok(if text.is_empty() { Chunk::Skip } else { Chunk::Text(text) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_are_mapped() {
        let history = vec![ChatMessage::system("rules"), ChatMessage::user("q"), ChatMessage::assistant("a")];
        let options = GenerateOptions::new().with_temperature(0.3);
        let body = build_body("next", &history, &options).unwrap();

        let roles: Vec<&str> =
            body["contents"].as_array().unwrap().iter().map(|c| c["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "rules");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_stream_chunk_joins_parts() {
        let payload = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"He"},{"text":"llo"}]}}]}"#;
        assert_eq!(stream_chunk(payload).unwrap(), Chunk::Text("Hello".into()));
        assert_eq!(stream_chunk(r#"{"candidates":[]}"#).unwrap(), Chunk::Skip);
    }
}
