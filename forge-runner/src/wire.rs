//! Legacy marker encoding for transports that still expect a plain string stream.

use forge_core::StreamEvent;
use serde_json::json;

/// Encode one event as a legacy marker string. `Done` has no marker and yields `None`.
pub fn encode_legacy(event: &StreamEvent) -> Option<String> {
    let encoded = match event {
        StreamEvent::Token(text) => text.clone(),
        StreamEvent::ThinkingToken(text) => format!("__THINKING__{}", json!({ "content": text })),
        StreamEvent::StepComplete(index) => format!("__STEP_COMPLETE__{}", json!({ "step": index })),
        StreamEvent::ComplexityDetected(level) => {
            format!("__COMPLEXITY__{}", json!({ "level": level.as_str() }))
        }
        StreamEvent::ChatIdAssigned(id) => format!("__CHATID__{id}__"),
        StreamEvent::Error(message) => format!("__ERROR__{}", json!({ "message": message })),
        StreamEvent::Done => return None,
    };
    Some(encoded)
}
