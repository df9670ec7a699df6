//! Typed events emitted to callers of a streaming chat.

use crate::complexity::ComplexityLevel;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Final-answer fragment.
    Token(String),
    /// Reasoning fragment, emitted before the chat id.
    ThinkingToken(String),
    /// A reasoning batch finished.
    StepComplete(usize),
    /// Complexity declared on the first reasoning iteration.
    ComplexityDetected(ComplexityLevel),
    /// Thread the answer is persisted under. Exactly once per stream.
    ChatIdAssigned(String),
    Error(String),
    Done,
}

/// Ordered phases of one stream. Events never move to an earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StreamPhase {
    Thinking,
    ChatId,
    Answer,
    Terminal,
}

impl StreamEvent {
    pub fn phase(&self) -> StreamPhase {
        match self {
            Self::ThinkingToken(_) | Self::StepComplete(_) | Self::ComplexityDetected(_) => {
                StreamPhase::Thinking
            }
            Self::ChatIdAssigned(_) => StreamPhase::ChatId,
            Self::Token(_) => StreamPhase::Answer,
            Self::Error(_) | Self::Done => StreamPhase::Terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() == StreamPhase::Terminal
    }

    /// Check a complete event sequence against the phase contract: thinking events, then at most
    /// one chat id, then answer tokens (only after a chat id), then exactly one terminal event.
    pub fn check_order(events: &[StreamEvent]) -> Result<(), String> {
        let mut phase = StreamPhase::Thinking;
        let mut chat_ids = 0usize;

        for (index, event) in events.iter().enumerate() {
            if phase == StreamPhase::Terminal {
                return Err(format!("event {index} ({event:?}) follows a terminal event"));
            }
            let next = event.phase();
            if next < phase {
                return Err(format!("event {index} ({event:?}) is out of phase order"));
            }
            match event {
                Self::ChatIdAssigned(_) => {
                    chat_ids += 1;
                    if chat_ids > 1 {
                        return Err(format!("event {index} is a second chat id"));
                    }
                }
                Self::Token(_) if chat_ids == 0 => {
                    return Err(format!("event {index} is a token before the chat id"));
                }
                _ => {}
            }
            phase = next;
        }

        if phase != StreamPhase::Terminal {
            return Err("stream did not end with Done or Error".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_order_with_thinking() {
        let events = vec![
            StreamEvent::ComplexityDetected(ComplexityLevel::Medium),
            StreamEvent::ThinkingToken("1. look".into()),
            StreamEvent::StepComplete(0),
            StreamEvent::ChatIdAssigned("t1".into()),
            StreamEvent::Token("Hello".into()),
            StreamEvent::Token(" world".into()),
            StreamEvent::Done,
        ];
        assert!(StreamEvent::check_order(&events).is_ok());
    }

    #[test]
    fn test_error_before_chat_id_is_valid() {
        let events = vec![StreamEvent::Error("Unknown model: x".into())];
        assert!(StreamEvent::check_order(&events).is_ok());
    }

    #[test]
    fn test_token_before_chat_id_rejected() {
        let events = vec![StreamEvent::Token("x".into()), StreamEvent::Done];
        assert!(StreamEvent::check_order(&events).is_err());
    }

    #[test]
    fn test_thinking_after_answer_rejected() {
        let events = vec![
            StreamEvent::ChatIdAssigned("t1".into()),
            StreamEvent::Token("a".into()),
            StreamEvent::ThinkingToken("late".into()),
            StreamEvent::Done,
        ];
        assert!(StreamEvent::check_order(&events).is_err());
    }

    #[test]
    fn test_missing_or_double_terminal_rejected() {
        let open = vec![StreamEvent::ChatIdAssigned("t1".into())];
        assert!(StreamEvent::check_order(&open).is_err());

        let double = vec![StreamEvent::ChatIdAssigned("t1".into()), StreamEvent::Done, StreamEvent::Done];
        assert!(StreamEvent::check_order(&double).is_err());
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(StreamEvent::ChatIdAssigned("abc".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "chat_id_assigned", "data": "abc" }));
        let json = serde_json::to_value(StreamEvent::Done).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "done" }));
    }
}
