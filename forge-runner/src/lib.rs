//! # forge-runner
//!
//! Request routing for chat turns.
//!
//! [`ChatService`] resolves the model, optionally runs the reasoning engine, persists the turn
//! through the gateway and returns either a complete [`ChatReply`] or a pull-driven
//! [`EventStream`](forge_core::EventStream) built by [`StreamMultiplexer`].

pub mod memory;
pub mod multiplexer;
pub mod service;
pub mod wire;

pub use memory::MemoryExtractor;
pub use multiplexer::{AnswerFactory, ChatIdFuture, FinishHook, StreamMultiplexer};
pub use service::{ChatReply, ChatRequest, ChatService, final_prompt};
pub use wire::encode_legacy;
