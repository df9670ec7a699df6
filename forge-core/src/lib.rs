//! # forge-core
//!
//! Core traits and types shared by every Forge crate.
//!
//! ## Overview
//!
//! - [`Llm`] - The uniform provider-adapter contract (batch and streaming, with or without history)
//! - [`ChatMessage`] / [`Role`] - Conversation turns, in conversation order
//! - [`StreamEvent`] - Typed events emitted to callers of a streaming chat
//! - [`ComplexityLevel`] - Coarse difficulty classification used by the reasoning loop
//! - [`ForgeError`] / [`Result`] - Unified error handling
//!
//! ## Provider contract
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Llm: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn generate_with_history(&self, prompt: &str, history: &[ChatMessage], model: &str, options: &GenerateOptions) -> Result<Response>;
//!     async fn generate_stream_with_history(&self, prompt: &str, history: &[ChatMessage], model: &str, options: &GenerateOptions) -> Result<TokenStream>;
//! }
//! ```

pub mod complexity;
pub mod error;
pub mod event;
pub mod model;
pub mod types;

pub use complexity::ComplexityLevel;
pub use error::{ForgeError, Result};
pub use event::{EventStream, StreamEvent, StreamPhase};
pub use model::{GenerateOptions, Llm, Response, TokenStream, Usage, collect_stream};
pub use types::{ChatMessage, Role};
