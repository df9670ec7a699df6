//! # forge-model
//!
//! Provider adapters and the model registry.
//!
//! ## Overview
//!
//! Every vendor is wrapped behind [`forge_core::Llm`]:
//!
//! - [`OpenAiCompatibleClient`] - OpenAI, Groq, DeepSeek and xAI
//! - [`AnthropicClient`] - Anthropic Messages API
//! - [`GeminiClient`] - Google Gemini
//! - [`OllamaClient`] - local Ollama server
//! - [`MockLlm`] - scripted adapter for tests
//!
//! [`ModelRegistry`] maps model ids to the adapter of their family. Families that fail to
//! initialise are reported as unavailable without affecting the others.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forge_model::{ModelRegistry, ProvidersConfig};
//!
//! let registry = ModelRegistry::from_config(&ProvidersConfig::from_env());
//! match registry.resolve("gpt-4o-mini") {
//!     Ok(model) => println!("served by {}", model.adapter.name()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod anthropic;
mod framing;
pub mod gemini;
mod http;
pub mod keys;
pub mod mock;
pub mod ollama;
pub mod openai_compatible;
pub mod registry;
pub mod retry;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use gemini::{GeminiClient, GeminiConfig};
pub use keys::{KeyRotation, select_by_hash};
pub use mock::{MockLlm, MockReply, RecordedCall};
pub use ollama::{OllamaClient, OllamaConfig};
pub use openai_compatible::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
pub use registry::{
    ModelDescriptor, ModelRegistry, ProviderFamily, ProviderSettings, ProvidersConfig,
    ResolvedModel,
};
pub use retry::{Backoff, RetryConfig, execute_with_retry, is_retryable_provider_error};
