//! Anthropic Messages API adapter.

mod client;
mod convert;

pub use client::{ANTHROPIC_API_BASE, ANTHROPIC_VERSION, AnthropicClient, AnthropicConfig};
