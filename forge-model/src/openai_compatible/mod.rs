//! Adapter for vendors speaking the OpenAI chat-completions dialect.
//!
//! One client serves OpenAI, Groq, DeepSeek and xAI; only the base URL and family name differ.

mod client;
mod config;
mod convert;

pub use client::OpenAiCompatibleClient;
pub use config::{
    DEEPSEEK_API_BASE, GROQ_API_BASE, OPENAI_API_BASE, OpenAiCompatibleConfig, XAI_API_BASE,
};
