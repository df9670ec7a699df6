//! Google Gemini `generateContent` adapter.

mod client;
mod convert;

pub use client::{GEMINI_API_BASE, GeminiClient, GeminiConfig};
