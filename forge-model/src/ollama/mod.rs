//! Local Ollama server adapter. Streams NDJSON rather than SSE and needs no API key.

mod client;
mod convert;

pub use client::{OLLAMA_DEFAULT_HOST, OllamaClient, OllamaConfig};
