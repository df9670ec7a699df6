//! # forge-cli
//!
//! The `forge` binary.
//!
//! ```bash
//! forge chat "Why is the sky blue?" --reasoning thought --stream
//! forge chat "hi" --model claude-3-5-sonnet-latest --legacy-markers
//! forge pipeline "A CLI todo app in Rust" --context-file notes.md
//! forge models --format json
//! ```
//!
//! Provider credentials come from `forge.toml` (`--config` or `FORGE_CONFIG`) and fall back
//! to the usual environment variables (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...).

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands, ListFormat};
pub use commands::App;
pub use config::{ForgeConfig, LogFormat, TelemetryConfig};
