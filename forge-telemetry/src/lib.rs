//! # forge-telemetry
//!
//! Structured logging and distributed tracing for Forge.
//!
//! ## Usage
//!
//! ```rust
//! use forge_telemetry::{init_telemetry, info};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     init_telemetry("forge")?;
//!     info!(stage = "project-architect", "pipeline started");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Instrument, Span, debug, error, info, instrument, trace, warn};

pub use init::{init_json_telemetry, init_telemetry, init_with_otlp, shutdown_telemetry};
pub use spans::*;
