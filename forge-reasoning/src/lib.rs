//! # forge-reasoning
//!
//! Iterative chain-of-thought / chain-of-drafts refinement run before a final answer.
//!
//! The first iteration declares a [`ComplexityLevel`](forge_core::ComplexityLevel) that fixes
//! the iteration bound for the rest of the run. Later iterations revise earlier batches until
//! the model stops asking for improvement, the bound is reached, or the revision ceiling
//! (five iterations by default) is hit.
//!
//! [`ReasoningLoop`] is the pure state machine; [`ReasoningEngine`] drives it against a model.

pub mod config;
pub mod engine;
pub mod parse;
pub mod prompt;
pub mod state;
pub mod step;

pub use config::ReasoningConfig;
pub use engine::{ReasoningEngine, ReasoningEvent, ReasoningStream};
pub use parse::{NO_VIABLE_OUTPUT, ParsedBatch, parse_batch};
pub use state::{ReasoningLoop, Transition};
pub use step::{ReasoningResult, ReasoningStep, StepKind};
