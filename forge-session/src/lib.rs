//! Persistence seen from the orchestration core.
//!
//! Storage is external: the core only calls [`PersistenceGateway`] and [`ProjectFileStore`].
//! [`InMemoryGateway`] backs the CLI and tests.

pub mod gateway;
pub mod inmemory;

pub use gateway::{FileVersion, PersistenceGateway, ProjectFileStore, StageRecord, Thread};
pub use inmemory::InMemoryGateway;
