//! Core types, configuration, and error handling for tidemark.
//!
//! This crate provides the shared foundation used by all other tidemark crates:
//! - [`TidemarkError`]: unified error type using `thiserror`
//! - [`TidemarkConfig`]: optional defaults loaded from `.tidemark.toml`
//! - [`TriggerContext`]: the immutable snapshot of the triggering CI event
//! - Shared types: [`EventKind`], [`WorkflowRun`], [`RevisionPair`], [`Revision`]

mod config;
mod context;
mod error;
mod types;

pub use config::{split_lines, TidemarkConfig};
pub use context::EventEnv;
pub use error::TidemarkError;
pub use types::{EventKind, Revision, RevisionPair, TriggerContext, WorkflowRun};

/// A convenience `Result` type for tidemark operations.
pub type Result<T> = std::result::Result<T, TidemarkError>;
