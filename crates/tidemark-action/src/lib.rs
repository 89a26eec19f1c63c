//! The CI-facing side of tidemark: workflow commands, input layering, and the
//! pipeline that turns a trigger into the `files` output.

pub mod commands;
pub mod inputs;
pub mod pipeline;

pub use commands::Workflow;
pub use inputs::{ActionInputs, InputOverrides};
pub use pipeline::{AtPhase, Phase, PhaseError, Pipeline};
