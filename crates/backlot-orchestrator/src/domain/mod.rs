//! Domain model for the orchestrator context.

pub mod narration;
pub mod outcome;
pub mod phase;
pub mod slot;
