//! Application services for the orchestrator context.

pub mod batch;
pub mod credential_gate;
pub mod job_runner;
pub mod store;
