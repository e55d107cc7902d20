//! Backlot — generation job orchestration bounded context.
//!
//! Responsible for driving long-running media-generation jobs against an
//! external backend: credential gating, per-asset lifecycle state, polling
//! with progress narration, failure classification, and sequential batch
//! coordination.

pub mod application;
pub mod domain;
