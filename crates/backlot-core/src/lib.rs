//! Backlot Core — shared domain abstractions.
//!
//! This crate defines the capability traits and model types that the
//! orchestrator, catalog, and API host all depend on. It contains no
//! infrastructure code.

pub mod asset;
pub mod backend;
pub mod cancel;
pub mod credential;
pub mod error;
pub mod rng;
pub mod time;
