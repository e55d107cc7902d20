//! Axum HTTP server for the Backlot generation orchestrator.
//!
//! Exposes the slot store, generation triggers, and batch status under
//! `/api/v1`. The binary wires the orchestrator to the in-process fixture
//! backend so the server runs end-to-end without a provider credential.

pub mod error;
pub mod fixture;
pub mod routes;
pub mod state;
