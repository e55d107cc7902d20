//! Shared test fakes and utilities for the Backlot asset orchestrator.

mod backend;
mod clock;
mod credential;
mod delay;
mod rng;

pub use backend::{BackendCall, FailingBackend, ScriptedBackend};
pub use clock::{FixedClock, SteppingClock};
pub use credential::{FailingCredentialHost, RecordingCredentialHost};
pub use delay::InstantDelay;
pub use rng::{SequenceRandom, ZeroRandom};
