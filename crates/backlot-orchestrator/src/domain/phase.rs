//! Job lifecycle phases.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of an asset slot.
///
/// Exactly one phase per asset at any time. `Polling` is re-entered on each
/// tick without a phase change; only the narration rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// No run attempted since creation or the last reset.
    Idle,
    /// Credential availability is being established.
    AwaitingCredential,
    /// The request has been handed to the backend.
    Submitted,
    /// A long-running operation is being polled.
    Polling,
    /// Terminal: an artifact is stored on the slot.
    Succeeded,
    /// Terminal: a classified error is stored on the slot.
    Failed,
}

impl JobPhase {
    /// Returns whether the phase is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns whether a job for this slot is currently in flight.
    /// Duplicate submissions are rejected while this holds.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Submitted | Self::Polling)
    }

    /// Returns whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            // Reset is legal from any phase.
            (_, Self::Idle) => true,
            // A new run may start from idle or from a terminal phase.
            (Self::Idle | Self::Succeeded | Self::Failed, Self::AwaitingCredential) => true,
            (Self::AwaitingCredential, Self::Submitted) => true,
            (Self::Submitted, Self::Polling | Self::Succeeded) => true,
            // Polling re-enters itself on every tick.
            (Self::Polling, Self::Polling | Self::Succeeded) => true,
            // A failure can strike at any point after a run starts.
            (Self::AwaitingCredential | Self::Submitted | Self::Polling, Self::Failed) => true,
            _ => false,
        }
    }
}
