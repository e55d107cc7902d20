//! Job outcomes and failure classification.

use backlot_core::error::BackendError;
use serde::{Deserialize, Serialize};

use super::slot::ArtifactRef;

/// Classified failure taxonomy stored on slots and reported in outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider rejected the caller's credential or permissions.
    /// Recoverable by selecting a fresh credential.
    AuthorizationExpired,
    /// The backend reported success without a usable artifact.
    MissingArtifact,
    /// The polling wall-clock budget was exhausted.
    Timeout,
    /// Cooperative cancellation was observed.
    Cancelled,
    /// A job for the same asset is already in flight. The slot is not
    /// touched; the duplicate caller simply backs off.
    Busy,
    /// Any other backend failure. Not retried automatically.
    Transient,
}

/// Terminal result of a single job run.
///
/// Jobs never escape as a Rust error: every way a run can stop is expressed
/// here, and the slot records the same information.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The run produced an artifact.
    Completed {
        /// The produced artifact.
        artifact: ArtifactRef,
    },
    /// The run stopped without an artifact.
    Failed {
        /// Classified failure kind.
        kind: FailureKind,
        /// Human-readable failure message.
        message: String,
    },
}

impl JobOutcome {
    /// Returns whether the run produced an artifact.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub(crate) fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }
}

/// Message markers the provider is observed to emit on credential and
/// permission rejections.
const AUTHORIZATION_MARKERS: [&str; 3] = [
    "PERMISSION_DENIED",
    "Requested entity was not found",
    "403",
];

/// Classifies a backend error into the slot-visible failure taxonomy.
///
/// Authorization failures are detected from the provider's message markers
/// or an explicit 403 status; everything else is transient.
#[must_use]
pub fn classify_backend_error(error: &BackendError) -> FailureKind {
    match error {
        BackendError::Api { message, status } => {
            if *status == Some(403)
                || AUTHORIZATION_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
            {
                FailureKind::AuthorizationExpired
            } else {
                FailureKind::Transient
            }
        }
        BackendError::Transport(_) => FailureKind::Transient,
    }
}
