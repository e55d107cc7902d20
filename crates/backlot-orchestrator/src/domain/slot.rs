//! Asset slots — the observable per-asset records.

use std::fmt;

use backlot_core::asset::AssetId;
use backlot_core::backend::MediaPayload;
use chrono::{DateTime, Utc};

use super::outcome::FailureKind;
use super::phase::JobPhase;

/// Reference to a produced artifact.
#[derive(Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// MIME type of the artifact bytes.
    pub mime_type: String,
    /// The artifact bytes.
    pub bytes: Vec<u8>,
    /// Source URI when the artifact was downloaded from a finished
    /// operation rather than returned inline.
    pub source_uri: Option<String>,
}

impl ArtifactRef {
    /// Builds an artifact reference from a backend payload.
    #[must_use]
    pub fn from_payload(payload: MediaPayload, source_uri: Option<String>) -> Self {
        Self {
            mime_type: payload.mime_type,
            bytes: payload.bytes,
            source_uri,
        }
    }
}

// Artifacts can be megabytes; Debug prints the length instead of the bytes.
impl fmt::Debug for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactRef")
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("source_uri", &self.source_uri)
            .finish()
    }
}

/// Classified error recorded on a failed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotError {
    /// Classified failure kind.
    pub kind: FailureKind,
    /// Human-readable failure message.
    pub message: String,
}

/// The observable record for one asset.
///
/// Owned exclusively by the orchestrator; readers get cloned snapshots.
/// Slots are created `Idle` on first reference and never destroyed within a
/// session. Terminal slots may be re-run, overwriting their state.
#[derive(Debug, Clone)]
pub struct AssetSlot {
    /// The asset this slot tracks.
    pub id: AssetId,
    /// Current lifecycle phase.
    pub phase: JobPhase,
    /// Progress narration, present only while a run is active.
    pub narration: Option<String>,
    /// The artifact from the most recent successful run.
    pub artifact: Option<ArtifactRef>,
    /// The error from the most recent failed run.
    pub error: Option<SlotError>,
    /// When the slot was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl AssetSlot {
    /// Creates a fresh idle slot.
    #[must_use]
    pub fn idle(id: AssetId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            phase: JobPhase::Idle,
            narration: None,
            artifact: None,
            error: None,
            updated_at: now,
        }
    }

    /// Moves the slot to `next`.
    ///
    /// Transition legality is a debug assertion: phase writes only happen
    /// inside the orchestrator, which must follow the lifecycle.
    pub fn set_phase(&mut self, next: JobPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase transition {:?} -> {:?} for {}",
            self.phase,
            next,
            self.id,
        );
        self.phase = next;
    }
}
