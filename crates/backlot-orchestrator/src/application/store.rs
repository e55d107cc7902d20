//! In-memory slot store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use backlot_core::asset::AssetId;
use backlot_core::time::Clock;

use crate::domain::phase::JobPhase;
use crate::domain::slot::AssetSlot;

/// Process-local store of asset slots.
///
/// Slots are created `Idle` on first reference and never destroyed within a
/// session. The map lock is held only for the duration of a single read or
/// write, never across an `await`; readers receive cloned snapshots.
#[derive(Clone)]
pub struct SlotStore {
    slots: Arc<Mutex<HashMap<AssetId, AssetSlot>>>,
    clock: Arc<dyn Clock>,
}

impl SlotStore {
    /// Creates an empty store stamping mutations with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    // Slot data is plain values; a poisoned lock cannot leave it invalid.
    fn lock(&self) -> MutexGuard<'_, HashMap<AssetId, AssetSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a snapshot of the slot, creating it `Idle` on first
    /// reference.
    #[must_use]
    pub fn get(&self, id: &AssetId) -> AssetSlot {
        let now = self.clock.now();
        let mut slots = self.lock();
        slots
            .entry(id.clone())
            .or_insert_with(|| AssetSlot::idle(id.clone(), now))
            .clone()
    }

    /// Returns a snapshot of the slot without creating it.
    #[must_use]
    pub fn peek(&self, id: &AssetId) -> Option<AssetSlot> {
        self.lock().get(id).cloned()
    }

    /// Applies a merge-style mutation: `apply` touches only the fields it
    /// names, then `updated_at` is stamped. Creates the slot if absent.
    pub fn update(&self, id: &AssetId, apply: impl FnOnce(&mut AssetSlot)) {
        let now = self.clock.now();
        let mut slots = self.lock();
        let slot = slots
            .entry(id.clone())
            .or_insert_with(|| AssetSlot::idle(id.clone(), now));
        apply(slot);
        slot.updated_at = now;
    }

    /// Atomically claims the slot for a new run.
    ///
    /// Returns `false` without touching the slot when a run is already in
    /// flight (any phase from which `AwaitingCredential` is not a legal
    /// successor); otherwise moves the slot to `AwaitingCredential`, clears
    /// any previous error, and returns `true`.
    pub fn try_begin(&self, id: &AssetId) -> bool {
        let now = self.clock.now();
        let mut slots = self.lock();
        let slot = slots
            .entry(id.clone())
            .or_insert_with(|| AssetSlot::idle(id.clone(), now));
        if !slot.phase.can_transition_to(JobPhase::AwaitingCredential) {
            return false;
        }
        slot.set_phase(JobPhase::AwaitingCredential);
        slot.error = None;
        slot.updated_at = now;
        true
    }

    /// Returns the slot to its initial state: `Idle` with no narration,
    /// artifact, or error. Idempotent for any prior phase.
    pub fn reset(&self, id: &AssetId) {
        self.update(id, |slot| {
            slot.set_phase(JobPhase::Idle);
            slot.narration = None;
            slot.artifact = None;
            slot.error = None;
        });
    }

    /// Returns snapshots of every known slot, ordered by asset id.
    #[must_use]
    pub fn snapshot_all(&self) -> Vec<AssetSlot> {
        let mut all: Vec<AssetSlot> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
