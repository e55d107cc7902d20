//! Progress narration phrases.
//!
//! Narration is cosmetic. Callers must not branch on the exact strings, and
//! tests only assert that narration is present while a run is active and
//! rotates across polling ticks.

use backlot_core::asset::AssetKind;
use backlot_core::rng::RandomSource;

/// Phrases rotated through while a long-running operation is polled.
pub(crate) const POLLING_PHRASES: [&str; 4] = [
    "Compositing light and shadow...",
    "Color grading the frames...",
    "Rendering the final cut...",
    "Polishing every frame...",
];

/// Opening phrase shown when a request is handed to the backend.
pub(crate) fn opening_phrase(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Image => "Sketching the first strokes...",
        AssetKind::Video => "Rolling cameras on the set...",
    }
}

/// Picks the next polling phrase.
pub(crate) fn polling_phrase(rng: &mut dyn RandomSource) -> &'static str {
    POLLING_PHRASES[rng.pick_index(POLLING_PHRASES.len())]
}
