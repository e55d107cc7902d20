//! Random source abstraction.
//!
//! Narration rotation is the only random behavior in the orchestrator. In
//! production this wraps the thread-local RNG; tests inject a scripted
//! sequence.

use rand::Rng;

/// Abstraction over random index selection.
pub trait RandomSource: Send + Sync {
    /// Returns a uniformly distributed index in `[0, len)`.
    ///
    /// `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}
