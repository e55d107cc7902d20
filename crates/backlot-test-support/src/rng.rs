//! Test random sources — deterministic `RandomSource` implementations.

use backlot_core::rng::RandomSource;

/// A random source that always picks index `0`. Suitable for tests that do
/// not depend on which narration phrase is chosen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroRandom;

impl RandomSource for ZeroRandom {
    fn pick_index(&mut self, _len: usize) -> usize {
        0
    }
}

/// A random source that returns values from a predetermined sequence,
/// reduced modulo `len`. Panics if the sequence is exhausted. Used in tests
/// that assert narration rotates across polling ticks.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<usize>,
    index: usize,
}

impl SequenceRandom {
    /// Creates a new `SequenceRandom` with the given values.
    #[must_use]
    pub fn new(values: Vec<usize>) -> Self {
        Self { values, index: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        let val = self.values[self.index];
        self.index += 1;
        val % len
    }
}
