//! Test delay — instant `Delay` implementation for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use backlot_core::time::Delay;

/// A delay that returns immediately and records every requested duration.
///
/// Lets polling-loop tests assert the sleep cadence (how many ticks, which
/// intervals) without any real waiting.
#[derive(Debug, Default)]
pub struct InstantDelay {
    slept: Mutex<Vec<Duration>>,
}

impl InstantDelay {
    /// Creates a new instant delay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every duration that was requested, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn slept_durations(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for InstantDelay {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
