//! Test clocks — deterministic `Clock` implementations for tests.

use std::sync::Mutex;

use backlot_core::time::Clock;
use chrono::{DateTime, TimeDelta, Utc};

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that advances by a fixed step on every reading.
///
/// Used to drive wall-clock budgets (e.g. the polling timeout) without
/// waiting: each `now` call observes the previous value plus `step`.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: TimeDelta,
}

impl SteppingClock {
    /// Creates a clock whose first reading is `start`, advancing by `step`
    /// per reading thereafter.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let current = *next;
        *next = current + self.step;
        current
    }
}
