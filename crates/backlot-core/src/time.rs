//! Time abstractions for determinism.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Abstraction over suspending the current task.
///
/// Polling loops sleep through this seam so tests can drive them without
/// waiting out real poll intervals.
#[async_trait]
pub trait Delay: Send + Sync {
    /// Suspends the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production delay backed by the Tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
