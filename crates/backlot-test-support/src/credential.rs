//! Test credential hosts — scripted `CredentialHost` implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use backlot_core::credential::CredentialHost;
use backlot_core::error::BackendError;

/// A credential host that records probe and selection calls.
///
/// The selection flow can be scripted to succeed (the user picks a
/// credential) or to be dismissed without one. `yield_rounds` inserts
/// scheduler yields into `open_selection` so concurrency tests can overlap
/// a second caller with an in-flight prompt.
#[derive(Debug)]
pub struct RecordingCredentialHost {
    selected: Mutex<bool>,
    select_on_open: bool,
    yield_rounds: usize,
    probe_calls: Mutex<usize>,
    open_calls: Mutex<usize>,
}

impl RecordingCredentialHost {
    /// Creates a host that already has a credential selected.
    #[must_use]
    pub fn selected() -> Self {
        Self::new(true, false)
    }

    /// Creates a host with no credential where the selection flow, once
    /// opened, results in one being selected.
    #[must_use]
    pub fn selects_on_open() -> Self {
        Self::new(false, true)
    }

    /// Creates a host with no credential where the selection flow is
    /// dismissed without selecting one.
    #[must_use]
    pub fn declines() -> Self {
        Self::new(false, false)
    }

    fn new(selected: bool, select_on_open: bool) -> Self {
        Self {
            selected: Mutex::new(selected),
            select_on_open,
            yield_rounds: 0,
            probe_calls: Mutex::new(0),
            open_calls: Mutex::new(0),
        }
    }

    /// Makes `open_selection` yield to the scheduler `rounds` times before
    /// completing.
    #[must_use]
    pub fn with_yield_rounds(mut self, rounds: usize) -> Self {
        self.yield_rounds = rounds;
        self
    }

    /// Returns how many times the credential was probed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn probe_count(&self) -> usize {
        *self.probe_calls.lock().unwrap()
    }

    /// Returns how many times the selection flow was opened.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn open_count(&self) -> usize {
        *self.open_calls.lock().unwrap()
    }
}

#[async_trait]
impl CredentialHost for RecordingCredentialHost {
    async fn has_selected_credential(&self) -> Result<bool, BackendError> {
        *self.probe_calls.lock().unwrap() += 1;
        Ok(*self.selected.lock().unwrap())
    }

    async fn open_selection(&self) -> Result<(), BackendError> {
        *self.open_calls.lock().unwrap() += 1;
        for _ in 0..self.yield_rounds {
            tokio::task::yield_now().await;
        }
        if self.select_on_open {
            *self.selected.lock().unwrap() = true;
        }
        Ok(())
    }
}

/// A credential host whose probe and selection flow always fail. Useful for
/// testing that host errors degrade to "no credential" instead of aborting
/// a job.
#[derive(Debug)]
pub struct FailingCredentialHost;

#[async_trait]
impl CredentialHost for FailingCredentialHost {
    async fn has_selected_credential(&self) -> Result<bool, BackendError> {
        Err(BackendError::Transport("credential host unavailable".into()))
    }

    async fn open_selection(&self) -> Result<(), BackendError> {
        Err(BackendError::Transport("credential host unavailable".into()))
    }
}
