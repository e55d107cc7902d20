//! Credential gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use backlot_core::credential::CredentialHost;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Serializes credential probing and prompting for a session.
///
/// The gate caches the last known selection state. Concurrent callers that
/// find no credential share a single prompt: the first caller opens the
/// host's selection flow while the rest wait on the same lock and observe
/// its result. Host errors degrade to "not selected" rather than failing
/// the caller.
pub struct CredentialGate {
    host: Arc<dyn CredentialHost>,
    selected: AtomicBool,
    prompt: Mutex<()>,
}

impl CredentialGate {
    /// Creates a gate over `host` with no cached selection.
    #[must_use]
    pub fn new(host: Arc<dyn CredentialHost>) -> Self {
        Self {
            host,
            selected: AtomicBool::new(false),
            prompt: Mutex::new(()),
        }
    }

    /// Ensures a credential is available, prompting at most once across
    /// concurrent callers. Returns the resulting availability.
    ///
    /// Once the gate has observed a selection, further calls return `true`
    /// without suspending.
    pub async fn ensure_credential(&self) -> bool {
        if self.selected.load(Ordering::SeqCst) {
            return true;
        }

        let _guard = self.prompt.lock().await;
        // A concurrent caller may have finished the prompt while this one
        // waited for the lock.
        if self.selected.load(Ordering::SeqCst) {
            return true;
        }

        if self.probe().await {
            self.selected.store(true, Ordering::SeqCst);
            return true;
        }

        debug!("no credential selected, opening selection flow");
        if let Err(error) = self.host.open_selection().await {
            warn!(%error, "credential selection flow failed");
        }

        let selected = self.probe().await;
        self.selected.store(selected, Ordering::SeqCst);
        selected
    }

    /// Reopens the host's selection flow after the backend rejected the
    /// current credential.
    ///
    /// The cached state is left unselected; the next `ensure_credential`
    /// call re-probes the host and picks up whatever the user selected.
    pub async fn reopen_selection(&self) {
        let _guard = self.prompt.lock().await;
        debug!("reopening credential selection after an authorization failure");
        if let Err(error) = self.host.open_selection().await {
            warn!(%error, "credential selection flow failed");
        }
    }

    /// Forgets the cached selection. Called when the backend rejects the
    /// credential the cache considered good.
    pub fn mark_invalid(&self) {
        self.selected.store(false, Ordering::SeqCst);
    }

    /// Returns the cached selection state without probing the host.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected.load(Ordering::SeqCst)
    }

    async fn probe(&self) -> bool {
        match self.host.has_selected_credential().await {
            Ok(selected) => selected,
            Err(error) => {
                warn!(%error, "credential probe failed, treating as unselected");
                false
            }
        }
    }
}
