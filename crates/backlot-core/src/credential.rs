//! Credential host abstraction.

use async_trait::async_trait;

use crate::error::BackendError;

/// Capability trait for the environment that provisions credentials.
///
/// The host owns credential storage and the interactive selection surface;
/// the orchestrator only probes and prompts through it.
#[async_trait]
pub trait CredentialHost: Send + Sync {
    /// Returns whether a usable credential is currently selected.
    async fn has_selected_credential(&self) -> Result<bool, BackendError>;

    /// Opens the host's interactive selection flow, returning when the
    /// user dismisses it. Completion does not guarantee a selection was
    /// made; callers re-probe afterwards.
    async fn open_selection(&self) -> Result<(), BackendError>;
}
