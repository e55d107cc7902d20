//! Generation backend abstraction.

use std::fmt;

use async_trait::async_trait;

use crate::asset::RenderConfig;
use crate::error::BackendError;

/// Raw media bytes returned by the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    /// The encoded media bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `image/png` or `video/mp4`.
    pub mime_type: String,
}

impl MediaPayload {
    /// Creates a payload from bytes and a MIME type.
    #[must_use]
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

// Payloads can be megabytes; Debug prints the length instead of the bytes.
impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Opaque handle to a long-running video generation operation.
///
/// The handle is owned by a single job invocation and never stored in a
/// slot; polling returns a refreshed handle for the same operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    /// Provider-issued operation name, echoed back on every poll.
    pub name: String,
    /// Whether the operation has finished.
    pub done: bool,
    /// URI of the produced artifact, populated once `done` is true.
    pub artifact_uri: Option<String>,
}

impl OperationHandle {
    /// Creates a pending handle for a freshly submitted operation.
    #[must_use]
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            artifact_uri: None,
        }
    }
}

/// Capability trait for the externally hosted generation service.
///
/// The concrete wire protocol is the implementor's concern; the orchestrator
/// only drives these four calls.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Requests a single image and returns its payload inline.
    async fn generate_image(
        &self,
        prompt: &str,
        config: &RenderConfig,
    ) -> Result<MediaPayload, BackendError>;

    /// Starts a video generation operation.
    async fn submit_video(
        &self,
        prompt: &str,
        config: &RenderConfig,
    ) -> Result<OperationHandle, BackendError>;

    /// Fetches the current state of a video operation.
    async fn poll_video(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationHandle, BackendError>;

    /// Downloads a finished artifact. The credentialed fetch is the
    /// backend's concern.
    async fn download(&self, uri: &str) -> Result<MediaPayload, BackendError>;
}
