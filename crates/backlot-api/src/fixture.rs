//! Deterministic in-process generation backend.
//!
//! Stands in for a real provider so the server runs end-to-end without a
//! credential: images render as labeled SVG placeholders and video
//! operations complete after a fixed number of polls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use backlot_core::asset::RenderConfig;
use backlot_core::backend::{GenerationBackend, MediaPayload, OperationHandle};
use backlot_core::credential::CredentialHost;
use backlot_core::error::BackendError;
use tracing::debug;

/// Number of polls a fixture video operation stays pending before it
/// reports done.
const DEFAULT_PENDING_POLLS: u32 = 2;

/// Characters of the prompt rendered onto the placeholder.
const LABEL_CHARS: usize = 48;

struct PendingOperation {
    remaining_polls: u32,
    prompt: String,
    config: RenderConfig,
}

/// Generation backend that synthesizes placeholder artifacts in process.
pub struct FixtureBackend {
    pending_polls: u32,
    next_operation: AtomicU64,
    operations: Mutex<HashMap<String, PendingOperation>>,
}

impl FixtureBackend {
    /// Creates a backend whose video operations finish after two polls.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pending_polls(DEFAULT_PENDING_POLLS)
    }

    /// Creates a backend whose video operations stay pending for `polls`
    /// ticks. Zero means operations are already done at submission.
    #[must_use]
    pub fn with_pending_polls(polls: u32) -> Self {
        Self {
            pending_polls: polls,
            next_operation: AtomicU64::new(0),
            operations: Mutex::new(HashMap::new()),
        }
    }

    // Operation entries are plain values; a poisoned lock cannot leave
    // them invalid.
    fn operations(&self) -> MutexGuard<'_, HashMap<String, PendingOperation>> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FixtureBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for FixtureBackend {
    async fn generate_image(
        &self,
        prompt: &str,
        config: &RenderConfig,
    ) -> Result<MediaPayload, BackendError> {
        debug!(prompt_len = prompt.len(), "rendering fixture image");
        Ok(placeholder_svg(prompt, config))
    }

    async fn submit_video(
        &self,
        prompt: &str,
        config: &RenderConfig,
    ) -> Result<OperationHandle, BackendError> {
        let sequence = self.next_operation.fetch_add(1, Ordering::Relaxed);
        let name = format!("operations/fixture-{sequence}");
        self.operations().insert(
            name.clone(),
            PendingOperation {
                remaining_polls: self.pending_polls,
                prompt: prompt.to_owned(),
                config: config.clone(),
            },
        );
        debug!(operation = %name, prompt_len = prompt.len(), "fixture video submitted");

        if self.pending_polls == 0 {
            Ok(OperationHandle {
                artifact_uri: Some(artifact_uri(&name)),
                name,
                done: true,
            })
        } else {
            Ok(OperationHandle::pending(name))
        }
    }

    async fn poll_video(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationHandle, BackendError> {
        let mut operations = self.operations();
        let operation = operations
            .get_mut(&handle.name)
            .ok_or_else(|| BackendError::api(format!("unknown operation: {}", handle.name)))?;

        operation.remaining_polls = operation.remaining_polls.saturating_sub(1);
        if operation.remaining_polls == 0 {
            Ok(OperationHandle {
                name: handle.name.clone(),
                done: true,
                artifact_uri: Some(artifact_uri(&handle.name)),
            })
        } else {
            Ok(OperationHandle::pending(handle.name.clone()))
        }
    }

    async fn download(&self, uri: &str) -> Result<MediaPayload, BackendError> {
        let name = uri
            .strip_prefix("fixture://")
            .and_then(|rest| rest.strip_suffix("/artifact"))
            .ok_or_else(|| BackendError::api(format!("unknown artifact uri: {uri}")))?;

        let operation = self
            .operations()
            .remove(name)
            .ok_or_else(|| BackendError::api(format!("no artifact for operation: {name}")))?;

        Ok(placeholder_svg(&operation.prompt, &operation.config))
    }
}

/// Credential host that always reports a selected credential.
///
/// Standalone runs have no selection flow to open; the fixture backend does
/// not check credentials anyway.
#[derive(Debug, Clone, Copy)]
pub struct FixtureCredentialHost;

#[async_trait]
impl CredentialHost for FixtureCredentialHost {
    async fn has_selected_credential(&self) -> Result<bool, BackendError> {
        Ok(true)
    }

    async fn open_selection(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

fn artifact_uri(name: &str) -> String {
    format!("fixture://{name}/artifact")
}

fn placeholder_svg(prompt: &str, config: &RenderConfig) -> MediaPayload {
    let (width, height) = canvas_size(&config.aspect_ratio);
    let label: String = prompt.chars().take(LABEL_CHARS).collect();
    let label = xml_escape(&label);
    let hue = prompt.bytes().map(u32::from).sum::<u32>() % 360;
    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">\
         <rect width=\"100%\" height=\"100%\" fill=\"hsl({hue}, 45%, 28%)\"/>\
         <text x=\"50%\" y=\"50%\" fill=\"#f5f1e8\" font-family=\"serif\" font-size=\"20\" \
         text-anchor=\"middle\">{label}</text>\
         </svg>"
    );
    MediaPayload::new(svg.into_bytes(), "image/svg+xml")
}

fn canvas_size(aspect_ratio: &str) -> (u32, u32) {
    match aspect_ratio {
        "16:9" => (960, 540),
        "9:16" => (540, 960),
        _ => (640, 640),
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
