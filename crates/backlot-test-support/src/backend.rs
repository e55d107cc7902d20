//! Test backends — scripted `GenerationBackend` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use backlot_core::asset::RenderConfig;
use backlot_core::backend::{GenerationBackend, MediaPayload, OperationHandle};
use backlot_core::error::BackendError;

/// A single recorded backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `generate_image` with the given prompt.
    GenerateImage {
        /// The prompt that was submitted.
        prompt: String,
    },
    /// `submit_video` with the given prompt.
    SubmitVideo {
        /// The prompt that was submitted.
        prompt: String,
    },
    /// `poll_video` for the given operation name.
    PollVideo {
        /// The polled operation's name.
        operation: String,
    },
    /// `download` of the given URI.
    Download {
        /// The requested artifact URI.
        uri: String,
    },
}

/// A backend that replays scripted results and records every call.
///
/// Each capability has its own queue of scripted results, consumed one per
/// call. Tests must script at least as many results as the calls they
/// trigger; an exhausted queue panics.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    image_results: Mutex<VecDeque<Result<MediaPayload, BackendError>>>,
    submit_results: Mutex<VecDeque<Result<OperationHandle, BackendError>>>,
    poll_results: Mutex<VecDeque<Result<OperationHandle, BackendError>>>,
    download_results: Mutex<VecDeque<Result<MediaPayload, BackendError>>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl ScriptedBackend {
    /// Creates a backend with empty scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a result for the next unconsumed `generate_image` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn script_image(&self, result: Result<MediaPayload, BackendError>) {
        self.image_results.lock().unwrap().push_back(result);
    }

    /// Queues a result for the next unconsumed `submit_video` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn script_submit(&self, result: Result<OperationHandle, BackendError>) {
        self.submit_results.lock().unwrap().push_back(result);
    }

    /// Queues a result for the next unconsumed `poll_video` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn script_poll(&self, result: Result<OperationHandle, BackendError>) {
        self.poll_results.lock().unwrap().push_back(result);
    }

    /// Queues a result for the next unconsumed `download` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn script_download(&self, result: Result<MediaPayload, BackendError>) {
        self.download_results.lock().unwrap().push_back(result);
    }

    /// Returns a snapshot of every call made so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn recorded_calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns how many `poll_video` calls were made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn poll_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, BackendCall::PollVideo { .. }))
            .count()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_image(
        &self,
        prompt: &str,
        _config: &RenderConfig,
    ) -> Result<MediaPayload, BackendError> {
        self.calls.lock().unwrap().push(BackendCall::GenerateImage {
            prompt: prompt.to_owned(),
        });
        self.image_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedBackend: no scripted result left for generate_image")
    }

    async fn submit_video(
        &self,
        prompt: &str,
        _config: &RenderConfig,
    ) -> Result<OperationHandle, BackendError> {
        self.calls.lock().unwrap().push(BackendCall::SubmitVideo {
            prompt: prompt.to_owned(),
        });
        self.submit_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedBackend: no scripted result left for submit_video")
    }

    async fn poll_video(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationHandle, BackendError> {
        self.calls.lock().unwrap().push(BackendCall::PollVideo {
            operation: handle.name.clone(),
        });
        self.poll_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedBackend: no scripted result left for poll_video")
    }

    async fn download(&self, uri: &str) -> Result<MediaPayload, BackendError> {
        self.calls.lock().unwrap().push(BackendCall::Download {
            uri: uri.to_owned(),
        });
        self.download_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedBackend: no scripted result left for download")
    }
}

/// A backend that fails every call with a clone of the same error. Useful
/// for testing failure classification paths.
#[derive(Debug)]
pub struct FailingBackend {
    error: BackendError,
}

impl FailingBackend {
    /// Creates a backend that always fails with `error`.
    #[must_use]
    pub fn new(error: BackendError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl GenerationBackend for FailingBackend {
    async fn generate_image(
        &self,
        _prompt: &str,
        _config: &RenderConfig,
    ) -> Result<MediaPayload, BackendError> {
        Err(self.error.clone())
    }

    async fn submit_video(
        &self,
        _prompt: &str,
        _config: &RenderConfig,
    ) -> Result<OperationHandle, BackendError> {
        Err(self.error.clone())
    }

    async fn poll_video(
        &self,
        _handle: &OperationHandle,
    ) -> Result<OperationHandle, BackendError> {
        Err(self.error.clone())
    }

    async fn download(&self, _uri: &str) -> Result<MediaPayload, BackendError> {
        Err(self.error.clone())
    }
}
