//! Job runner — drives a single generation job to a terminal outcome.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use backlot_core::asset::{AssetId, AssetKind, AssetRequest};
use backlot_core::backend::{GenerationBackend, MediaPayload};
use backlot_core::cancel::CancelToken;
use backlot_core::error::BackendError;
use backlot_core::rng::RandomSource;
use backlot_core::time::{Clock, Delay};
use chrono::TimeDelta;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::credential_gate::CredentialGate;
use crate::application::store::SlotStore;
use crate::domain::narration;
use crate::domain::outcome::{FailureKind, JobOutcome, classify_backend_error};
use crate::domain::phase::JobPhase;
use crate::domain::slot::{ArtifactRef, SlotError};

/// Polling cadence and budget for long-running operations.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Pause between successive polls.
    pub interval: Duration,
    /// Wall-clock budget for the whole polling phase.
    pub budget: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            budget: Duration::from_secs(600),
        }
    }
}

/// Drives generation jobs: one invocation takes a request from submission
/// through polling and download to a terminal outcome, recording every step
/// on the asset's slot.
pub struct JobRunner {
    store: SlotStore,
    gate: Arc<CredentialGate>,
    backend: Arc<dyn GenerationBackend>,
    clock: Arc<dyn Clock>,
    delay: Arc<dyn Delay>,
    rng: Arc<Mutex<dyn RandomSource>>,
    policy: PollPolicy,
}

impl JobRunner {
    /// Creates a runner over the given capabilities and determinism seams.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        store: SlotStore,
        gate: Arc<CredentialGate>,
        backend: Arc<dyn GenerationBackend>,
        clock: Arc<dyn Clock>,
        delay: Arc<dyn Delay>,
        rng: Arc<Mutex<dyn RandomSource>>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            store,
            gate,
            backend,
            clock,
            delay,
            rng,
            policy,
        }
    }

    /// Runs a generation job for `request` to a terminal outcome.
    ///
    /// Never returns a Rust error: every way a run can stop is classified,
    /// recorded on the slot, and reported in the outcome. A request for an
    /// asset whose job is already in flight resolves `Busy` without
    /// touching the slot.
    pub async fn run_job(&self, request: &AssetRequest, cancel: &CancelToken) -> JobOutcome {
        let job_id = Uuid::new_v4();

        if !self.store.try_begin(&request.id) {
            debug!(%job_id, asset_id = %request.id, "rejecting duplicate submission");
            return JobOutcome::failed(
                FailureKind::Busy,
                format!("a job for {} is already in flight", request.id),
            );
        }
        info!(%job_id, asset_id = %request.id, kind = ?request.kind, "job started");

        // The backend's own rejection is authoritative; an unconfirmed
        // credential only downgrades the log.
        if !self.gate.ensure_credential().await {
            warn!(%job_id, asset_id = %request.id, "proceeding without a confirmed credential");
        }

        self.store.update(&request.id, |slot| {
            slot.set_phase(JobPhase::Submitted);
            slot.narration = Some(narration::opening_phrase(request.kind).to_owned());
        });

        let outcome = match request.kind {
            AssetKind::Image => self.run_image(job_id, request).await,
            AssetKind::Video => self.run_video(job_id, request, cancel).await,
        };
        self.record_outcome(job_id, &request.id, outcome)
    }

    async fn run_image(&self, job_id: Uuid, request: &AssetRequest) -> JobOutcome {
        match self
            .backend
            .generate_image(&request.prompt, &request.config)
            .await
        {
            Ok(payload) => outcome_from_payload(payload, None),
            Err(error) => self.classify_failure(job_id, &error).await,
        }
    }

    async fn run_video(
        &self,
        job_id: Uuid,
        request: &AssetRequest,
        cancel: &CancelToken,
    ) -> JobOutcome {
        let mut handle = match self
            .backend
            .submit_video(&request.prompt, &request.config)
            .await
        {
            Ok(handle) => handle,
            Err(error) => return self.classify_failure(job_id, &error).await,
        };

        if !handle.done {
            self.store
                .update(&request.id, |slot| slot.set_phase(JobPhase::Polling));
        }
        let polling_started = self.clock.now();
        let budget = TimeDelta::from_std(self.policy.budget).unwrap_or(TimeDelta::MAX);

        while !handle.done {
            if cancel.is_cancelled() {
                info!(%job_id, asset_id = %request.id, "cancellation observed");
                return JobOutcome::failed(FailureKind::Cancelled, "generation was cancelled");
            }
            if self.clock.now() - polling_started > budget {
                return JobOutcome::failed(
                    FailureKind::Timeout,
                    format!(
                        "operation did not finish within {}s",
                        self.policy.budget.as_secs()
                    ),
                );
            }

            self.delay.sleep(self.policy.interval).await;
            handle = match self.backend.poll_video(&handle).await {
                Ok(handle) => handle,
                Err(error) => return self.classify_failure(job_id, &error).await,
            };
            debug!(%job_id, asset_id = %request.id, done = handle.done, "polled operation");
            self.rotate_narration(&request.id);
        }

        let Some(uri) = handle.artifact_uri else {
            return JobOutcome::failed(
                FailureKind::MissingArtifact,
                "operation finished without an artifact uri",
            );
        };
        match self.backend.download(&uri).await {
            Ok(payload) => outcome_from_payload(payload, Some(uri)),
            Err(error) => self.classify_failure(job_id, &error).await,
        }
    }

    /// Classifies a backend error, running the authorization recovery path
    /// when the credential itself was rejected.
    async fn classify_failure(&self, job_id: Uuid, error: &BackendError) -> JobOutcome {
        let kind = classify_backend_error(error);
        if kind == FailureKind::AuthorizationExpired {
            warn!(%job_id, "backend rejected the credential, reopening selection");
            self.gate.mark_invalid();
            self.gate.reopen_selection().await;
        }
        JobOutcome::failed(kind, error.to_string())
    }

    fn rotate_narration(&self, id: &AssetId) {
        let phrase = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            narration::polling_phrase(&mut *rng)
        };
        self.store
            .update(id, |slot| slot.narration = Some(phrase.to_owned()));
    }

    fn record_outcome(&self, job_id: Uuid, id: &AssetId, outcome: JobOutcome) -> JobOutcome {
        match &outcome {
            JobOutcome::Completed { artifact } => {
                info!(%job_id, asset_id = %id, mime_type = %artifact.mime_type, "job succeeded");
                let stored = artifact.clone();
                self.store.update(id, |slot| {
                    slot.set_phase(JobPhase::Succeeded);
                    slot.artifact = Some(stored);
                    slot.error = None;
                    slot.narration = None;
                });
            }
            JobOutcome::Failed { kind, message } => {
                warn!(%job_id, asset_id = %id, kind = ?kind, %message, "job failed");
                let error = SlotError {
                    kind: *kind,
                    message: message.clone(),
                };
                self.store.update(id, |slot| {
                    slot.set_phase(JobPhase::Failed);
                    slot.error = Some(error);
                    slot.narration = None;
                });
            }
        }
        outcome
    }
}

/// Turns a downloaded or inline payload into an outcome, treating an empty
/// payload as a missing artifact.
fn outcome_from_payload(payload: MediaPayload, source_uri: Option<String>) -> JobOutcome {
    if payload.bytes.is_empty() {
        return JobOutcome::failed(
            FailureKind::MissingArtifact,
            "backend returned an empty artifact",
        );
    }
    JobOutcome::Completed {
        artifact: ArtifactRef::from_payload(payload, source_uri),
    }
}
