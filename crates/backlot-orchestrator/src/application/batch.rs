//! Batch coordinator — sequential generation across a set of requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use backlot_core::asset::AssetRequest;
use backlot_core::cancel::CancelToken;
use serde::Serialize;
use tracing::{debug, info};

use crate::application::credential_gate::CredentialGate;
use crate::application::job_runner::JobRunner;
use crate::application::store::SlotStore;
use crate::domain::outcome::JobOutcome;
use crate::domain::phase::JobPhase;

/// Summary counts for a finished batch. Observability only; the slots
/// remain the source of truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Jobs that produced an artifact.
    pub succeeded: usize,
    /// Jobs that stopped without one.
    pub failed: usize,
    /// Slots skipped because they already held an artifact.
    pub skipped: usize,
    /// Requests never started because cancellation was observed first.
    pub remaining: usize,
}

/// Result of asking the coordinator to run a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch ran to completion (possibly cut short by cancellation).
    Completed {
        /// Summary counts for the run.
        report: BatchReport,
    },
    /// Another batch was already running; nothing was touched.
    AlreadyRunning,
}

/// Runs a set of generation requests strictly one at a time.
///
/// At most one batch is in flight per coordinator. Individual job failures
/// are recorded and do not stop the remaining requests.
pub struct BatchCoordinator {
    runner: Arc<JobRunner>,
    gate: Arc<CredentialGate>,
    store: SlotStore,
    running: AtomicBool,
}

impl BatchCoordinator {
    /// Creates a coordinator driving `runner` over `store`.
    #[must_use]
    pub fn new(runner: Arc<JobRunner>, gate: Arc<CredentialGate>, store: SlotStore) -> Self {
        Self {
            runner,
            gate,
            store,
            running: AtomicBool::new(false),
        }
    }

    /// Returns whether a batch is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs `requests` in order, one at a time.
    ///
    /// The credential is ensured once up front. Slots that already hold an
    /// artifact are skipped; a failed job never aborts the rest. A second
    /// concurrent call resolves `AlreadyRunning` without touching any slot.
    pub async fn run_batch(
        &self,
        requests: &[AssetRequest],
        cancel: &CancelToken,
    ) -> BatchOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("rejecting batch: one is already running");
            return BatchOutcome::AlreadyRunning;
        }

        let report = self.drive(requests, cancel).await;
        self.running.store(false, Ordering::SeqCst);
        BatchOutcome::Completed { report }
    }

    async fn drive(&self, requests: &[AssetRequest], cancel: &CancelToken) -> BatchReport {
        info!(total = requests.len(), "batch started");
        self.gate.ensure_credential().await;

        let mut report = BatchReport::default();
        for (index, request) in requests.iter().enumerate() {
            if cancel.is_cancelled() {
                report.remaining = requests.len() - index;
                info!(remaining = report.remaining, "batch cancelled");
                break;
            }
            if self.store.get(&request.id).phase == JobPhase::Succeeded {
                debug!(asset_id = %request.id, "skipping slot with an existing artifact");
                report.skipped += 1;
                continue;
            }
            match self.runner.run_job(request, cancel).await {
                JobOutcome::Completed { .. } => report.succeeded += 1,
                JobOutcome::Failed { .. } => report.failed += 1,
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use backlot_core::asset::{AssetId, AssetKind, RenderConfig};
    use backlot_core::backend::{GenerationBackend, MediaPayload, OperationHandle};
    use backlot_core::credential::CredentialHost;
    use backlot_core::error::BackendError;
    use backlot_core::time::{Clock, Delay};
    use backlot_test_support::{
        BackendCall, FixedClock, InstantDelay, RecordingCredentialHost, ScriptedBackend,
        SteppingClock, ZeroRandom,
    };
    use chrono::{TimeDelta, TimeZone, Utc};

    use crate::application::job_runner::PollPolicy;

    use super::*;

    fn image_request(id: &str) -> AssetRequest {
        AssetRequest {
            id: AssetId::from(id),
            kind: AssetKind::Image,
            prompt: format!("interior illustration for {id}"),
            config: RenderConfig::new("1:1", "1K"),
        }
    }

    fn png_payload() -> MediaPayload {
        MediaPayload::new(vec![137, 80, 78, 71], "image/png")
    }

    struct Fixture {
        backend: Arc<ScriptedBackend>,
        host: Arc<RecordingCredentialHost>,
        store: SlotStore,
        coordinator: BatchCoordinator,
    }

    fn fixture_with(host: RecordingCredentialHost) -> Fixture {
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        fixture_with_parts(host, clock)
    }

    fn fixture_with_parts(host: RecordingCredentialHost, clock: Arc<dyn Clock>) -> Fixture {
        let backend = Arc::new(ScriptedBackend::new());
        let host = Arc::new(host);
        let gate = Arc::new(CredentialGate::new(
            Arc::clone(&host) as Arc<dyn CredentialHost>
        ));
        let store = SlotStore::new(Arc::clone(&clock));
        let runner = Arc::new(JobRunner::new(
            store.clone(),
            Arc::clone(&gate),
            Arc::clone(&backend) as Arc<dyn GenerationBackend>,
            clock,
            Arc::new(InstantDelay::new()),
            Arc::new(Mutex::new(ZeroRandom)),
            PollPolicy::default(),
        ));
        let coordinator = BatchCoordinator::new(runner, gate, store.clone());
        Fixture {
            backend,
            host,
            store,
            coordinator,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingCredentialHost::selected())
    }

    fn report_of(outcome: BatchOutcome) -> BatchReport {
        match outcome {
            BatchOutcome::Completed { report } => report,
            BatchOutcome::AlreadyRunning => panic!("expected the batch to run"),
        }
    }

    #[tokio::test]
    async fn test_batch_runs_in_order_and_isolates_failures() {
        // Arrange: the middle request fails, its neighbors succeed. The
        // stepping clock makes sequential execution visible in the stamps.
        let clock = Arc::new(SteppingClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            TimeDelta::seconds(1),
        ));
        let fx = fixture_with_parts(RecordingCredentialHost::selected(), clock);
        let requests = [
            image_request("ch1"),
            image_request("ch2"),
            image_request("ch3"),
        ];
        fx.backend.script_image(Ok(png_payload()));
        fx.backend
            .script_image(Err(BackendError::api_with_status("model overloaded", 500)));
        fx.backend.script_image(Ok(png_payload()));

        // Act
        let outcome = fx
            .coordinator
            .run_batch(&requests, &CancelToken::new())
            .await;

        // Assert
        let report = report_of(outcome);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.remaining, 0);

        let prompts: Vec<String> = fx
            .backend
            .recorded_calls()
            .into_iter()
            .map(|call| match call {
                BackendCall::GenerateImage { prompt } => prompt,
                other => panic!("unexpected backend call: {other:?}"),
            })
            .collect();
        assert_eq!(
            prompts,
            vec![
                requests[0].prompt.clone(),
                requests[1].prompt.clone(),
                requests[2].prompt.clone(),
            ]
        );

        let first = fx.store.get(&requests[0].id);
        let second = fx.store.get(&requests[1].id);
        let third = fx.store.get(&requests[2].id);
        assert_eq!(first.phase, JobPhase::Succeeded);
        assert_eq!(second.phase, JobPhase::Failed);
        assert_eq!(third.phase, JobPhase::Succeeded);
        // Each item resolves before the next one starts.
        assert!(first.updated_at < second.updated_at);
        assert!(second.updated_at < third.updated_at);
    }

    #[tokio::test]
    async fn test_batch_skips_slots_that_already_hold_an_artifact() {
        // Arrange: first batch fills every slot.
        let fx = fixture();
        let requests = [image_request("ch1"), image_request("ch2")];
        fx.backend.script_image(Ok(png_payload()));
        fx.backend.script_image(Ok(png_payload()));
        report_of(
            fx.coordinator
                .run_batch(&requests, &CancelToken::new())
                .await,
        );
        let calls_after_first = fx.backend.recorded_calls().len();

        // Act
        let outcome = fx
            .coordinator
            .run_batch(&requests, &CancelToken::new())
            .await;

        // Assert: nothing was regenerated.
        let report = report_of(outcome);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.succeeded, 0);
        assert_eq!(fx.backend.recorded_calls().len(), calls_after_first);
    }

    #[tokio::test]
    async fn test_batch_retries_failed_slots_on_the_next_run() {
        // Arrange: ch1 fails in the first batch.
        let fx = fixture();
        let requests = [image_request("ch1")];
        fx.backend
            .script_image(Err(BackendError::Transport("connection reset".into())));
        report_of(
            fx.coordinator
                .run_batch(&requests, &CancelToken::new())
                .await,
        );
        fx.backend.script_image(Ok(png_payload()));

        // Act
        let report = report_of(
            fx.coordinator
                .run_batch(&requests, &CancelToken::new())
                .await,
        );

        // Assert: failed slots are not cached.
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(fx.store.get(&requests[0].id).phase, JobPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_second_concurrent_batch_is_rejected() {
        // Arrange: the credential prompt yields, letting the second batch
        // start while the first is suspended inside it.
        let fx = fixture_with(RecordingCredentialHost::selects_on_open().with_yield_rounds(4));
        let requests = [image_request("ch1")];
        fx.backend.script_image(Ok(png_payload()));

        // Act
        let first_cancel = CancelToken::new();
        let second_cancel = CancelToken::new();
        let (first, second) = tokio::join!(
            fx.coordinator.run_batch(&requests, &first_cancel),
            fx.coordinator.run_batch(&requests, &second_cancel),
        );

        // Assert
        assert_eq!(second, BatchOutcome::AlreadyRunning);
        assert_eq!(report_of(first).succeeded, 1);
        assert!(!fx.coordinator.is_running());
        assert_eq!(fx.host.open_count(), 1);
        // The rejected batch reached neither the host nor the backend.
        assert_eq!(fx.backend.recorded_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_prompts_for_the_credential_once() {
        // Arrange
        let fx = fixture_with(RecordingCredentialHost::selects_on_open());
        let requests = [image_request("ch1"), image_request("ch2")];
        fx.backend.script_image(Ok(png_payload()));
        fx.backend.script_image(Ok(png_payload()));

        // Act
        let report = report_of(
            fx.coordinator
                .run_batch(&requests, &CancelToken::new())
                .await,
        );

        // Assert: per-job credential checks reuse the up-front selection.
        assert_eq!(report.succeeded, 2);
        assert_eq!(fx.host.open_count(), 1);
    }

    #[tokio::test]
    async fn test_precancelled_batch_starts_nothing() {
        // Arrange
        let fx = fixture();
        let requests = [image_request("ch1"), image_request("ch2")];
        let cancel = CancelToken::new();
        cancel.cancel();

        // Act
        let report = report_of(fx.coordinator.run_batch(&requests, &cancel).await);

        // Assert: no slot was even created.
        assert_eq!(report.remaining, 2);
        assert!(fx.backend.recorded_calls().is_empty());
        assert!(fx.store.peek(&requests[0].id).is_none());
        assert!(fx.store.peek(&requests[1].id).is_none());
    }

    /// Delegating backend that cancels the shared token as a side effect of
    /// serving the first image call.
    struct CancellingBackend {
        inner: Arc<ScriptedBackend>,
        cancel: CancelToken,
    }

    #[async_trait::async_trait]
    impl GenerationBackend for CancellingBackend {
        async fn generate_image(
            &self,
            prompt: &str,
            config: &RenderConfig,
        ) -> Result<MediaPayload, BackendError> {
            self.cancel.cancel();
            self.inner.generate_image(prompt, config).await
        }

        async fn submit_video(
            &self,
            prompt: &str,
            config: &RenderConfig,
        ) -> Result<OperationHandle, BackendError> {
            self.inner.submit_video(prompt, config).await
        }

        async fn poll_video(
            &self,
            handle: &OperationHandle,
        ) -> Result<OperationHandle, BackendError> {
            self.inner.poll_video(handle).await
        }

        async fn download(&self, uri: &str) -> Result<MediaPayload, BackendError> {
            self.inner.download(uri).await
        }
    }

    #[tokio::test]
    async fn test_cancellation_mid_batch_stops_the_remaining_items() {
        // Arrange: the first job completes but cancels the token on the
        // way, so scheduling stops before the second item.
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        let scripted = Arc::new(ScriptedBackend::new());
        scripted.script_image(Ok(png_payload()));
        let cancel = CancelToken::new();
        let backend = Arc::new(CancellingBackend {
            inner: Arc::clone(&scripted),
            cancel: cancel.clone(),
        });
        let host = Arc::new(RecordingCredentialHost::selected());
        let gate = Arc::new(CredentialGate::new(
            Arc::clone(&host) as Arc<dyn CredentialHost>
        ));
        let store = SlotStore::new(Arc::clone(&clock));
        let runner = Arc::new(JobRunner::new(
            store.clone(),
            Arc::clone(&gate),
            Arc::clone(&backend) as Arc<dyn GenerationBackend>,
            clock,
            Arc::new(InstantDelay::new()) as Arc<dyn Delay>,
            Arc::new(Mutex::new(ZeroRandom)),
            PollPolicy::default(),
        ));
        let coordinator = BatchCoordinator::new(runner, gate, store.clone());
        let requests = [
            image_request("ch1"),
            image_request("ch2"),
            image_request("ch3"),
        ];

        // Act
        let report = report_of(coordinator.run_batch(&requests, &cancel).await);

        // Assert
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(store.get(&requests[0].id).phase, JobPhase::Succeeded);
        assert!(store.peek(&requests[1].id).is_none());
        assert!(store.peek(&requests[2].id).is_none());
    }
}
