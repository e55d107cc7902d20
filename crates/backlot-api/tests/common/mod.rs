//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use backlot_catalog::Catalog;
use backlot_core::rng::RandomSource;
use backlot_core::time::Clock;
use backlot_orchestrator::application::batch::BatchCoordinator;
use backlot_orchestrator::application::credential_gate::CredentialGate;
use backlot_orchestrator::application::job_runner::{JobRunner, PollPolicy};
use backlot_orchestrator::application::store::SlotStore;
use backlot_test_support::{
    FixedClock, InstantDelay, RecordingCredentialHost, ScriptedBackend, ZeroRandom,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use backlot_api::routes;
use backlot_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 3, 1, 9, 0, 0).unwrap(),
    ))
}

/// The app router plus handles for scripting backend responses and
/// observing the credential host.
pub struct TestApp {
    pub app: Router,
    pub backend: Arc<ScriptedBackend>,
    pub host: Arc<RecordingCredentialHost>,
}

/// Build the full app router over a `ScriptedBackend` with deterministic
/// clock, delay, and random source. Uses the same route structure as
/// `main.rs`.
pub fn build_test_app() -> TestApp {
    build_test_app_with_host(RecordingCredentialHost::selected())
}

/// Build the full app with a custom credential host for tests that need to
/// observe or stall the selection flow.
pub fn build_test_app_with_host(host: RecordingCredentialHost) -> TestApp {
    let backend = Arc::new(ScriptedBackend::new());
    let host = Arc::new(host);
    let clock = fixed_clock();
    let store = SlotStore::new(clock.clone());
    let gate = Arc::new(CredentialGate::new(host.clone()));
    let rng: Arc<Mutex<dyn RandomSource>> = Arc::new(Mutex::new(ZeroRandom));
    let runner = Arc::new(JobRunner::new(
        store.clone(),
        gate.clone(),
        backend.clone(),
        clock,
        Arc::new(InstantDelay::new()),
        rng,
        PollPolicy::default(),
    ));
    let coordinator = Arc::new(BatchCoordinator::new(runner.clone(), gate, store.clone()));
    let catalog = Arc::new(Catalog::bundled().unwrap());
    let app_state = AppState::new(catalog, store, runner, coordinator);

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/assets", routes::assets::router())
        .nest("/api/v1/batch", routes::batch::router())
        .with_state(app_state);

    TestApp { app, backend, host }
}

/// Send a GET request and return the response as JSON.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a bodyless POST request and return the response as JSON.
pub async fn post_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return status, headers, and raw body bytes.
pub async fn get_bytes(app: Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, headers, body_bytes)
}
