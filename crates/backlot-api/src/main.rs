//! Backlot API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use backlot_api::error::AppError;
use backlot_api::fixture::{FixtureBackend, FixtureCredentialHost};
use backlot_api::routes;
use backlot_api::state::AppState;
use backlot_catalog::Catalog;
use backlot_core::rng::{RandomSource, ThreadRandom};
use backlot_core::time::{Clock, SystemClock, TokioDelay};
use backlot_orchestrator::application::batch::BatchCoordinator;
use backlot_orchestrator::application::credential_gate::CredentialGate;
use backlot_orchestrator::application::job_runner::{JobRunner, PollPolicy};
use backlot_orchestrator::application::store::SlotStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Backlot API server");

    // Read configuration from environment.
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
    let policy = PollPolicy {
        interval: Duration::from_secs(env_secs("BACKLOT_POLL_INTERVAL_SECS", 10)?),
        budget: Duration::from_secs(env_secs("BACKLOT_POLL_BUDGET_SECS", 600)?),
    };

    // Build application state.
    // TODO: Swap in a provider-backed GenerationBackend adapter when one lands.
    let catalog = Arc::new(Catalog::bundled()?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = SlotStore::new(clock.clone());
    let gate = Arc::new(CredentialGate::new(Arc::new(FixtureCredentialHost)));
    let rng: Arc<Mutex<dyn RandomSource>> = Arc::new(Mutex::new(ThreadRandom));
    let runner = Arc::new(JobRunner::new(
        store.clone(),
        gate.clone(),
        Arc::new(FixtureBackend::new()),
        clock,
        Arc::new(TokioDelay),
        rng,
        policy,
    ));
    let coordinator = Arc::new(BatchCoordinator::new(runner.clone(), gate, store.clone()));
    let app_state = AppState::new(catalog, store, runner, coordinator);

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/assets", routes::assets::router())
        .nest("/api/v1/batch", routes::batch::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

fn env_secs(name: &str, default: u64) -> Result<u64, AppError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|e| {
            AppError::Config(format!("{name} must be a whole number of seconds: {e}"))
        }),
        Err(_) => Ok(default),
    }
}
