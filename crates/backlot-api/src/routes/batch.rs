//! Batch status endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Response body for GET /api/v1/batch.
#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    /// Whether a generate-all run is currently in flight.
    pub running: bool,
}

/// GET /
async fn batch_status(State(state): State<AppState>) -> Json<BatchStatusResponse> {
    Json(BatchStatusResponse {
        running: state.coordinator.is_running(),
    })
}

/// Returns the batch status router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(batch_status))
}
