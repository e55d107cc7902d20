//! Routes for asset slots and generation triggers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use backlot_core::asset::AssetId;
use backlot_core::cancel::CancelToken;
use backlot_orchestrator::application::batch::{BatchOutcome, BatchReport};
use backlot_orchestrator::domain::outcome::{FailureKind, JobOutcome};
use backlot_orchestrator::domain::phase::JobPhase;
use backlot_orchestrator::domain::slot::AssetSlot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Wire snapshot of one asset slot.
#[derive(Debug, Serialize)]
pub struct SlotResponse {
    /// Asset identifier.
    pub id: AssetId,
    /// Current lifecycle phase.
    pub phase: JobPhase,
    /// Progress phrase, present only while a job runs.
    pub narration: Option<String>,
    /// Stored artifact metadata. Bytes are served by the artifact endpoint.
    pub artifact: Option<ArtifactResponse>,
    /// Classified error from the last failed run.
    pub error: Option<SlotErrorResponse>,
    /// When the slot last changed.
    pub updated_at: DateTime<Utc>,
}

/// Artifact metadata without the payload bytes.
#[derive(Debug, Serialize)]
pub struct ArtifactResponse {
    /// MIME type of the stored bytes.
    pub mime_type: String,
    /// Payload size in bytes.
    pub size_bytes: usize,
    /// Provider URI the payload came from, when one exists.
    pub source_uri: Option<String>,
}

/// Classified error stored on a slot.
#[derive(Debug, Serialize)]
pub struct SlotErrorResponse {
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable description.
    pub message: String,
}

impl From<AssetSlot> for SlotResponse {
    fn from(slot: AssetSlot) -> Self {
        Self {
            id: slot.id,
            phase: slot.phase,
            narration: slot.narration,
            artifact: slot.artifact.map(|artifact| ArtifactResponse {
                size_bytes: artifact.bytes.len(),
                mime_type: artifact.mime_type,
                source_uri: artifact.source_uri,
            }),
            error: slot.error.map(|error| SlotErrorResponse {
                kind: error.kind,
                message: error.message,
            }),
            updated_at: slot.updated_at,
        }
    }
}

/// Response body for generation triggers.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Whether the run produced an artifact.
    pub ok: bool,
    /// Failure classification when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    /// Failure description when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Slot snapshot after the run.
    pub slot: SlotResponse,
}

impl GenerateResponse {
    fn from_outcome(outcome: JobOutcome, slot: AssetSlot) -> Self {
        match outcome {
            JobOutcome::Completed { .. } => Self {
                ok: true,
                error_kind: None,
                message: None,
                slot: slot.into(),
            },
            JobOutcome::Failed { kind, message } => Self {
                ok: false,
                error_kind: Some(kind),
                message: Some(message),
                slot: slot.into(),
            },
        }
    }
}

/// Response body for POST /generate-all.
#[derive(Debug, Serialize)]
pub struct BatchRunResponse {
    /// Summary counts for the finished run.
    pub report: BatchReport,
}

fn known_id(state: &AppState, raw: &str) -> Result<AssetId, ApiError> {
    let id = AssetId::new(raw);
    if state.catalog.contains(&id) {
        Ok(id)
    } else {
        Err(ApiError::UnknownAsset(id))
    }
}

/// GET /
async fn list_assets(State(state): State<AppState>) -> Json<Vec<SlotResponse>> {
    let slots = state
        .catalog
        .requests()
        .iter()
        .map(|request| state.store.get(&request.id).into())
        .collect();
    Json(slots)
}

/// GET /{id}
#[instrument(skip(state), fields(asset_id = %id))]
async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SlotResponse>, ApiError> {
    let id = known_id(&state, &id)?;
    Ok(Json(state.store.get(&id).into()))
}

/// GET /{id}/artifact
#[instrument(skip(state), fields(asset_id = %id))]
async fn get_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = known_id(&state, &id)?;
    let artifact = state
        .store
        .peek(&id)
        .and_then(|slot| slot.artifact)
        .ok_or_else(|| ApiError::ArtifactNotReady(id))?;

    Ok(([(header::CONTENT_TYPE, artifact.mime_type)], artifact.bytes).into_response())
}

/// POST /{id}/generate
#[instrument(skip(state), fields(asset_id = %id))]
async fn generate_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let id = known_id(&state, &id)?;
    let request = state
        .catalog
        .request_for(&id)
        .ok_or_else(|| ApiError::UnknownAsset(id.clone()))?;

    info!(asset_id = %id, "handling generate request");

    let outcome = state.runner.run_job(&request, &CancelToken::new()).await;
    let slot = state.store.get(&id);

    Ok(Json(GenerateResponse::from_outcome(outcome, slot)))
}

/// POST /generate-all
#[instrument(skip(state))]
async fn generate_all(State(state): State<AppState>) -> Result<Json<BatchRunResponse>, ApiError> {
    let requests = state.catalog.illustration_requests();

    info!(count = requests.len(), "handling generate-all request");

    match state
        .coordinator
        .run_batch(&requests, &CancelToken::new())
        .await
    {
        BatchOutcome::Completed { report } => Ok(Json(BatchRunResponse { report })),
        BatchOutcome::AlreadyRunning => Err(ApiError::BatchAlreadyRunning),
    }
}

/// POST /{id}/reset
#[instrument(skip(state), fields(asset_id = %id))]
async fn reset_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SlotResponse>, ApiError> {
    let id = known_id(&state, &id)?;
    state.store.reset(&id);

    info!(asset_id = %id, "slot reset");

    Ok(Json(state.store.get(&id).into()))
}

/// Returns the router for asset slots and generation triggers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets))
        .route("/generate-all", post(generate_all))
        .route("/{id}", get(get_asset))
        .route("/{id}/artifact", get(get_artifact))
        .route("/{id}/generate", post(generate_asset))
        .route("/{id}/reset", post(reset_asset))
}
