//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use backlot_catalog::CatalogError;
use backlot_core::asset::AssetId;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The bundled catalog failed to load or validate.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Request-level errors mapped onto HTTP responses.
///
/// Job failures are not errors at this layer: a finished run reports its
/// outcome with a 200 and the classified failure in the body. `ApiError`
/// covers the cases where no run happens at all.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The asset id is not part of the catalog.
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// No artifact is stored for the asset yet.
    #[error("no artifact is stored for asset: {0}")]
    ArtifactNotReady(AssetId),

    /// A batch run is already in flight.
    #[error("a batch run is already in flight")]
    BatchAlreadyRunning,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::UnknownAsset(_) => (StatusCode::NOT_FOUND, "unknown_asset"),
            Self::ArtifactNotReady(_) => (StatusCode::NOT_FOUND, "artifact_not_ready"),
            Self::BatchAlreadyRunning => (StatusCode::CONFLICT, "batch_already_running"),
        };

        let body = ErrorBody {
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
