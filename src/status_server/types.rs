//! Status server shared state and error mapping.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::engine::StatusEngine;
use crate::error_handling::EngineError;

/// Shared state for the status server
#[derive(Clone)]
pub struct AppState {
    /// The snapshot engine all handlers read through.
    pub engine: Arc<StatusEngine>,
}

/// JSON body returned for failed requests.
#[derive(Serialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub error: String,
    /// Whether the client may retry the same request.
    pub retryable: bool,
}

/// HTTP-facing wrapper around [`EngineError`].
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidWindow(_) => StatusCode::BAD_REQUEST,
            EngineError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}
