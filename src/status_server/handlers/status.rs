//! JSON status handler.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use super::super::types::{ApiError, AppState};
use crate::engine::StatusSnapshot;

/// Live status snapshot for one site.
pub async fn status_handler(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    let snapshot = state.engine.get_status(&site_id, Utc::now()).await?;
    Ok(Json(snapshot))
}
