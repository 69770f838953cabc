//! JSON metrics handler.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use super::super::types::{ApiError, AppState};
use crate::engine::MetricsPanel;

/// Throughput and error metrics for one site.
pub async fn metrics_handler(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> Result<Json<MetricsPanel>, ApiError> {
    let panel = state.engine.get_metrics(&site_id, Utc::now()).await?;
    Ok(Json(panel))
}
