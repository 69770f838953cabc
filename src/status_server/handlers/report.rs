//! JSON report handler.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::super::types::{ApiError, AppState};
use crate::engine::CrawlReport;
use crate::window::ReportWindow;

/// Query parameters for the report endpoint.
#[derive(Deserialize)]
pub struct ReportParams {
    /// "daily" (default) or "weekly".
    window: Option<String>,
}

/// Consolidated report for one site.
pub async fn report_handler(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    Query(params): Query<ReportParams>,
) -> Result<Json<CrawlReport>, ApiError> {
    let window = match params.window.as_deref() {
        Some(raw) => raw.parse::<ReportWindow>()?,
        None => ReportWindow::Daily,
    };
    let report = state.engine.get_report(&site_id, window, Utc::now()).await?;
    Ok(Json(report))
}
