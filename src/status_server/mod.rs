//! HTTP status server exposing crawl snapshots.
//!
//! Provides three per-site endpoints:
//! - `/sites/:site_id/status` - live status snapshot
//! - `/sites/:site_id/metrics` - throughput and error metrics
//! - `/sites/:site_id/report?window=daily|weekly` - consolidated report
//!
//! Handlers only read; the server can run next to an active crawler.

mod handlers;
mod types;

use axum::routing::get;
use axum::Router;

use handlers::{metrics_handler, report_handler, status_handler};
pub use types::{ApiError, AppState, ErrorBody};

/// Builds the application router. Split out from the server start so tests
/// can drive it without binding a port.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/sites/:site_id/status", get(status_handler))
        .route("/sites/:site_id/metrics", get(metrics_handler))
        .route("/sites/:site_id/report", get(report_handler))
        .with_state(state)
}

/// Creates and starts the status server
pub async fn start_status_server(port: u16, state: AppState) -> Result<(), anyhow::Error> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind status server to port {}: {}", port, e))?;

    log::info!("Status server listening on http://127.0.0.1:{}/", port);
    log::info!("  - Status: http://127.0.0.1:{}/sites/<site>/status", port);
    log::info!("  - Metrics: http://127.0.0.1:{}/sites/<site>/metrics", port);
    log::info!("  - Report: http://127.0.0.1:{}/sites/<site>/report", port);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Status server error: {}", e))?;

    Ok(())
}
