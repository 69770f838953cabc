//! crawl_pulse library: crawl status and metrics aggregation
//!
//! This library turns a crawler's raw state (per-URL records, performance
//! events, day-keyed rollups, cycle descriptors) into ready-to-serve
//! snapshots: live status, throughput metrics, and daily/weekly reports.
//! It reads the same SQLite database the crawler writes and exposes the
//! snapshots over an HTTP status server.
//!
//! # Example
//!
//! ```no_run
//! use crawl_pulse::{Config, run_server};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     port: 8765,
//!     ..Default::default()
//! };
//! run_server(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod activity;
pub mod classify;
pub mod config;
pub mod engine;
mod error_handling;
pub mod initialization;
pub mod models;
pub mod progress;
pub mod rollup;
pub mod speed;
mod status_server;
pub mod storage;
pub mod window;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use engine::{CrawlReport, MetricsPanel, StatusEngine, StatusSnapshot};
pub use error_handling::{DatabaseError, EngineError, InitializationError};
pub use run::run_server;
pub use status_server::{build_router, start_status_server, AppState};
pub use window::ReportWindow;

// Internal run module (wires storage, engine, and server together)
mod run {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use log::info;

    use crate::config::Config;
    use crate::engine::StatusEngine;
    use crate::status_server::{start_status_server, AppState};
    use crate::storage::{init_db_pool_with_path, run_migrations};

    /// Opens the state store and serves snapshots until shut down.
    ///
    /// This is the main entry point for the binary. It initializes the
    /// connection pool, applies migrations, and runs the HTTP status
    /// server on the configured port.
    pub async fn run_server(config: Config) -> Result<()> {
        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to open the state database")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("State database ready at {}", config.db_path.display());

        let engine = StatusEngine::new(
            Arc::clone(&pool),
            Duration::from_secs(config.query_timeout_secs),
        );
        let state = AppState {
            engine: Arc::new(engine),
        };
        start_status_server(config.port, state)
            .await
            .context("Status server failed")?;
        Ok(())
    }
}
