//! Shared helpers for integration tests.
//!
//! Builds in-memory state stores and seeds them through the same write
//! path the crawler uses, so tests exercise the real recording logic.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;

use crawl_pulse::models::{PageType, PerformanceEvent};
use crawl_pulse::storage::{
    discover_urls, ensure_site_cycle, observe_http_status, record_crawl, run_migrations,
};
use crawl_pulse::StatusEngine;

/// Creates an in-memory pool with migrations applied.
#[allow(dead_code)]
pub async fn create_test_pool() -> Arc<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Arc::new(pool)
}

/// Engine over the pool with a generous test timeout.
#[allow(dead_code)]
pub fn engine(pool: &Arc<SqlitePool>) -> StatusEngine {
    StatusEngine::new(Arc::clone(pool), Duration::from_secs(5))
}

/// A fixed reference instant: 2024-03-10 12:00:00 UTC (22:00 local).
#[allow(dead_code)]
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

/// Registers a site with a cycle record and a set of discovered URLs.
#[allow(dead_code)]
pub async fn seed_site(pool: &SqlitePool, site_id: &str, urls: &[&str], at: DateTime<Utc>) {
    ensure_site_cycle(pool, site_id, at)
        .await
        .expect("Failed to register site cycle");
    let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
    discover_urls(pool, site_id, &urls, at)
        .await
        .expect("Failed to register discovered URLs");
}

/// Completes a crawl of one URL: applies the HTTP outcome to the record
/// and appends the matching performance event.
#[allow(dead_code)]
pub async fn crawl_url(
    pool: &SqlitePool,
    site_id: &str,
    url: &str,
    http_status: u16,
    page_type: PageType,
    at: DateTime<Utc>,
) {
    observe_http_status(pool, site_id, url, http_status, at)
        .await
        .expect("Failed to apply HTTP observation");
    record_crawl(
        pool,
        &PerformanceEvent {
            site_id: site_id.to_string(),
            url: url.to_string(),
            timestamp: at,
            crawl_time_seconds: 1.5,
            page_type,
        },
    )
    .await
    .expect("Failed to record crawl event");
}
