//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for database setup and test data
//! creation used across storage module tests.

#[cfg(test)]
use chrono::{DateTime, Utc};
#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database for fast test execution.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Inserts a URL record with the given state and response fields.
#[cfg(test)]
pub async fn insert_test_url_record(
    pool: &SqlitePool,
    site_id: &str,
    url: &str,
    status: &str,
    last_http_status: Option<i64>,
    error_count: i64,
) {
    sqlx::query(
        "INSERT INTO url_records (site_id, url, status, last_http_status, error_count, first_seen_at_ms)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(site_id)
    .bind(url)
    .bind(status)
    .bind(last_http_status)
    .bind(error_count)
    .bind(1710028800000i64)
    .execute(pool)
    .await
    .expect("Failed to insert test URL record");
}

/// Inserts a performance event at the given instant.
#[cfg(test)]
pub async fn insert_test_event(
    pool: &SqlitePool,
    site_id: &str,
    url: &str,
    timestamp: DateTime<Utc>,
    page_type: &str,
) {
    sqlx::query(
        "INSERT INTO performance_events (site_id, url, timestamp_ms, crawl_time_seconds, page_type)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(site_id)
    .bind(url)
    .bind(timestamp.timestamp_millis())
    .bind(1.5f64)
    .bind(page_type)
    .execute(pool)
    .await
    .expect("Failed to insert test event");
}
