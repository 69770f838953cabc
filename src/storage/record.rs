//! Write path used by the crawler integration.
//!
//! The engine itself only reads; these recorders are how crawl outcomes
//! enter the store. Rollup counters are accumulated at write time, keyed by
//! the reporting-timezone day of the event, so report queries never have to
//! re-aggregate raw events.

use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqlitePool;

use crate::classify::deleted_predicate;
use crate::models::{PageType, PerformanceEvent};
use crate::rollup::is_document;
use crate::window::local_day_key;

/// Registers newly discovered URLs in the remaining state.
///
/// Already-known URLs are left untouched, so rediscovery during a later
/// cycle never resets `first_seen_at` or the lifecycle state.
pub async fn discover_urls(
    pool: &SqlitePool,
    site_id: &str,
    urls: &[String],
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for url in urls {
        sqlx::query(
            "INSERT OR IGNORE INTO url_records (site_id, url, status, first_seen_at_ms)
             VALUES (?, ?, 'remaining', ?)",
        )
        .bind(site_id)
        .bind(url)
        .bind(at.timestamp_millis())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    debug!("Registered {} discovered URLs for {site_id}", urls.len());
    Ok(())
}

/// Marks a URL as claimed by a crawl worker.
pub async fn mark_in_progress(
    pool: &SqlitePool,
    site_id: &str,
    url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE url_records SET status = 'in_progress' WHERE site_id = ? AND url = ?")
        .bind(site_id)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(())
}

/// Marks a URL as having completed at least one crawl attempt.
///
/// Usually implied by [`observe_http_status`]; useful on its own when a
/// worker finishes without an HTTP outcome to report.
pub async fn mark_visited(pool: &SqlitePool, site_id: &str, url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE url_records SET status = 'visited' WHERE site_id = ? AND url = ?")
        .bind(site_id)
        .bind(url)
        .execute(pool)
        .await?;
    Ok(())
}

/// Applies an observed HTTP response to a URL record.
///
/// A success resets the error streak and stamps the last success; an error
/// response extends the streak. Either way the record moves to the visited
/// state. Observing a URL that was never discovered registers it on the
/// spot.
///
/// Returns true when this observation is the one that tipped the record
/// into the deleted classification, so the caller can emit a deletion
/// event exactly once per disappearance.
pub async fn observe_http_status(
    pool: &SqlitePool,
    site_id: &str,
    url: &str,
    http_status: u16,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let previous: Option<(Option<i64>, i64)> = sqlx::query_as(
        "SELECT last_http_status, error_count FROM url_records WHERE site_id = ? AND url = ?",
    )
    .bind(site_id)
    .bind(url)
    .fetch_optional(&mut *tx)
    .await?;

    let (prev_status, prev_errors) = previous.unwrap_or((None, 0));
    let was_deleted = deleted_predicate(prev_status.map(|s| s as u16), prev_errors as u32);

    let success = http_status < 400;
    let error_count = if success { 0 } else { prev_errors + 1 };
    let at_ms = at.timestamp_millis();

    sqlx::query(
        "INSERT INTO url_records
             (site_id, url, status, last_http_status, last_success_at_ms, error_count,
              first_seen_at_ms, last_crawled_at_ms)
         VALUES (?, ?, 'visited', ?, ?, ?, ?, ?)
         ON CONFLICT(site_id, url) DO UPDATE SET
             status = 'visited',
             last_http_status = excluded.last_http_status,
             last_success_at_ms = COALESCE(excluded.last_success_at_ms, last_success_at_ms),
             error_count = excluded.error_count,
             last_crawled_at_ms = excluded.last_crawled_at_ms",
    )
    .bind(site_id)
    .bind(url)
    .bind(http_status as i64)
    .bind(success.then_some(at_ms))
    .bind(error_count)
    .bind(at_ms)
    .bind(at_ms)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    let now_deleted = deleted_predicate(Some(http_status), error_count as u32);
    Ok(now_deleted && !was_deleted)
}

/// Records a completed crawl attempt: appends the event and folds it into
/// the rollup of the reporting-timezone day it happened on.
pub async fn record_crawl(pool: &SqlitePool, event: &PerformanceEvent) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO performance_events (site_id, url, timestamp_ms, crawl_time_seconds, page_type)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&event.site_id)
    .bind(&event.url)
    .bind(event.timestamp.timestamp_millis())
    .bind(event.crawl_time_seconds)
    .bind(event.page_type.to_string())
    .execute(&mut *tx)
    .await?;

    let new_pages = i64::from(event.page_type == PageType::New);
    let changed_pages = i64::from(event.page_type == PageType::Changed);
    let failed_pages = i64::from(event.page_type == PageType::Failed);
    let deleted_pages = i64::from(event.page_type == PageType::Deleted);
    let document_pages = i64::from(is_document(&event.url));
    sqlx::query(
        "INSERT INTO daily_rollups
             (site_id, date, pages_crawled, new_pages, changed_pages, failed_pages,
              deleted_pages, document_pages, total_time_seconds)
         VALUES (?, ?, 1, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(site_id, date) DO UPDATE SET
             pages_crawled = pages_crawled + 1,
             new_pages = new_pages + excluded.new_pages,
             changed_pages = changed_pages + excluded.changed_pages,
             failed_pages = failed_pages + excluded.failed_pages,
             deleted_pages = deleted_pages + excluded.deleted_pages,
             document_pages = document_pages + excluded.document_pages,
             total_time_seconds = total_time_seconds + excluded.total_time_seconds",
    )
    .bind(&event.site_id)
    .bind(local_day_key(event.timestamp))
    .bind(new_pages)
    .bind(changed_pages)
    .bind(failed_pages)
    .bind(deleted_pages)
    .bind(document_pages)
    .bind(event.crawl_time_seconds)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Stamps a detected content change on a URL record.
pub async fn record_change(
    pool: &SqlitePool,
    site_id: &str,
    url: &str,
    at: DateTime<Utc>,
    details: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE url_records SET last_change_at_ms = ?, last_change_details = ?
         WHERE site_id = ? AND url = ?",
    )
    .bind(at.timestamp_millis())
    .bind(details)
    .bind(site_id)
    .bind(url)
    .execute(pool)
    .await?;
    Ok(())
}

/// Registers a site's cycle descriptor if it doesn't exist yet.
///
/// First registration starts cycle 1 in the discovery phase; repeated calls
/// are no-ops.
pub async fn ensure_site_cycle(
    pool: &SqlitePool,
    site_id: &str,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO site_cycles (site_id, cycle_number, is_first_cycle, cycle_started_at_ms)
         VALUES (?, 1, 1, ?)",
    )
    .bind(site_id)
    .bind(at.timestamp_millis())
    .execute(pool)
    .await?;
    Ok(())
}

/// Closes the current cycle and starts the next one.
///
/// Any cycle after the first runs in the maintenance phase.
pub async fn complete_cycle(
    pool: &SqlitePool,
    site_id: &str,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO site_cycles (site_id, cycle_number, is_first_cycle, cycle_started_at_ms)
         VALUES (?, 2, 0, ?)
         ON CONFLICT(site_id) DO UPDATE SET
             cycle_number = cycle_number + 1,
             is_first_cycle = 0,
             cycle_started_at_ms = excluded.cycle_started_at_ms",
    )
    .bind(site_id)
    .bind(at.timestamp_millis())
    .execute(pool)
    .await?;
    Ok(())
}
