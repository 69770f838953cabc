//! Read-side queries over the crawler's state store.
//!
//! Every query here is site-scoped and side-effect free. Counting queries
//! push the filtering into SQL; the status predicates are the shared
//! constants from [`crate::classify`] so bulk counts and per-record labels
//! agree by construction. Instant ranges are half-open `[start, end)`.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::classify::{CHANGED_SQL, DELETED_SQL, FAILED_SQL};
use crate::models::{
    CrawlState, DailyRollup, DailyStats, PageChange, PageType, PerformanceEvent, SiteCycle,
    UrlRecord,
};
use crate::window::ms_to_utc;

fn decode_err(e: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<UrlRecord, sqlx::Error> {
    let state: String = row.get("status");
    let last_change = match row.get::<Option<i64>, _>("last_change_at_ms") {
        Some(ms) => Some(PageChange {
            at: ms_to_utc(ms),
            details: row
                .get::<Option<String>, _>("last_change_details")
                .unwrap_or_default(),
        }),
        None => None,
    };
    Ok(UrlRecord {
        site_id: row.get("site_id"),
        url: row.get("url"),
        state: state.parse::<CrawlState>().map_err(decode_err)?,
        // A status outside the u16 range can only come from a corrupt row;
        // degrade it to "no status" rather than inventing one.
        last_http_status: row
            .get::<Option<i64>, _>("last_http_status")
            .and_then(|s| u16::try_from(s).ok()),
        last_success_at: row.get::<Option<i64>, _>("last_success_at_ms").map(ms_to_utc),
        error_count: row.get::<i64, _>("error_count") as u32,
        first_seen_at: ms_to_utc(row.get("first_seen_at_ms")),
        last_crawled_at: row.get::<Option<i64>, _>("last_crawled_at_ms").map(ms_to_utc),
        last_change,
    })
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<PerformanceEvent, sqlx::Error> {
    let page_type: String = row.get("page_type");
    Ok(PerformanceEvent {
        site_id: row.get("site_id"),
        url: row.get("url"),
        timestamp: ms_to_utc(row.get("timestamp_ms")),
        crawl_time_seconds: row.get("crawl_time_seconds"),
        page_type: page_type.parse::<PageType>().map_err(decode_err)?,
    })
}

fn row_to_rollup(row: &sqlx::sqlite::SqliteRow) -> DailyRollup {
    DailyRollup {
        site_id: row.get("site_id"),
        date: row.get("date"),
        stats: DailyStats {
            pages_crawled: row.get("pages_crawled"),
            new_pages: row.get("new_pages"),
            changed_pages: row.get("changed_pages"),
            failed_pages: row.get("failed_pages"),
            deleted_pages: row.get("deleted_pages"),
            document_pages: row.get("document_pages"),
            total_time_seconds: row.get("total_time_seconds"),
        },
    }
}

/// Counts all URL records for a site.
pub async fn count_url_records(pool: &SqlitePool, site_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM url_records WHERE site_id = ?")
        .bind(site_id)
        .fetch_one(pool)
        .await
}

/// Counts URL records in one lifecycle state.
pub async fn count_urls_in_state(
    pool: &SqlitePool,
    site_id: &str,
    state: CrawlState,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM url_records WHERE site_id = ? AND status = ?")
        .bind(site_id)
        .bind(state.to_string())
        .fetch_one(pool)
        .await
}

/// Counts URLs whose most recent response was an error.
pub async fn count_failed_urls(pool: &SqlitePool, site_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM url_records WHERE site_id = ? AND {FAILED_SQL}"
    ))
    .bind(site_id)
    .fetch_one(pool)
    .await
}

/// Counts URLs confirmed as deleted. Always a subset of the failed count.
pub async fn count_deleted_urls(pool: &SqlitePool, site_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM url_records WHERE site_id = ? AND {DELETED_SQL}"
    ))
    .bind(site_id)
    .fetch_one(pool)
    .await
}

/// Counts URLs with at least one detected content change.
pub async fn count_changed_urls(pool: &SqlitePool, site_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM url_records WHERE site_id = ? AND {CHANGED_SQL}"
    ))
    .bind(site_id)
    .fetch_one(pool)
    .await
}

/// Counts URLs first discovered within `[start, end)`.
pub async fn count_discovered_between(
    pool: &SqlitePool,
    site_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM url_records
         WHERE site_id = ? AND first_seen_at_ms >= ? AND first_seen_at_ms < ?",
    )
    .bind(site_id)
    .bind(start.timestamp_millis())
    .bind(end.timestamp_millis())
    .fetch_one(pool)
    .await
}

/// Counts URLs whose last detected change fell within `[start, end)`.
pub async fn count_changed_between(
    pool: &SqlitePool,
    site_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM url_records
         WHERE site_id = ? AND last_change_at_ms >= ? AND last_change_at_ms < ?",
    )
    .bind(site_id)
    .bind(start.timestamp_millis())
    .bind(end.timestamp_millis())
    .fetch_one(pool)
    .await
}

/// Fetches one URL record, if tracked.
pub async fn fetch_url_record(
    pool: &SqlitePool,
    site_id: &str,
    url: &str,
) -> Result<Option<UrlRecord>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM url_records WHERE site_id = ? AND url = ?")
        .bind(site_id)
        .bind(url)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(row_to_record).transpose()
}

/// Fetches a site's cycle descriptor, if the site is tracked.
pub async fn fetch_site_cycle(
    pool: &SqlitePool,
    site_id: &str,
) -> Result<Option<SiteCycle>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT site_id, cycle_number, is_first_cycle, cycle_started_at_ms
         FROM site_cycles WHERE site_id = ?",
    )
    .bind(site_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|row| SiteCycle {
        site_id: row.get("site_id"),
        cycle_number: row.get("cycle_number"),
        is_first_cycle: row.get::<i64, _>("is_first_cycle") != 0,
        cycle_started_at: ms_to_utc(row.get("cycle_started_at_ms")),
    }))
}

/// Fetches the most recent events for a site, newest first.
pub async fn fetch_recent_events(
    pool: &SqlitePool,
    site_id: &str,
    limit: i64,
) -> Result<Vec<PerformanceEvent>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT site_id, url, timestamp_ms, crawl_time_seconds, page_type
         FROM performance_events WHERE site_id = ?
         ORDER BY timestamp_ms DESC LIMIT ?",
    )
    .bind(site_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_event).collect()
}

/// Timestamp of a site's earliest event, if any exist.
pub async fn earliest_event_at(
    pool: &SqlitePool,
    site_id: &str,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let ms: Option<i64> =
        sqlx::query_scalar("SELECT MIN(timestamp_ms) FROM performance_events WHERE site_id = ?")
            .bind(site_id)
            .fetch_one(pool)
            .await?;
    Ok(ms.map(ms_to_utc))
}

/// Counts events within `[start, end)`.
pub async fn count_events_between(
    pool: &SqlitePool,
    site_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM performance_events
         WHERE site_id = ? AND timestamp_ms >= ? AND timestamp_ms < ?",
    )
    .bind(site_id)
    .bind(start.timestamp_millis())
    .bind(end.timestamp_millis())
    .fetch_one(pool)
    .await
}

/// Counts events of one outcome type within `[start, end)`.
pub async fn count_events_of_type_between(
    pool: &SqlitePool,
    site_id: &str,
    page_type: PageType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM performance_events
         WHERE site_id = ? AND page_type = ? AND timestamp_ms >= ? AND timestamp_ms < ?",
    )
    .bind(site_id)
    .bind(page_type.to_string())
    .bind(start.timestamp_millis())
    .bind(end.timestamp_millis())
    .fetch_one(pool)
    .await
}

/// Fetches all events within `[start, end)`, oldest first.
pub async fn fetch_events_between(
    pool: &SqlitePool,
    site_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<PerformanceEvent>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT site_id, url, timestamp_ms, crawl_time_seconds, page_type
         FROM performance_events
         WHERE site_id = ? AND timestamp_ms >= ? AND timestamp_ms < ?
         ORDER BY timestamp_ms ASC",
    )
    .bind(site_id)
    .bind(start.timestamp_millis())
    .bind(end.timestamp_millis())
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_event).collect()
}

/// URLs of deletion events within `[start, end)`, deduplicated.
pub async fn deleted_event_urls_between(
    pool: &SqlitePool,
    site_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT url FROM performance_events
         WHERE site_id = ? AND page_type = ? AND timestamp_ms >= ? AND timestamp_ms < ?",
    )
    .bind(site_id)
    .bind(PageType::Deleted.to_string())
    .bind(start.timestamp_millis())
    .bind(end.timestamp_millis())
    .fetch_all(pool)
    .await
}

/// Fetches one day's rollup, if any crawl was recorded that day.
pub async fn fetch_daily_rollup(
    pool: &SqlitePool,
    site_id: &str,
    date: &str,
) -> Result<Option<DailyRollup>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM daily_rollups WHERE site_id = ? AND date = ?")
        .bind(site_id)
        .bind(date)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(row_to_rollup))
}

/// Fetches the rollups for a set of day keys, ordered by day. Days with no
/// recorded activity are simply absent from the result.
pub async fn fetch_daily_rollups(
    pool: &SqlitePool,
    site_id: &str,
    dates: &[String],
) -> Result<Vec<DailyRollup>, sqlx::Error> {
    if dates.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM daily_rollups WHERE site_id = ");
    builder.push_bind(site_id);
    builder.push(" AND date IN (");
    let mut separated = builder.separated(", ");
    for date in dates {
        separated.push_bind(date);
    }
    separated.push_unseparated(") ORDER BY date ASC");
    let rows = builder.build().fetch_all(pool).await?;
    Ok(rows.iter().map(row_to_rollup).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::storage::test_helpers::{
        create_test_pool, insert_test_event, insert_test_url_record,
    };

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn test_state_and_predicate_counts() {
        let pool = create_test_pool().await;
        insert_test_url_record(&pool, "example.com", "https://example.com/a", "visited", Some(200), 0)
            .await;
        insert_test_url_record(&pool, "example.com", "https://example.com/b", "visited", Some(500), 1)
            .await;
        insert_test_url_record(&pool, "example.com", "https://example.com/c", "visited", Some(404), 3)
            .await;
        insert_test_url_record(&pool, "example.com", "https://example.com/d", "remaining", None, 0)
            .await;
        // Another site's records must not leak into the counts.
        insert_test_url_record(&pool, "other.com", "https://other.com/x", "visited", Some(404), 5)
            .await;

        assert_eq!(count_url_records(&pool, "example.com").await.unwrap(), 4);
        assert_eq!(
            count_urls_in_state(&pool, "example.com", CrawlState::Visited)
                .await
                .unwrap(),
            3
        );
        assert_eq!(count_failed_urls(&pool, "example.com").await.unwrap(), 2);
        assert_eq!(count_deleted_urls(&pool, "example.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_event_queries_respect_half_open_ranges() {
        let pool = create_test_pool().await;
        insert_test_event(&pool, "example.com", "https://example.com/a", at(10, 0), "normal").await;
        insert_test_event(&pool, "example.com", "https://example.com/b", at(11, 0), "failed").await;
        insert_test_event(&pool, "example.com", "https://example.com/c", at(12, 0), "normal").await;

        // End bound is exclusive: the 12:00 event is out.
        assert_eq!(
            count_events_between(&pool, "example.com", at(10, 0), at(12, 0))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            count_events_of_type_between(
                &pool,
                "example.com",
                PageType::Failed,
                at(10, 0),
                at(13, 0)
            )
            .await
            .unwrap(),
            1
        );
        assert_eq!(
            earliest_event_at(&pool, "example.com").await.unwrap(),
            Some(at(10, 0))
        );
        assert_eq!(earliest_event_at(&pool, "empty.com").await.unwrap(), None);

        let recent = fetch_recent_events(&pool, "example.com", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, at(12, 0));
    }

    #[tokio::test]
    async fn test_out_of_range_status_reads_as_no_status() {
        let pool = create_test_pool().await;
        insert_test_url_record(
            &pool,
            "example.com",
            "https://example.com/corrupt",
            "visited",
            Some(99_999),
            0,
        )
        .await;

        let record = fetch_url_record(&pool, "example.com", "https://example.com/corrupt")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.last_http_status, None);
    }

    #[tokio::test]
    async fn test_rollup_lookup_by_day_keys() {
        let pool = create_test_pool().await;
        sqlx::query(
            "INSERT INTO daily_rollups (site_id, date, pages_crawled, new_pages, changed_pages,
             failed_pages, deleted_pages, document_pages, total_time_seconds)
             VALUES ('example.com', '2024-03-10', 40, 5, 2, 1, 0, 3, 60.0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let days = vec!["2024-03-09".to_string(), "2024-03-10".to_string()];
        let rollups = fetch_daily_rollups(&pool, "example.com", &days).await.unwrap();
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].date, "2024-03-10");
        assert_eq!(rollups[0].stats.pages_crawled, 40);

        assert!(fetch_daily_rollups(&pool, "example.com", &[])
            .await
            .unwrap()
            .is_empty());
        assert!(fetch_daily_rollup(&pool, "example.com", "2024-03-09")
            .await
            .unwrap()
            .is_none());
    }
}
