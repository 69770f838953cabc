//! Data model for the aggregation engine.
//!
//! These types mirror the four storage entities the engine reads: per-URL
//! state records, append-only performance events, day-keyed rollups, and
//! per-site cycle descriptors. The engine never mutates them; the recorder
//! in [`crate::storage::record`] owns the write path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Stored lifecycle state of a tracked URL.
///
/// Exactly one state holds at any time. "Visited" means the URL completed at
/// least one crawl attempt, successful or not; error conditions are derived
/// predicates over [`UrlRecord`], never separate stored states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    /// Discovered but not yet claimed by a crawl worker.
    Remaining,
    /// Claimed by a crawl worker, attempt not yet completed.
    InProgress,
    /// At least one crawl attempt completed.
    Visited,
}

/// Outcome classification of a single crawl attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// First successful fetch of a newly discovered page.
    New,
    /// Content differed from the previous fetch.
    Changed,
    /// Attempt ended in an error response.
    Failed,
    /// Attempt confirmed the page as gone (404/410 pattern).
    Deleted,
    /// Routine re-fetch with no notable outcome.
    Normal,
}

/// A detected content change on a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageChange {
    /// When the change was detected.
    pub at: DateTime<Utc>,
    /// Free-form description of what changed.
    pub details: String,
}

/// One per discovered page per site; unique on `(site_id, url)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Owning site identifier (already normalized by the caller).
    pub site_id: String,
    /// The tracked URL.
    pub url: String,
    /// Stored lifecycle state.
    pub state: CrawlState,
    /// HTTP status of the most recent attempt, if any.
    pub last_http_status: Option<u16>,
    /// Most recent successful fetch, if any.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Consecutive error responses since the last success.
    pub error_count: u32,
    /// Set once at discovery, immutable afterwards.
    pub first_seen_at: DateTime<Utc>,
    /// Updated on every crawl attempt.
    pub last_crawled_at: Option<DateTime<Utc>>,
    /// Present only if a content diff was ever detected.
    pub last_change: Option<PageChange>,
}

/// One per completed crawl attempt, append-only and immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceEvent {
    /// Owning site identifier.
    pub site_id: String,
    /// URL that was crawled.
    pub url: String,
    /// When the attempt completed.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock processing time of the attempt.
    pub crawl_time_seconds: f64,
    /// Outcome classification of the attempt.
    pub page_type: PageType,
}

/// Counters accumulated for one reporting-timezone calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Crawl attempts completed.
    pub pages_crawled: i64,
    /// Newly discovered pages fetched for the first time.
    pub new_pages: i64,
    /// Pages whose content changed.
    pub changed_pages: i64,
    /// Attempts that ended in an error response.
    pub failed_pages: i64,
    /// Attempts that confirmed a page as gone.
    pub deleted_pages: i64,
    /// Crawled URLs whose path classifies as a document (pdf/office).
    pub document_pages: i64,
    /// Sum of per-attempt processing times.
    pub total_time_seconds: f64,
}

/// One per (site, reporting-timezone calendar day).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRollup {
    /// Owning site identifier.
    pub site_id: String,
    /// Calendar-day key ("YYYY-MM-DD") in the fixed reporting timezone.
    pub date: String,
    /// Accumulated counters for that day.
    pub stats: DailyStats,
}

/// Per-site crawl campaign descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCycle {
    /// Owning site identifier.
    pub site_id: String,
    /// 1-based campaign counter.
    pub cycle_number: i64,
    /// True while the site is in its first (discovery) cycle.
    pub is_first_cycle: bool,
    /// When the current cycle started.
    pub cycle_started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_state_round_trips_through_strings() {
        assert_eq!(CrawlState::InProgress.to_string(), "in_progress");
        assert_eq!(
            "in_progress".parse::<CrawlState>().unwrap(),
            CrawlState::InProgress
        );
        assert_eq!(
            "visited".parse::<CrawlState>().unwrap(),
            CrawlState::Visited
        );
        assert!("bogus".parse::<CrawlState>().is_err());
    }

    #[test]
    fn test_page_type_round_trips_through_strings() {
        for (s, t) in [
            ("new", PageType::New),
            ("changed", PageType::Changed),
            ("failed", PageType::Failed),
            ("deleted", PageType::Deleted),
            ("normal", PageType::Normal),
        ] {
            assert_eq!(t.to_string(), s);
            assert_eq!(s.parse::<PageType>().unwrap(), t);
        }
    }
}
