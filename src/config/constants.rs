//! Configuration constants.
//!
//! All tuning parameters of the aggregation engine live here so that the
//! computation modules stay free of magic numbers and every call site agrees
//! on the same values.

use std::time::Duration;

/// Default SQLite database path (shared with the crawler that writes it).
pub const DB_PATH: &str = "./crawl_pulse.db";

/// Default port for the HTTP status server.
pub const DEFAULT_STATUS_PORT: u16 = 8765;

/// Default upper bound on a single snapshot's storage queries.
/// On expiry the request fails with a retryable error instead of hanging.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// UTC offset of the fixed reporting timezone, in seconds (UTC+10).
/// Daily rollups are keyed by calendar days in this timezone.
pub const REPORTING_UTC_OFFSET_SECS: i32 = 10 * 3600;

// Activity detection
/// Look-back window for the "actively crawling" check, in seconds.
/// Longer than typical inter-page delay, short enough to reflect "live".
pub const ACTIVITY_WINDOW_SECS: i64 = 600;
/// How many of the most recent events to fetch for the activity check.
/// One inside the window is enough; fetching more wastes I/O.
pub const RECENT_EVENT_FETCH_LIMIT: i64 = 20;

// Speed estimation
/// Cap of the adaptive throughput window, in seconds (5 hours).
/// A long-running site gets a stable trailing window of this length.
pub const SPEED_WINDOW_CAP_SECS: i64 = 5 * 3600;
/// Floor of the adaptive throughput window, in seconds (6 minutes).
/// Keeps the divisor sane for a site that only just started crawling.
pub const SPEED_WINDOW_FLOOR_SECS: i64 = 360;
/// Shortest inter-event gap accepted by the interval-based estimator, in
/// seconds. Gaps below this are duplicate-timestamp noise.
pub const INTERVAL_MIN_SECS: i64 = 10;
/// Longest inter-event gap accepted by the interval-based estimator, in
/// seconds. Gaps above this are idle periods, not processing time.
pub const INTERVAL_MAX_SECS: i64 = 600;

// Progress & ETA
/// Conservative throughput assumed when no speed estimate is available but
/// unfinished work exists, in pages/hour. Keeps the ETA computable.
pub const FALLBACK_PAGES_PER_HOUR: f64 = 300.0;

// Metrics panel
/// Span of the hourly speed-trend series, in hours.
pub const SPEED_TREND_HOURS: i64 = 24;
/// Number of local calendar days covered by the weekly report.
pub const REPORT_WEEK_DAYS: i64 = 7;

// Throughput grade thresholds, in pages/hour.
/// At or above this, throughput grades as excellent.
pub const GRADE_EXCELLENT_PAGES_PER_HOUR: f64 = 300.0;
/// At or above this, throughput grades as good.
pub const GRADE_GOOD_PAGES_PER_HOUR: f64 = 200.0;
/// At or above this, throughput grades as normal.
pub const GRADE_NORMAL_PAGES_PER_HOUR: f64 = 120.0;
/// At or above this, throughput grades as slow; below it, very slow.
pub const GRADE_SLOW_PAGES_PER_HOUR: f64 = 60.0;
