//! Reporting timezone and report window arithmetic.
//!
//! The engine keeps two notions of time. Event timestamps are UTC instants
//! and all event-range queries use instant bounds. Daily rollups are keyed
//! by calendar days in a fixed reporting timezone (UTC+10), so "today" and
//! "the last 7 days" are calendar concepts, not rolling 24-hour windows.

use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{REPORTING_UTC_OFFSET_SECS, REPORT_WEEK_DAYS};
use crate::error_handling::EngineError;

/// The fixed reporting timezone (UTC+10).
///
/// A fixed offset has no DST transitions, so every local day is exactly
/// 24 hours and day-key arithmetic never hits an ambiguous wall-clock time.
pub fn reporting_tz() -> FixedOffset {
    // Statically in range, East of UTC.
    match FixedOffset::east_opt(REPORTING_UTC_OFFSET_SECS) {
        Some(tz) => tz,
        None => unreachable!("reporting offset constant is within +/- 24h"),
    }
}

/// Converts an epoch-milliseconds column value to a UTC instant.
///
/// Out-of-range values (which cannot be produced by our own writer) clamp
/// to the epoch rather than aborting a whole snapshot.
pub fn ms_to_utc(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

/// The "YYYY-MM-DD" rollup key of the reporting-timezone calendar day
/// containing `at`.
pub fn local_day_key(at: DateTime<Utc>) -> String {
    at.with_timezone(&reporting_tz())
        .format("%Y-%m-%d")
        .to_string()
}

/// The UTC instant at which the reporting-timezone calendar day containing
/// `at` began.
pub fn local_day_start(at: DateTime<Utc>) -> DateTime<Utc> {
    let local_midnight = at
        .with_timezone(&reporting_tz())
        .date_naive()
        .and_time(NaiveTime::MIN);
    match local_midnight.and_local_timezone(reporting_tz()) {
        // Fixed offsets map every wall-clock time to exactly one instant.
        chrono::LocalResult::Single(t) => t.with_timezone(&Utc),
        _ => unreachable!("fixed-offset timezones have no ambiguous times"),
    }
}

/// Span of a consolidated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportWindow {
    /// The current reporting-timezone calendar day.
    Daily,
    /// The last [`REPORT_WEEK_DAYS`] reporting-timezone calendar days,
    /// including today.
    Weekly,
}

impl ReportWindow {
    /// Lowercase wire name of the window, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportWindow::Daily => "daily",
            ReportWindow::Weekly => "weekly",
        }
    }
}

impl FromStr for ReportWindow {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ReportWindow::Daily),
            "weekly" => Ok(ReportWindow::Weekly),
            other => Err(EngineError::InvalidWindow(other.to_string())),
        }
    }
}

/// Resolved bounds of a report window: instant bounds for event queries and
/// day keys for rollup queries, both derived from the same `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBounds {
    /// Inclusive UTC start of the window.
    pub start: DateTime<Utc>,
    /// Exclusive UTC end of the window (the caller's `now`).
    pub end: DateTime<Utc>,
    /// Rollup keys of every local calendar day the window touches, oldest
    /// first, today last.
    pub day_keys: Vec<String>,
}

/// Resolves `window` against `now`.
///
/// The daily window starts at the most recent local midnight; the weekly
/// window starts at the local midnight [`REPORT_WEEK_DAYS`] - 1 days before
/// today, so it always covers exactly that many calendar days.
pub fn report_bounds(now: DateTime<Utc>, window: ReportWindow) -> ReportBounds {
    let days = match window {
        ReportWindow::Daily => 1,
        ReportWindow::Weekly => REPORT_WEEK_DAYS,
    };
    let today_start = local_day_start(now);
    let start = today_start - Duration::days(days - 1);
    let day_keys = (0..days)
        .map(|i| local_day_key(start + Duration::days(i)))
        .collect();
    ReportBounds {
        start,
        end: now,
        day_keys,
    }
}
