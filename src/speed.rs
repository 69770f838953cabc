//! Crawl throughput estimation.
//!
//! The canonical estimator divides a recent event count by an adaptive
//! trailing window. The window stretches with the site's observed history
//! and is clamped at both ends, so a freshly started site is not declared
//! infinitely fast and a long-running one gets a stable trailing view.
//!
//! An interval-based estimator is also provided: it infers throughput from
//! inter-event gaps and ignores idle periods, which makes it a better
//! measure of raw processing rate but a worse predictor of wall-clock
//! completion. Snapshots use the adaptive-window figure.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::{
    GRADE_EXCELLENT_PAGES_PER_HOUR, GRADE_GOOD_PAGES_PER_HOUR, GRADE_NORMAL_PAGES_PER_HOUR,
    GRADE_SLOW_PAGES_PER_HOUR, INTERVAL_MAX_SECS, INTERVAL_MIN_SECS, SPEED_TREND_HOURS,
    SPEED_WINDOW_CAP_SECS, SPEED_WINDOW_FLOOR_SECS,
};
use crate::models::PerformanceEvent;

/// The adaptive throughput window ending at `now`.
///
/// Spans from the site's earliest recorded event to `now`, clamped to the
/// configured floor and cap. With no history, or an earliest event stamped
/// in the future, the floor applies.
pub fn adaptive_window(now: DateTime<Utc>, earliest_event: Option<DateTime<Utc>>) -> Duration {
    let span = match earliest_event {
        Some(earliest) => now - earliest,
        None => Duration::zero(),
    };
    span.clamp(
        Duration::seconds(SPEED_WINDOW_FLOOR_SECS),
        Duration::seconds(SPEED_WINDOW_CAP_SECS),
    )
}

/// Rounds `count` events over `window` to whole pages per hour.
pub fn pages_per_hour(count: i64, window: Duration) -> i64 {
    let hours = window.num_milliseconds() as f64 / 3_600_000.0;
    if hours <= 0.0 {
        return 0;
    }
    (count as f64 / hours).round() as i64
}

/// Throughput inferred from inter-event gaps, in pages per hour.
///
/// Only gaps within the configured band count: shorter ones are duplicate
/// timestamps, longer ones are idle time between crawl bursts. Returns 0.0
/// when no gap qualifies. Events may arrive in any order.
pub fn interval_throughput(events: &[PerformanceEvent]) -> f64 {
    let mut times: Vec<DateTime<Utc>> = events.iter().map(|e| e.timestamp).collect();
    times.sort_unstable();
    let gaps: Vec<i64> = times
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds())
        .filter(|&g| (INTERVAL_MIN_SECS..=INTERVAL_MAX_SECS).contains(&g))
        .collect();
    if gaps.is_empty() {
        return 0.0;
    }
    let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
    3600.0 / mean
}

/// Qualitative throughput band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SpeedGrade {
    /// At or above 300 pages/hour.
    Excellent,
    /// At or above 200 pages/hour.
    Good,
    /// At or above 120 pages/hour.
    Normal,
    /// At or above 60 pages/hour.
    Slow,
    /// Below 60 pages/hour.
    VerySlow,
}

impl SpeedGrade {
    /// Grades a throughput figure against the configured thresholds.
    pub fn from_pages_per_hour(speed: f64) -> Self {
        if speed >= GRADE_EXCELLENT_PAGES_PER_HOUR {
            SpeedGrade::Excellent
        } else if speed >= GRADE_GOOD_PAGES_PER_HOUR {
            SpeedGrade::Good
        } else if speed >= GRADE_NORMAL_PAGES_PER_HOUR {
            SpeedGrade::Normal
        } else if speed >= GRADE_SLOW_PAGES_PER_HOUR {
            SpeedGrade::Slow
        } else {
            SpeedGrade::VerySlow
        }
    }
}

/// One hourly bucket of the speed-trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedPoint {
    /// Start of the hour bucket.
    pub time: DateTime<Utc>,
    /// Events completed in the bucket, as pages per hour.
    pub speed: i64,
    /// Raw event count in the bucket.
    pub count: i64,
}

/// Buckets the last [`SPEED_TREND_HOURS`] hours of events into an hourly
/// series, oldest bucket first. Empty hours appear with zero counts so the
/// series always has the full length.
pub fn hourly_trend(events: &[PerformanceEvent], now: DateTime<Utc>) -> Vec<SpeedPoint> {
    let start = now - Duration::hours(SPEED_TREND_HOURS);
    let mut counts = vec![0i64; SPEED_TREND_HOURS as usize];
    for event in events {
        if event.timestamp < start || event.timestamp > now {
            continue;
        }
        // An event stamped exactly at `now` belongs to the last bucket.
        let bucket = (event.timestamp - start).num_hours().min(SPEED_TREND_HOURS - 1);
        if let Some(slot) = counts.get_mut(bucket as usize) {
            *slot += 1;
        }
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| SpeedPoint {
            time: start + Duration::hours(i as i64),
            speed: count,
            count,
        })
        .collect()
}

/// Aggregate view over the non-empty buckets of a trend series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Mean pages/hour over active buckets.
    pub avg_pages_per_hour: f64,
    /// Best active bucket.
    pub peak_pages_per_hour: i64,
    /// Worst active bucket.
    pub min_pages_per_hour: i64,
}

/// Summarizes a trend series. Buckets with no events are excluded so an
/// overnight pause does not drag the average to zero; an entirely idle
/// series yields the zero summary.
pub fn performance_summary(trend: &[SpeedPoint]) -> PerformanceSummary {
    let active: Vec<&SpeedPoint> = trend.iter().filter(|p| p.count > 0).collect();
    if active.is_empty() {
        return PerformanceSummary::default();
    }
    let total: i64 = active.iter().map(|p| p.speed).sum();
    PerformanceSummary {
        avg_pages_per_hour: total as f64 / active.len() as f64,
        peak_pages_per_hour: active.iter().map(|p| p.speed).max().unwrap_or(0),
        min_pages_per_hour: active.iter().map(|p| p.speed).min().unwrap_or(0),
    }
}
