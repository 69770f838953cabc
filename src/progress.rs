//! Progress percentage and completion estimates.

use serde::{Deserialize, Serialize};

use crate::config::FALLBACK_PAGES_PER_HOUR;

/// Raw per-state URL counts for a site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounts {
    /// All URL records for the site.
    pub total_discovered: i64,
    /// Records in the visited state.
    pub completed: i64,
    /// Records in the remaining state.
    pub remaining: i64,
    /// Records in the in-progress state.
    pub in_progress: i64,
}

impl ProgressCounts {
    /// Whether the per-state counts add up to the total. Can fail when the
    /// counts were read while the crawler was mid-write.
    pub fn is_consistent(&self) -> bool {
        self.completed + self.remaining + self.in_progress == self.total_discovered
    }

    /// URLs not yet completed.
    pub fn unfinished(&self) -> i64 {
        self.remaining + self.in_progress
    }
}

/// Derived progress figures for a site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Completed share of the total, rounded to whole percent. Zero for a
    /// site with no discovered URLs.
    pub percent: i64,
    /// Estimated hours until the unfinished work completes. `None` exactly
    /// when nothing is unfinished.
    pub eta_hours: Option<f64>,
}

/// Computes progress from counts and the current throughput estimate.
///
/// When unfinished work exists but the site shows no measurable speed, the
/// configured fallback throughput keeps the estimate finite; a finished or
/// empty site reports no estimate at all rather than zero hours.
pub fn snapshot(counts: &ProgressCounts, pages_per_hour: i64) -> ProgressSnapshot {
    let percent = if counts.total_discovered > 0 {
        (100.0 * counts.completed as f64 / counts.total_discovered as f64).round() as i64
    } else {
        0
    };
    let unfinished = counts.unfinished();
    let eta_hours = if unfinished == 0 {
        None
    } else {
        let speed = if pages_per_hour > 0 {
            pages_per_hour as f64
        } else {
            FALLBACK_PAGES_PER_HOUR
        };
        Some(unfinished as f64 / speed)
    };
    ProgressSnapshot { percent, eta_hours }
}
