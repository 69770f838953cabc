//! Snapshot assembly.
//!
//! [`StatusEngine`] is the read-side entry point: it runs the storage
//! queries a snapshot needs, bounded by a single timeout, and combines them
//! through the pure computation modules. A snapshot either materializes
//! completely or the whole operation fails; callers never see a partially
//! filled view. Every operation takes an explicit `now` so the same inputs
//! always produce the same snapshot.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::{Display, EnumIter, EnumString};
use tokio::try_join;

use crate::activity::is_active;
use crate::classify::{self, UrlLabel};
use crate::config::{RECENT_EVENT_FETCH_LIMIT, SPEED_TREND_HOURS};
use crate::error_handling::EngineError;
use crate::models::{CrawlState, DailyStats, PageType, SiteCycle};
use crate::progress::{self, ProgressCounts};
use crate::rollup::{
    deleted_breakdown, error_rate, sum_stats, DailyActivity, DeletedBreakdown,
};
use crate::speed::{
    adaptive_window, hourly_trend, pages_per_hour, performance_summary, PerformanceSummary,
    SpeedGrade, SpeedPoint,
};
use crate::storage::queries;
use crate::window::{local_day_key, local_day_start, report_bounds, ReportWindow};

/// Phase of a site's crawl campaign.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// First cycle over a site: the URL frontier is still being built.
    Discovery,
    /// Any later cycle: revisiting known URLs for changes and removals.
    Maintenance,
}

/// Current cycle position of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleInfo {
    /// 1-based campaign counter.
    pub number: i64,
    /// Discovery for the first cycle, maintenance afterwards.
    pub phase: CyclePhase,
    /// 1-based local calendar day within the cycle.
    pub day: i64,
}

/// Live status view of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Site the snapshot describes.
    pub site_id: String,
    /// The `now` the snapshot was computed against.
    pub generated_at: DateTime<Utc>,
    /// Whether events landed within the activity window.
    pub is_active: bool,
    /// All discovered URLs.
    pub total_pages: i64,
    /// URLs crawled at least once.
    pub completed_pages: i64,
    /// URLs not yet attempted.
    pub remaining_pages: i64,
    /// URLs claimed by workers right now.
    pub in_progress_pages: i64,
    /// Completed share of the total, whole percent.
    pub progress_percent: i64,
    /// URLs whose latest response was an error.
    pub failed_pages: i64,
    /// URLs confirmed gone. Subset of the failed count.
    pub deleted_pages: i64,
    /// URLs with a detected content change.
    pub changed_pages: i64,
    /// Current throughput estimate.
    pub pages_per_hour: i64,
    /// Qualitative band of the throughput estimate.
    pub speed_grade: SpeedGrade,
    /// Estimated hours to completion, absent when nothing is unfinished.
    pub eta_hours: Option<f64>,
    /// Cycle position, absent for a site with URLs but no cycle record.
    pub cycle: Option<CycleInfo>,
    /// Today's accumulated counters (reporting-timezone day).
    pub today: DailyStats,
}

/// Metrics panel view of a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsPanel {
    /// Site the panel describes.
    pub site_id: String,
    /// The `now` the panel was computed against.
    pub generated_at: DateTime<Utc>,
    /// Current throughput estimate.
    pub pages_per_hour: i64,
    /// Qualitative band of the throughput estimate.
    pub speed_grade: SpeedGrade,
    /// Hourly event buckets over the trend span, oldest first.
    pub speed_trend: Vec<SpeedPoint>,
    /// Aggregates over the active trend buckets.
    pub performance: PerformanceSummary,
    /// Share of trend-span events that ended in failure, in [0, 1].
    pub error_rate: f64,
    /// One line per local calendar day over the last week, oldest first.
    pub daily_stats: Vec<DailyActivity>,
    /// Today's accumulated counters (reporting-timezone day).
    pub today: DailyStats,
}

/// Newly discovered work in a report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySection {
    /// URLs first seen within the window.
    pub urls_discovered: i64,
    /// First-time fetches completed within the window.
    pub new_pages_crawled: i64,
}

/// Crawl volume and effort in a report window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSection {
    /// Crawl attempts completed within the window.
    pub pages_crawled: i64,
    /// Total processing time spent, in seconds.
    pub total_time_seconds: f64,
    /// Mean processing time per attempt, zero when nothing was crawled.
    pub avg_seconds_per_page: f64,
}

/// Content changes in a report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangesSection {
    /// Change outcomes recorded within the window.
    pub pages_changed: i64,
    /// Distinct URLs whose latest change fell within the window.
    pub urls_changed: i64,
}

/// Failures in a report window. Deletions count here too, so this section
/// never understates how many attempts went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailuresSection {
    /// Failed and deleted outcomes recorded within the window.
    pub failed_pages: i64,
    /// Failed share of all attempts in the window, in [0, 1].
    pub error_rate: f64,
}

/// Confirmed page removals in a report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionsSection {
    /// Distinct URLs confirmed gone within the window.
    pub pages_deleted: i64,
    /// The same deletions split by resource category.
    pub breakdown: DeletedBreakdown,
}

/// Whole-site position at report time, independent of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsSection {
    /// All discovered URLs.
    pub total_pages: i64,
    /// URLs crawled at least once.
    pub completed_pages: i64,
    /// URLs not yet attempted.
    pub remaining_pages: i64,
    /// URLs claimed by workers right now.
    pub in_progress_pages: i64,
    /// URLs whose latest response was an error.
    pub failed_pages: i64,
    /// URLs confirmed gone. Subset of the failed count.
    pub deleted_pages: i64,
    /// URLs with a detected content change.
    pub changed_pages: i64,
    /// Completed share of the total, whole percent.
    pub progress_percent: i64,
}

/// Consolidated daily or weekly report for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Site the report describes.
    pub site_id: String,
    /// The window the report covers.
    pub window: ReportWindow,
    /// The `now` the report was computed against.
    pub generated_at: DateTime<Utc>,
    /// Newly discovered work.
    pub discovery: DiscoverySection,
    /// Crawl volume and effort.
    pub processing: ProcessingSection,
    /// Content changes.
    pub changes: ChangesSection,
    /// Failed attempts, deletions included.
    pub failures: FailuresSection,
    /// Confirmed removals with a resource breakdown.
    pub deletions: DeletionsSection,
    /// One line per local calendar day in the window, oldest first. Days
    /// with no recorded activity appear with zero counters.
    pub daily_activity: Vec<DailyActivity>,
    /// Whole-site position at report time.
    pub totals: TotalsSection,
}

/// Read-side engine over a crawler's state store.
#[derive(Debug, Clone)]
pub struct StatusEngine {
    pool: Arc<SqlitePool>,
    query_timeout: StdDuration,
}

impl StatusEngine {
    /// Creates an engine over the given pool. `query_timeout` bounds the
    /// storage work of one snapshot operation.
    pub fn new(pool: Arc<SqlitePool>, query_timeout: StdDuration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Runs one storage query under the snapshot timeout.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, EngineError> {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(EngineError::from),
            Err(_) => Err(EngineError::StorageUnavailable(
                "storage query timed out".to_string(),
            )),
        }
    }

    async fn progress_counts(&self, site_id: &str) -> Result<ProgressCounts, EngineError> {
        let pool = &*self.pool;
        let (total_discovered, completed, remaining, in_progress) = try_join!(
            self.bounded(queries::count_url_records(pool, site_id)),
            self.bounded(queries::count_urls_in_state(pool, site_id, CrawlState::Visited)),
            self.bounded(queries::count_urls_in_state(pool, site_id, CrawlState::Remaining)),
            self.bounded(queries::count_urls_in_state(pool, site_id, CrawlState::InProgress)),
        )?;
        let counts = ProgressCounts {
            total_discovered,
            completed,
            remaining,
            in_progress,
        };
        if !counts.is_consistent() {
            // The crawler was mid-write between our counting queries. The
            // snapshot still goes out; the next one will converge.
            warn!(
                "Inconsistent state counts for {site_id}: {} + {} + {} != {}",
                counts.completed, counts.remaining, counts.in_progress, counts.total_discovered
            );
        }
        Ok(counts)
    }

    /// Current throughput estimate: events in the adaptive trailing window
    /// divided by its length.
    async fn current_speed(
        &self,
        site_id: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, EngineError> {
        let pool = &*self.pool;
        let earliest = self.bounded(queries::earliest_event_at(pool, site_id)).await?;
        let window = adaptive_window(now, earliest);
        let count = self
            .bounded(queries::count_events_between(pool, site_id, now - window, now))
            .await?;
        Ok(pages_per_hour(count, window))
    }

    fn cycle_info(cycle: &SiteCycle, now: DateTime<Utc>) -> CycleInfo {
        let phase = if cycle.is_first_cycle {
            CyclePhase::Discovery
        } else {
            CyclePhase::Maintenance
        };
        // Day 1 is the local calendar day the cycle started on.
        let elapsed_days =
            (local_day_start(now) - local_day_start(cycle.cycle_started_at)).num_days();
        CycleInfo {
            number: cycle.cycle_number,
            phase,
            day: elapsed_days.max(0) + 1,
        }
    }

    fn daily_activity(day_keys: &[String], rollups: &[crate::models::DailyRollup]) -> Vec<DailyActivity> {
        day_keys
            .iter()
            .map(|day| {
                let stats = rollups
                    .iter()
                    .find(|r| &r.date == day)
                    .map(|r| r.stats)
                    .unwrap_or_default();
                DailyActivity {
                    date: day.clone(),
                    total_pages: stats.pages_crawled,
                    new_pages: stats.new_pages,
                    changed_pages: stats.changed_pages,
                }
            })
            .collect()
    }

    fn ensure_tracked(
        site_id: &str,
        counts: &ProgressCounts,
        cycle: &Option<SiteCycle>,
    ) -> Result<(), EngineError> {
        if counts.total_discovered == 0 && cycle.is_none() {
            return Err(EngineError::NotFound(site_id.to_string()));
        }
        Ok(())
    }

    /// Builds the live status view of a site.
    pub async fn get_status(
        &self,
        site_id: &str,
        now: DateTime<Utc>,
    ) -> Result<StatusSnapshot, EngineError> {
        let pool = &*self.pool;
        let today_key = local_day_key(now);
        let (counts, failed, deleted, changed, cycle, recent_events, today, speed) = try_join!(
            self.progress_counts(site_id),
            self.bounded(queries::count_failed_urls(pool, site_id)),
            self.bounded(queries::count_deleted_urls(pool, site_id)),
            self.bounded(queries::count_changed_urls(pool, site_id)),
            self.bounded(queries::fetch_site_cycle(pool, site_id)),
            self.bounded(queries::fetch_recent_events(
                pool,
                site_id,
                RECENT_EVENT_FETCH_LIMIT
            )),
            self.bounded(queries::fetch_daily_rollup(pool, site_id, &today_key)),
            self.current_speed(site_id, now),
        )?;
        Self::ensure_tracked(site_id, &counts, &cycle)?;

        let progress = progress::snapshot(&counts, speed);
        Ok(StatusSnapshot {
            site_id: site_id.to_string(),
            generated_at: now,
            is_active: is_active(&recent_events, now),
            total_pages: counts.total_discovered,
            completed_pages: counts.completed,
            remaining_pages: counts.remaining,
            in_progress_pages: counts.in_progress,
            progress_percent: progress.percent,
            failed_pages: failed,
            deleted_pages: deleted,
            changed_pages: changed,
            pages_per_hour: speed,
            speed_grade: SpeedGrade::from_pages_per_hour(speed as f64),
            eta_hours: progress.eta_hours,
            cycle: cycle.map(|c| Self::cycle_info(&c, now)),
            today: today.map(|r| r.stats).unwrap_or_default(),
        })
    }

    /// Builds the metrics panel view of a site.
    pub async fn get_metrics(
        &self,
        site_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MetricsPanel, EngineError> {
        let pool = &*self.pool;
        let trend_start = now - Duration::hours(SPEED_TREND_HOURS);
        let week = report_bounds(now, ReportWindow::Weekly);
        let today_key = local_day_key(now);
        let (counts, cycle, events, rollups, today, speed) = try_join!(
            self.progress_counts(site_id),
            self.bounded(queries::fetch_site_cycle(pool, site_id)),
            self.bounded(queries::fetch_events_between(pool, site_id, trend_start, now)),
            self.bounded(queries::fetch_daily_rollups(pool, site_id, &week.day_keys)),
            self.bounded(queries::fetch_daily_rollup(pool, site_id, &today_key)),
            self.current_speed(site_id, now),
        )?;
        Self::ensure_tracked(site_id, &counts, &cycle)?;

        let speed_trend = hourly_trend(&events, now);
        let performance = performance_summary(&speed_trend);
        Ok(MetricsPanel {
            site_id: site_id.to_string(),
            generated_at: now,
            pages_per_hour: speed,
            speed_grade: SpeedGrade::from_pages_per_hour(speed as f64),
            performance,
            error_rate: error_rate(&events),
            daily_stats: Self::daily_activity(&week.day_keys, &rollups),
            speed_trend,
            today: today.map(|r| r.stats).unwrap_or_default(),
        })
    }

    /// Builds a consolidated daily or weekly report for a site.
    pub async fn get_report(
        &self,
        site_id: &str,
        window: ReportWindow,
        now: DateTime<Utc>,
    ) -> Result<CrawlReport, EngineError> {
        let pool = &*self.pool;
        let bounds = report_bounds(now, window);
        let (counts, cycle, rollups, urls_discovered, urls_changed, deleted_urls, failed, deleted, changed) = try_join!(
            self.progress_counts(site_id),
            self.bounded(queries::fetch_site_cycle(pool, site_id)),
            self.bounded(queries::fetch_daily_rollups(pool, site_id, &bounds.day_keys)),
            self.bounded(queries::count_discovered_between(
                pool, site_id, bounds.start, bounds.end
            )),
            self.bounded(queries::count_changed_between(
                pool, site_id, bounds.start, bounds.end
            )),
            self.bounded(queries::deleted_event_urls_between(
                pool, site_id, bounds.start, bounds.end
            )),
            self.bounded(queries::count_failed_urls(pool, site_id)),
            self.bounded(queries::count_deleted_urls(pool, site_id)),
            self.bounded(queries::count_changed_urls(pool, site_id)),
        )?;
        // Failures are counted from the events themselves: record predicates
        // reflect current state, not how often something went wrong in the
        // window.
        let (failed_events, deleted_events) = try_join!(
            self.bounded(queries::count_events_of_type_between(
                pool,
                site_id,
                PageType::Failed,
                bounds.start,
                bounds.end
            )),
            self.bounded(queries::count_events_of_type_between(
                pool,
                site_id,
                PageType::Deleted,
                bounds.start,
                bounds.end
            )),
        )?;
        Self::ensure_tracked(site_id, &counts, &cycle)?;

        let totals_in_window = sum_stats(&rollups);
        let avg_seconds_per_page = if totals_in_window.pages_crawled > 0 {
            totals_in_window.total_time_seconds / totals_in_window.pages_crawled as f64
        } else {
            0.0
        };
        let failed_pages = failed_events + deleted_events;
        let window_error_rate = if totals_in_window.pages_crawled > 0 {
            failed_pages as f64 / totals_in_window.pages_crawled as f64
        } else {
            0.0
        };
        let breakdown = deleted_breakdown(deleted_urls.iter().map(String::as_str));

        let daily_activity = Self::daily_activity(&bounds.day_keys, &rollups);
        let progress = progress::snapshot(&counts, 0);
        Ok(CrawlReport {
            site_id: site_id.to_string(),
            window,
            generated_at: now,
            discovery: DiscoverySection {
                urls_discovered,
                new_pages_crawled: totals_in_window.new_pages,
            },
            processing: ProcessingSection {
                pages_crawled: totals_in_window.pages_crawled,
                total_time_seconds: totals_in_window.total_time_seconds,
                avg_seconds_per_page,
            },
            changes: ChangesSection {
                pages_changed: totals_in_window.changed_pages,
                urls_changed,
            },
            failures: FailuresSection {
                failed_pages,
                error_rate: window_error_rate,
            },
            deletions: DeletionsSection {
                pages_deleted: breakdown.total(),
                breakdown,
            },
            daily_activity,
            totals: TotalsSection {
                total_pages: counts.total_discovered,
                completed_pages: counts.completed,
                remaining_pages: counts.remaining,
                in_progress_pages: counts.in_progress,
                failed_pages: failed,
                deleted_pages: deleted,
                changed_pages: changed,
                progress_percent: progress.percent,
            },
        })
    }

    /// Labels a single tracked URL by its highest-severity condition.
    pub async fn url_label(&self, site_id: &str, url: &str) -> Result<UrlLabel, EngineError> {
        let record = self
            .bounded(queries::fetch_url_record(&self.pool, site_id, url))
            .await?;
        match record {
            Some(record) => Ok(classify::label(&record)),
            None => Err(EngineError::NotFound(format!("{site_id} {url}"))),
        }
    }
}
