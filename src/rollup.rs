//! Daily rollups, resource classification, and report sections.
//!
//! Rollups accumulate per-day counters as crawls are recorded; this module
//! holds the pure pieces of that path (URL resource classification, stats
//! summation) plus the derived figures consolidated reports are built from.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::models::{DailyRollup, DailyStats, PageType, PerformanceEvent};

/// Broad resource category of a crawled URL, judged by path extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// PDF documents.
    Pdf,
    /// Word/Excel/PowerPoint and similar office formats.
    OfficeDocument,
    /// Images, audio, and video.
    Media,
    /// Compressed archives.
    Archive,
    /// Everything else, including extensionless paths.
    Webpage,
}

const OFFICE_EXTENSIONS: &[&str] = &[
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "rtf", "odt", "ods",
];
const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "mp4", "mp3", "avi", "mov", "wav",
];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz"];

/// Classifies a URL by the extension of its path component.
///
/// Query string and fragment are stripped first so `report.pdf?v=2` still
/// classifies as a PDF. Matching is case-insensitive. Unrecognized and
/// missing extensions fall through to [`ResourceKind::Webpage`].
pub fn classify_resource(url: &str) -> ResourceKind {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);
    let ext = match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => ext.to_ascii_lowercase(),
        _ => return ResourceKind::Webpage,
    };
    if ext == "pdf" {
        ResourceKind::Pdf
    } else if OFFICE_EXTENSIONS.contains(&ext.as_str()) {
        ResourceKind::OfficeDocument
    } else if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        ResourceKind::Media
    } else if ARCHIVE_EXTENSIONS.contains(&ext.as_str()) {
        ResourceKind::Archive
    } else {
        ResourceKind::Webpage
    }
}

/// Whether the URL counts as a document for the daily document counter.
pub fn is_document(url: &str) -> bool {
    matches!(
        classify_resource(url),
        ResourceKind::Pdf | ResourceKind::OfficeDocument
    )
}

/// Deleted pages split by resource category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedBreakdown {
    /// Deleted PDF documents.
    pub pdf: i64,
    /// Deleted office documents.
    pub office: i64,
    /// Deleted media files.
    pub media: i64,
    /// Deleted archives.
    pub archive: i64,
    /// Deleted ordinary pages.
    pub webpage: i64,
}

impl DeletedBreakdown {
    /// Tallies one deleted URL into its category.
    pub fn record(&mut self, url: &str) {
        match classify_resource(url) {
            ResourceKind::Pdf => self.pdf += 1,
            ResourceKind::OfficeDocument => self.office += 1,
            ResourceKind::Media => self.media += 1,
            ResourceKind::Archive => self.archive += 1,
            ResourceKind::Webpage => self.webpage += 1,
        }
    }

    /// Total across all categories.
    pub fn total(&self) -> i64 {
        self.pdf + self.office + self.media + self.archive + self.webpage
    }
}

/// Tallies a set of deleted URLs into a breakdown.
pub fn deleted_breakdown<'a>(urls: impl IntoIterator<Item = &'a str>) -> DeletedBreakdown {
    let mut breakdown = DeletedBreakdown::default();
    for url in urls {
        breakdown.record(url);
    }
    breakdown
}

/// Share of events that ended in failure (failed or deleted outcomes),
/// as a fraction in [0, 1]. Zero for an empty slice.
pub fn error_rate(events: &[PerformanceEvent]) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    let errors = events
        .iter()
        .filter(|e| matches!(e.page_type, PageType::Failed | PageType::Deleted))
        .count();
    errors as f64 / events.len() as f64
}

/// Sums day-keyed rollups into one set of counters.
pub fn sum_stats<'a>(rollups: impl IntoIterator<Item = &'a DailyRollup>) -> DailyStats {
    let mut total = DailyStats::default();
    for rollup in rollups {
        total.pages_crawled += rollup.stats.pages_crawled;
        total.new_pages += rollup.stats.new_pages;
        total.changed_pages += rollup.stats.changed_pages;
        total.failed_pages += rollup.stats.failed_pages;
        total.deleted_pages += rollup.stats.deleted_pages;
        total.document_pages += rollup.stats.document_pages;
        total.total_time_seconds += rollup.stats.total_time_seconds;
    }
    total
}

/// Per-day activity line in a consolidated report, oldest day first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    /// Reporting-timezone calendar-day key.
    pub date: String,
    /// Crawl attempts completed that day.
    pub total_pages: i64,
    /// Newly discovered pages fetched that day.
    pub new_pages: i64,
    /// Pages whose content changed that day.
    pub changed_pages: i64,
}
