//! URL status classification.
//!
//! A [`UrlRecord`] stores exactly one lifecycle state, but several derived
//! conditions can hold at once (a URL can be failed and deleted and changed
//! simultaneously). This module defines those predicates once, in both Rust
//! and SQL form, so per-record labelling and bulk counting can never drift
//! apart. The single display label collapses the overlap with a fixed
//! severity order.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::models::{CrawlState, UrlRecord};

/// SQL predicate matching failed URLs. Bind-parameter free by construction.
pub const FAILED_SQL: &str = "last_http_status >= 400";

/// SQL predicate matching deleted URLs.
///
/// Deletion requires a gone-style status and repeated confirmation, so one
/// transient 404 never reclassifies a page. Every deleted URL also matches
/// [`FAILED_SQL`].
pub const DELETED_SQL: &str = "last_http_status IN (404, 410) AND error_count >= 2";

/// SQL predicate matching URLs with at least one detected content change.
pub const CHANGED_SQL: &str = "last_change_at_ms IS NOT NULL";

/// Whether a record counts as failed: its most recent response was an error.
pub fn is_failed(record: &UrlRecord) -> bool {
    matches!(record.last_http_status, Some(s) if s >= 400)
}

/// Whether a record counts as deleted.
pub fn is_deleted(record: &UrlRecord) -> bool {
    deleted_predicate(record.last_http_status, record.error_count)
}

/// The deletion rule over raw fields, shared with the write path so it can
/// compare the rule's value before and after an observation.
pub fn deleted_predicate(last_http_status: Option<u16>, error_count: u32) -> bool {
    matches!(last_http_status, Some(404 | 410)) && error_count >= 2
}

/// Whether a record ever had a content change detected.
pub fn is_changed(record: &UrlRecord) -> bool {
    record.last_change.is_some()
}

/// Single display label for a URL, most severe condition first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UrlLabel {
    /// Confirmed gone (404/410 with repeated errors).
    Deleted,
    /// Most recent response was an error.
    Failed,
    /// Content changed at some point, currently healthy.
    Changed,
    /// Crawled at least once, nothing notable since.
    Visited,
    /// Claimed by a crawl worker right now.
    InProgress,
    /// Discovered, not yet attempted.
    Pending,
}

/// Labels a record by the highest-severity condition that holds.
///
/// Severity order: deleted, failed, changed, then the stored lifecycle
/// state. The derived predicates outrank the stored state because an error
/// condition is more actionable than "visited".
pub fn label(record: &UrlRecord) -> UrlLabel {
    if is_deleted(record) {
        UrlLabel::Deleted
    } else if is_failed(record) {
        UrlLabel::Failed
    } else if is_changed(record) {
        UrlLabel::Changed
    } else {
        match record.state {
            CrawlState::Visited => UrlLabel::Visited,
            CrawlState::InProgress => UrlLabel::InProgress,
            CrawlState::Remaining => UrlLabel::Pending,
        }
    }
}
