//! Live-crawl activity detection.

use chrono::{DateTime, Duration, Utc};

use crate::config::ACTIVITY_WINDOW_SECS;
use crate::models::PerformanceEvent;

/// Whether the site is actively crawling: at least one event landed within
/// the look-back window ending at `now`.
///
/// Events stamped after `now` are ignored rather than treated as recent, so
/// clock skew in the writer cannot make an idle site look live. The caller
/// passes the most recent events only; one match is enough.
pub fn is_active(recent_events: &[PerformanceEvent], now: DateTime<Utc>) -> bool {
    let cutoff = now - Duration::seconds(ACTIVITY_WINDOW_SECS);
    recent_events
        .iter()
        .any(|e| e.timestamp >= cutoff && e.timestamp <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::models::PageType;

    fn event_at(timestamp: DateTime<Utc>) -> PerformanceEvent {
        PerformanceEvent {
            site_id: "example.com".into(),
            url: "https://example.com/page".into(),
            timestamp,
            crawl_time_seconds: 1.2,
            page_type: PageType::Normal,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_events_means_idle() {
        assert!(!is_active(&[], now()));
    }

    #[test]
    fn test_recent_event_means_active() {
        let events = vec![event_at(now() - Duration::seconds(30))];
        assert!(is_active(&events, now()));
    }

    #[test]
    fn test_stale_events_mean_idle() {
        // 15 minutes ago is outside the 10-minute window.
        let events = vec![event_at(now() - Duration::minutes(15))];
        assert!(!is_active(&events, now()));
    }

    #[test]
    fn test_boundary_event_counts() {
        let events = vec![event_at(now() - Duration::seconds(ACTIVITY_WINDOW_SECS))];
        assert!(is_active(&events, now()));
    }

    #[test]
    fn test_future_stamped_events_are_ignored() {
        let events = vec![event_at(now() + Duration::minutes(2))];
        assert!(!is_active(&events, now()));

        // But a genuine recent event alongside the skewed one still wins.
        let events = vec![
            event_at(now() + Duration::minutes(2)),
            event_at(now() - Duration::minutes(1)),
        ];
        assert!(is_active(&events, now()));
    }
}
