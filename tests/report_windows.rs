//! Daily and weekly report attribution across the reporting timezone.

mod helpers;

use chrono::{Duration, TimeZone, Utc};

use crawl_pulse::models::PageType;
use crawl_pulse::{EngineError, ReportWindow};
use helpers::{crawl_url, create_test_pool, engine, seed_site};

#[tokio::test]
async fn test_daily_report_uses_local_calendar_days() {
    let pool = create_test_pool().await;
    // 20:00 UTC on Mar 10 is 06:00 on Mar 11 in the reporting timezone.
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
    let seeded_at = now - Duration::hours(12);
    seed_site(
        &pool,
        "example.com",
        &["https://example.com/a", "https://example.com/b"],
        seeded_at,
    )
    .await;

    // 13:00 UTC is still local Mar 10; 15:00 UTC is local Mar 11.
    crawl_url(
        &pool,
        "example.com",
        "https://example.com/a",
        200,
        PageType::New,
        Utc.with_ymd_and_hms(2024, 3, 10, 13, 0, 0).unwrap(),
    )
    .await;
    crawl_url(
        &pool,
        "example.com",
        "https://example.com/b",
        200,
        PageType::New,
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap(),
    )
    .await;

    let report = engine(&pool)
        .get_report("example.com", ReportWindow::Daily, now)
        .await
        .unwrap();
    // Only the local-Mar-11 crawl is in today's report.
    assert_eq!(report.processing.pages_crawled, 1);
    assert_eq!(report.daily_activity.len(), 1);
    assert_eq!(report.daily_activity[0].date, "2024-03-11");
    assert_eq!(report.daily_activity[0].new_pages, 1);
}

#[tokio::test]
async fn test_weekly_report_zero_fills_quiet_days() {
    let pool = create_test_pool().await;
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
    let seeded_at = now - Duration::days(10);
    seed_site(
        &pool,
        "example.com",
        &["https://example.com/a", "https://example.com/b"],
        seeded_at,
    )
    .await;

    crawl_url(
        &pool,
        "example.com",
        "https://example.com/a",
        200,
        PageType::New,
        now - Duration::days(3),
    )
    .await;
    crawl_url(
        &pool,
        "example.com",
        "https://example.com/b",
        200,
        PageType::Changed,
        now - Duration::days(1),
    )
    .await;

    let report = engine(&pool)
        .get_report("example.com", ReportWindow::Weekly, now)
        .await
        .unwrap();
    assert_eq!(report.daily_activity.len(), 7);
    assert_eq!(
        report
            .daily_activity
            .iter()
            .map(|d| d.total_pages)
            .sum::<i64>(),
        2
    );
    // Quiet days are present with zero counters, not absent.
    assert!(report.daily_activity.iter().any(|d| d.total_pages == 0));
    assert_eq!(report.processing.pages_crawled, 2);
    assert_eq!(report.changes.pages_changed, 1);
    // Discovery happened 10 days ago, outside the weekly window.
    assert_eq!(report.discovery.urls_discovered, 0);
}

#[tokio::test]
async fn test_report_failures_include_deletions() {
    let pool = create_test_pool().await;
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
    let start = now - Duration::days(2);
    seed_site(
        &pool,
        "example.com",
        &[
            "https://example.com/gone.pdf",
            "https://example.com/broken",
            "https://example.com/fine",
        ],
        start,
    )
    .await;
    crawl_url(&pool, "example.com", "https://example.com/gone.pdf", 404, PageType::Failed, start)
        .await;
    crawl_url(
        &pool,
        "example.com",
        "https://example.com/gone.pdf",
        404,
        PageType::Deleted,
        now - Duration::days(1),
    )
    .await;
    crawl_url(
        &pool,
        "example.com",
        "https://example.com/broken",
        500,
        PageType::Failed,
        now - Duration::hours(5),
    )
    .await;
    crawl_url(
        &pool,
        "example.com",
        "https://example.com/fine",
        200,
        PageType::New,
        now - Duration::hours(4),
    )
    .await;

    let report = engine(&pool)
        .get_report("example.com", ReportWindow::Weekly, now)
        .await
        .unwrap();
    // Two failed outcomes plus one deletion outcome.
    assert_eq!(report.failures.failed_pages, 3);
    assert!((report.failures.error_rate - 0.75).abs() < 1e-9);
    assert_eq!(report.deletions.pages_deleted, 1);
    assert_eq!(report.deletions.breakdown.pdf, 1);
    assert!(report.deletions.pages_deleted <= report.failures.failed_pages);

    assert_eq!(report.totals.total_pages, 3);
    assert_eq!(report.totals.completed_pages, 3);
    assert_eq!(report.totals.progress_percent, 100);
}

#[tokio::test]
async fn test_report_for_unknown_site_and_bad_window() {
    let pool = create_test_pool().await;
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
    let err = engine(&pool)
        .get_report("nowhere.com", ReportWindow::Daily, now)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    // Window strings are validated before any storage work happens.
    assert!(matches!(
        "quarterly".parse::<ReportWindow>(),
        Err(EngineError::InvalidWindow(_))
    ));
}
