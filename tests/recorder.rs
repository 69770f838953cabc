//! Write-path behavior against a file-backed state store.

mod helpers;

use chrono::{Duration, TimeZone, Utc};

use crawl_pulse::classify::UrlLabel;
use crawl_pulse::models::PageType;
use crawl_pulse::storage::{
    complete_cycle, init_db_pool_with_path, mark_in_progress, mark_visited, record_change,
    run_migrations,
};
use crawl_pulse::ReportWindow;
use helpers::{crawl_url, create_test_pool, engine, seed_site};

#[tokio::test]
async fn test_full_cycle_against_file_backed_store() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("pulse_test.db");
    let pool = init_db_pool_with_path(&db_path)
        .await
        .expect("Failed to open file-backed pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
    let start = now - Duration::hours(6);
    seed_site(
        &pool,
        "example.com",
        &["https://example.com/a", "https://example.com/b.pdf"],
        start,
    )
    .await;
    crawl_url(&pool, "example.com", "https://example.com/a", 200, PageType::New, start).await;
    crawl_url(
        &pool,
        "example.com",
        "https://example.com/b.pdf",
        200,
        PageType::New,
        now - Duration::hours(1),
    )
    .await;

    let engine = engine(&pool);
    let status = engine.get_status("example.com", now).await.unwrap();
    assert_eq!(status.total_pages, 2);
    assert_eq!(status.completed_pages, 2);
    assert_eq!(status.progress_percent, 100);
    assert_eq!(status.eta_hours, None);
    // The PDF crawled at 05:00 local Mar 11 counts toward today's documents.
    assert_eq!(status.today.document_pages, 1);

    let cycle = status.cycle.expect("cycle info should be present");
    assert_eq!(cycle.number, 1);

    // Finishing the discovery cycle flips the site into maintenance.
    complete_cycle(&pool, "example.com", now).await.unwrap();
    let status = engine.get_status("example.com", now).await.unwrap();
    let cycle = status.cycle.expect("cycle info should be present");
    assert_eq!(cycle.number, 2);
    assert_eq!(cycle.day, 1);

    let report = engine
        .get_report("example.com", ReportWindow::Daily, now)
        .await
        .unwrap();
    // Both crawls landed on local Mar 11 (00:00 and 05:00 local).
    assert_eq!(report.processing.pages_crawled, 2);
    assert!((report.processing.avg_seconds_per_page - 1.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_change_records_surface_in_labels_and_reports() {
    let pool = create_test_pool().await;
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
    let start = now - Duration::hours(3);
    seed_site(
        &pool,
        "example.com",
        &["https://example.com/a", "https://example.com/b"],
        start,
    )
    .await;
    crawl_url(&pool, "example.com", "https://example.com/a", 200, PageType::Normal, start).await;
    record_change(
        &pool,
        "example.com",
        "https://example.com/a",
        now - Duration::hours(1),
        "title updated",
    )
    .await
    .unwrap();

    // The other URL finishes without an HTTP outcome to report.
    mark_in_progress(&pool, "example.com", "https://example.com/b")
        .await
        .unwrap();
    mark_visited(&pool, "example.com", "https://example.com/b")
        .await
        .unwrap();

    let engine = engine(&pool);
    assert_eq!(
        engine.url_label("example.com", "https://example.com/a").await.unwrap(),
        UrlLabel::Changed
    );
    assert_eq!(
        engine.url_label("example.com", "https://example.com/b").await.unwrap(),
        UrlLabel::Visited
    );

    // The change stamp falls inside today's window, so the report counts
    // the URL even though no change event was recorded.
    let report = engine
        .get_report("example.com", ReportWindow::Daily, now)
        .await
        .unwrap();
    assert_eq!(report.changes.urls_changed, 1);
    assert_eq!(report.changes.pages_changed, 0);
    assert_eq!(report.totals.changed_pages, 1);

    let status = engine.get_status("example.com", now).await.unwrap();
    assert_eq!(status.completed_pages, 2);
    assert_eq!(status.changed_pages, 1);
}
