//! Database operations module.
//!
//! Read queries, the crawler-facing write path, pool setup, and migrations.

pub mod migrations;
pub mod pool;
pub mod queries;
pub mod record;
#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used items
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use record::{
    complete_cycle, discover_urls, ensure_site_cycle, mark_in_progress, mark_visited,
    observe_http_status, record_change, record_crawl,
};
