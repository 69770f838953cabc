//! HTTP request handlers.

mod metrics;
mod report;
mod status;

pub use metrics::metrics_handler;
pub use report::report_handler;
pub use status::status_handler;
