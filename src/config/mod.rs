//! Application configuration and constants.
//!
//! This module provides:
//! - Engine tuning constants (windows, thresholds, fallbacks)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
