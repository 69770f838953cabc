//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument
//! parsing and configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DB_PATH, DEFAULT_STATUS_PORT, QUERY_TIMEOUT};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Runtime configuration for the status server binary.
///
/// Can also be constructed programmatically via [`Default`] when the engine
/// is embedded as a library.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "crawl_pulse",
    about = "Serves crawl status, metrics, and daily/weekly reports over a crawler's SQLite state store."
)]
pub struct Config {
    /// Path to the SQLite database written by the crawler
    #[arg(long, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Port the HTTP status server listens on
    #[arg(long, default_value_t = DEFAULT_STATUS_PORT)]
    pub port: u16,

    /// Upper bound on a single snapshot's storage queries, in seconds
    #[arg(long, default_value_t = QUERY_TIMEOUT.as_secs())]
    pub query_timeout_secs: u64,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DB_PATH),
            port: DEFAULT_STATUS_PORT,
            query_timeout_secs: QUERY_TIMEOUT.as_secs(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.db_path, PathBuf::from(DB_PATH));
        assert_eq!(config.port, DEFAULT_STATUS_PORT);
        assert_eq!(config.query_timeout_secs, QUERY_TIMEOUT.as_secs());
    }

    #[test]
    fn test_config_parses_cli_overrides() {
        let config = Config::parse_from([
            "crawl_pulse",
            "--db-path",
            "/tmp/other.db",
            "--port",
            "9000",
            "--query-timeout-secs",
            "3",
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.query_timeout_secs, 3);
    }
}
