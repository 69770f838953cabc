//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database setup.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Failure of a snapshot operation.
///
/// Any storage failure surfaces as a single aggregate error; the engine
/// never returns a partially filled snapshot. Retry policy belongs to the
/// caller; every engine computation is idempotent and safe to rerun.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The site has no cycle descriptor and no URL records at all.
    /// Distinct from a tracked site with zero progress.
    #[error("site '{0}' is not tracked")]
    NotFound(String),

    /// The storage collaborator failed or timed out. Retryable.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Unsupported report window argument.
    #[error("unsupported report window: '{0}' (expected 'daily' or 'weekly')")]
    InvalidWindow(String),
}

impl EngineError {
    /// Whether the caller may retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StorageUnavailable(_))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::StorageUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(EngineError::StorageUnavailable("timeout".into()).is_retryable());
        assert!(!EngineError::NotFound("example.com".into()).is_retryable());
        assert!(!EngineError::InvalidWindow("monthly".into()).is_retryable());
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = EngineError::NotFound("ato.gov.au".into());
        assert!(err.to_string().contains("ato.gov.au"));

        let err = EngineError::InvalidWindow("fortnightly".into());
        assert!(err.to_string().contains("fortnightly"));
        assert!(err.to_string().contains("daily"));
    }
}
