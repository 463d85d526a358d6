//! Core error types for zinefocus-core.
//!
//! Nothing in this crate is fatal to the application: timer errors are
//! surfaced as prompts, accounting errors as notices, and unreadable
//! persisted state is replaced by defaults before it ever becomes an error.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for zinefocus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer command rejected
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Session accounting failed
    #[error("Accounting error: {0}")]
    Accounting(#[from] AccountingError),

}

/// Timer commands that were refused without touching any state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// `start` was called with no project to credit.
    #[error("Please select a project first")]
    NoProjectSelected,

    /// The session length cannot change while the countdown runs.
    #[error("Cannot change the duration while the timer is running")]
    DurationLocked,

    #[error("Duration must be between {min} and {max} minutes, got {minutes}")]
    DurationOutOfRange { minutes: u32, min: u32, max: u32 },
}

/// Failures of the external accounting calls.
///
/// These never roll back the timer: it has already reset by the time the
/// accounting call is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountingError {
    /// The focus session record could not be created.
    #[error("Failed to record focus session for project {project_id}: {message}")]
    CreateSessionFailed { project_id: String, message: String },

    /// The session was recorded but the project total was not updated.
    #[error("Failed to update total minutes for project {project_id}: {message}")]
    UpdateTotalFailed { project_id: String, message: String },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Row that was expected to exist is missing
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked
                    || code.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_project_message_is_user_facing() {
        assert_eq!(
            TimerError::NoProjectSelected.to_string(),
            "Please select a project first"
        );
    }

    #[test]
    fn timer_error_converts_into_core_error() {
        let err: CoreError = TimerError::DurationLocked.into();
        assert!(matches!(err, CoreError::Timer(TimerError::DurationLocked)));
    }

    #[test]
    fn busy_sqlite_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
    }
}
