//! Core error types for focusmode-core.
//!
//! The taxonomy mirrors the session API boundary: validation failures,
//! unknown session ids, transport failures of a remote lifecycle, and
//! storage failures of a local store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the session lifecycle (start/end).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Malformed input to start/end
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No record with the given identifier exists
    #[error("Session not found: {id}")]
    NotFound { id: String },

    /// The lifecycle service could not be reached
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl SessionError {
    pub fn not_found(id: impl Into<String>) -> Self {
        SessionError::NotFound { id: id.into() }
    }

    /// True for errors caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SessionError::Validation(_) | SessionError::NotFound { .. })
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Session type outside focus / short_break / long_break
    #[error("Unknown session type '{0}': expected focus, short_break or long_break")]
    UnknownSessionType(String),

    /// Rejected by a remote service, message passed through verbatim
    #[error("{0}")]
    Rejected(String),
}

impl ValidationError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
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

    /// Stored row could not be decoded
    #[error("Corrupt row in '{table}': {message}")]
    CorruptRow { table: String, message: String },

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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Transport(err.to_string())
    }
}
