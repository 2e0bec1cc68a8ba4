//! Core error types for daybook-core.
//!
//! This module defines the error hierarchy using thiserror. Each store and
//! state machine returns one of the specific enums; they all convert into
//! [`CoreError`] for callers that don't care about the distinction.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for daybook-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// kv store failures
    #[error("storage: {0}")]
    Database(#[from] DatabaseError),

    /// config.toml and data directory failures
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Rejected input
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Rejected task list transition
    #[error("{0}")]
    Task(#[from] TaskError),

    /// Backup export/import failures
    #[error("backup: {0}")]
    Backup(#[from] BackupError),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A stored or imported blob did not match its type
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("cannot open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("schema setup failed: {0}")]
    MigrationFailed(String),

    /// Another process holds the database
    #[error("database is busy or locked")]
    Locked,
}

/// Errors reading or changing `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("cannot write {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path that names no field
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Value that does not parse as the field's type
    #[error("bad value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("data directory unavailable: {0}")]
    DataDir(String),
}

/// Input rejected before any state changes.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming
    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("position {index} is outside {collection} ({len} entries)")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A record with this id already exists
    #[error("Duplicate id '{0}'")]
    DuplicateId(String),

    /// Record not found in a collection
    #[error("No {collection} record with id '{id}'")]
    NotFound { collection: String, id: String },

    /// End precedes start
    #[error("Invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange { start: String, end: String },
}

/// Task list transition errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// No task with this id
    #[error("Task not found: {0}")]
    NotFound(String),

    /// Completed or failed tasks cannot become active
    #[error("Task {0} is completed or failed and cannot be activated")]
    NotActivatable(String),

    /// Operation only valid on priority tasks
    #[error("Task {0} is not a priority task")]
    NotPriority(String),

    /// No task carries this group id
    #[error("Group not found: {0}")]
    GroupNotFound(String),
}

/// Backup-specific errors.
#[derive(Error, Debug)]
pub enum BackupError {
    /// Backup was written by an incompatible format version
    #[error("Unsupported backup format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Data section does not hash to the recorded checksum
    #[error("Backup checksum mismatch: file is corrupt or was edited")]
    ChecksumMismatch,

    /// Failed to read or write the backup file
    #[error("Failed to access backup file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg)
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result with [`CoreError`] as the default error.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
