//! Error types for todo-alarm
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (invalid task input, bad args, bad config)
//! - 4: Operation failed (storage, serialization, lock contention)

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Exit codes for the todo-alarm CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Rejected task input. Raised before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a task!")]
    EmptyText,

    #[error("Task is too long! Maximum {max} characters (got {len}).")]
    TextTooLong { len: usize, max: usize },

    #[error("Please select both date and time!")]
    IncompleteSchedule,

    #[error("Date and time cannot be in the past! ({due})")]
    DueInPast { due: NaiveDateTime },

    #[error("No task ids left! Clear all tasks to start over.")]
    IdsExhausted,
}

/// Main error type for todo-alarm operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Corrupt task record: {0}")]
    CorruptRecord(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::InvalidConfig(_) | Error::InvalidArgument(_) => {
                exit_codes::USER_ERROR
            }

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::CorruptRecord(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// True for failures of the durable storage surface or its encoding.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Json(_) | Error::LockFailed(_) | Error::CorruptRecord(_)
        )
    }

    /// Structured details for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation(ValidationError::TextTooLong { len, max }) => {
                Some(serde_json::json!({ "len": len, "max": max }))
            }
            Error::Validation(ValidationError::DueInPast { due }) => {
                Some(serde_json::json!({ "due": due.format("%Y-%m-%dT%H:%M").to_string() }))
            }
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for todo-alarm operations
pub type Result<T> = std::result::Result<T, Error>;
