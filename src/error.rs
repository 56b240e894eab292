//! Error types for tasktide
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad input, nobody logged in)
//! - 3: Referenced task does not exist
//! - 4: Operation failed (storage or terminal I/O)

use thiserror::Error;

use crate::models::TaskId;

/// Exit codes for the tasktide CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const NOT_FOUND: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tracker operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("No active user, log in first")]
    NoActiveUser,

    #[error("Storage error for '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn storage(key: impl Into<String>, source: std::io::Error) -> Self {
        Error::Storage {
            key: key.into(),
            source,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::NoActiveUser | Error::Config(_) => {
                exit_codes::USER_ERROR
            }
            Error::NotFound(_) => exit_codes::NOT_FOUND,
            Error::Storage { .. } | Error::Io(_) | Error::Serialize(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, Error>;
