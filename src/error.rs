//! Error types for taskgraph
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown id, bad config)
//! - 3: Graph violation (self-loop, dependency cycle)
//! - 4: Operation failed (IO, serialization, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tg CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const GRAPH_VIOLATION: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskgraph operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Not a taskgraph workspace: {0} (run `tg init`)")]
    NotInitialized(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    #[error("Priority rule not found: {0}")]
    RuleNotFound(String),

    // Graph violations (exit code 3)
    #[error("A task cannot relate to itself: {0}")]
    SelfLoop(String),

    #[error("Adding a dependency from {source} to {target} would create a cycle")]
    DependencyCycle { source: String, target: String },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotInitialized(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::RelationshipNotFound(_)
            | Error::RuleNotFound(_) => exit_codes::USER_ERROR,

            // Graph violations
            Error::SelfLoop(_) | Error::DependencyCycle { .. } => exit_codes::GRAPH_VIOLATION,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured detail payload for JSON output, when the error carries one
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::DependencyCycle { source, target } => Some(serde_json::json!({
                "source_task_id": source,
                "target_task_id": target,
            })),
            _ => None,
        }
    }
}

/// Result type alias for taskgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
