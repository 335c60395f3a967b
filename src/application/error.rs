//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add invocation-level context.
///
/// A non-zero exit code is NOT represented here by default: it comes back
/// as data in `ExecutionResult`. `CommandFailed` only occurs in opt-in
/// strict mode.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("working directory does not exist or is not a directory: {0}")]
    InvalidWorkingDirectory(PathBuf),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command exited with status {code}")]
    CommandFailed { code: i32, stderr: Option<String> },

    #[error("cannot parse state file {path}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
