// ============================================================================
// cutlist-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error taxonomy for the edit pipeline
//
// Every fallible operation in the library returns `CoreResult<T>`. The
// variants split into one recoverable class (`Parameter`, which degrades the
// offending operation to a passthrough copy) and a set of run-aborting
// classes (asset resolution, engine failures, exhaustive silence removal).
//
// KEY COMPONENTS:
// - CoreError: The library error enum
// - CoreResult: Result alias used throughout the crate
// - command_*_error: Constructors for engine process failures

use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced by the edit pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required operation parameter is missing or malformed.
    #[error("Invalid parameters for '{kind}': {message}")]
    Parameter { kind: String, message: String },

    /// An asset reference could not be turned into a local file.
    #[error("Failed to resolve asset '{reference}': {message}")]
    AssetResolution { reference: String, message: String },

    #[error("Failed to start {command}: {message}")]
    CommandStart { command: String, message: String },

    #[error("Failed while waiting for {command}: {source}")]
    CommandWait {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Every part of the input is silent, so nothing would be kept.
    #[error("All video would be removed: the whole input is silent")]
    ExhaustiveRemoval,

    #[error("ffprobe error: {0}")]
    FfprobeParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for cutlist operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Builds a parameter error for an operation kind.
    pub fn parameter(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Parameter {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Builds an asset resolution error for a reference.
    pub fn asset(reference: impl Into<String>, message: impl std::fmt::Display) -> Self {
        CoreError::AssetResolution {
            reference: reference.into(),
            message: message.to_string(),
        }
    }

    /// True for errors that degrade a single operation instead of aborting the run.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::Parameter { .. })
    }

    /// True for failures raised by the external engine process.
    #[must_use]
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            CoreError::CommandStart { .. }
                | CoreError::CommandWait { .. }
                | CoreError::CommandFailed { .. }
        )
    }
}

/// Creates an error for a process that could not be started.
pub fn command_start_error(command: impl Into<String>, err: impl std::fmt::Display) -> CoreError {
    CoreError::CommandStart {
        command: command.into(),
        message: err.to_string(),
    }
}

/// Creates an error for a process whose exit could not be collected.
pub fn command_wait_error(command: impl Into<String>, source: std::io::Error) -> CoreError {
    CoreError::CommandWait {
        command: command.into(),
        source,
    }
}

/// Creates an error for a process that exited unsuccessfully.
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        command: command.into(),
        status: status.to_string(),
        stderr: stderr.into(),
    }
}
