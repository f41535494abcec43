//! Error types for the monthly computation.

use std::path::PathBuf;
use std::time::Duration;

use hirs_common::HirsError;
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur while building or running a monthly task.
#[derive(Error, Debug)]
pub enum JobError {
    /// Upstream products are not available yet; retry later.
    #[error("HIRS_CTP_MONTHLY not ready: {0}")]
    NotReady(String),

    #[error("`{command}` failed with {}", describe_exit(.code))]
    ExternalToolFailure { command: String, code: Option<i32> },

    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    ToolTimeout { command: String, timeout: Duration },

    #[error("Declared output missing after successful run: {0}")]
    OutputMissing(PathBuf),

    #[error("Executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("Failed to stage inputs: {0}")]
    Staging(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Common(#[from] HirsError),
}

impl JobError {
    /// Only a not-ready condition is worth retrying later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::NotReady(_))
    }

    /// Exit code of a failed external tool, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            JobError::ExternalToolFailure { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

/// Result type for job operations.
pub type JobResult<T> = std::result::Result<T, JobError>;
