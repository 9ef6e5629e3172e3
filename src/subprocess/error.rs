use crate::error::ErrorCode;
use std::time::Duration;

/// Failure to run an external program at all
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("`{command}` did not finish within {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Failed to spawn `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while waiting for subprocess: {0}")]
    Io(#[from] std::io::Error),

    #[error("No scripted response for `{0}`")]
    Unscripted(String),
}

impl ProcessError {
    pub fn code(&self) -> u16 {
        match self {
            ProcessError::CommandNotFound(_) => ErrorCode::PROCESS_NOT_FOUND,
            ProcessError::Timeout { .. } => ErrorCode::PROCESS_TIMEOUT,
            ProcessError::SpawnFailed { .. } | ProcessError::Io(_) => ErrorCode::PROCESS_SPAWN,
            ProcessError::Unscripted(_) => ErrorCode::PROCESS_UNSCRIPTED,
        }
    }
}
