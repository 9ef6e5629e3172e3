use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

use crate::subprocess::ProcessError;

/// Result alias used throughout the lifecycle engine
pub type OcdcResult<T> = Result<T, OcdcError>;

/// The unified error type for the workspace lifecycle engine
#[derive(Error, Debug)]
pub enum OcdcError {
    #[error(
        "[E{code:04}] Timed out after {waited:?} waiting for lock {path}",
        code = ErrorCode::LOCK_TIMEOUT,
        path = .path.display()
    )]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error(
        "[E{code:04}] Failed to acquire lock {path}: {source}",
        code = ErrorCode::LOCK_FAILED,
        path = .path.display()
    )]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "[E{code:04}] No free port in range {start}-{end}",
        code = ErrorCode::PORT_RANGE_EXHAUSTED
    )]
    RangeExhausted { start: u16, end: u16 },

    #[error(
        "[E{code:04}] I/O error on {path}: {source}",
        code = ErrorCode::STATE_IO,
        path = .path.display()
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "[E{code:04}] Serialization error: {0}",
        code = ErrorCode::STATE_SERIALIZATION
    )]
    Serialization(#[from] serde_json::Error),

    #[error("[E{code:04}] Configuration error: {0}", code = ErrorCode::CONFIG_INVALID)]
    Config(String),

    #[error(
        "[E{code:04}] Configuration file not found: {path}",
        code = ErrorCode::CONFIG_NOT_FOUND,
        path = .0.display()
    )]
    ConfigNotFound(PathBuf),

    #[error("[E{code:04}] {0}", code = .0.code())]
    Process(#[from] ProcessError),
}

impl OcdcError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Numeric code from the error registry
    pub fn code(&self) -> u16 {
        match self {
            Self::LockTimeout { .. } => ErrorCode::LOCK_TIMEOUT,
            Self::Lock { .. } => ErrorCode::LOCK_FAILED,
            Self::RangeExhausted { .. } => ErrorCode::PORT_RANGE_EXHAUSTED,
            Self::Io { .. } => ErrorCode::STATE_IO,
            Self::Serialization(_) => ErrorCode::STATE_SERIALIZATION,
            Self::Config(_) => ErrorCode::CONFIG_INVALID,
            Self::ConfigNotFound(_) => ErrorCode::CONFIG_NOT_FOUND,
            Self::Process(err) => err.code(),
        }
    }

    /// Short hint shown to users next to the error
    pub fn user_hint(&self) -> Option<String> {
        match self {
            Self::LockTimeout { path, .. } => Some(format!(
                "another ocdc process may be holding {}; retry, or remove it if no ocdc process is running",
                path.display()
            )),
            Self::RangeExhausted { start, end } => Some(format!(
                "release unused workspaces or widen the port range (currently {start}-{end})"
            )),
            _ => None,
        }
    }
}
