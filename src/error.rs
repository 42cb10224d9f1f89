//! Error taxonomy for the recording core

use serde::{Deserialize, Serialize};

/// Errors produced by the recording core and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    /// Directory, delete or write failure on the storage side
    #[error("storage error: {0}")]
    Storage(String),

    /// Device or segment open/close failure reported by the capture port
    #[error("capture error: {0}")]
    Capture(String),

    /// Concurrency conflict - a start request while a session is active
    #[error("a recording session is already active")]
    SessionActive,

    /// Permission failure reported by the caller, never derived internally
    #[error("permission denied: {0}")]
    Permission(String),

    /// Missing or invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Anything that does not fit the taxonomy
    #[error("{0}")]
    Unknown(String),
}

impl RecorderError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The event-facing kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(_) => ErrorKind::Storage,
            Self::Capture(_) => ErrorKind::Capture,
            Self::SessionActive => ErrorKind::Service,
            Self::Permission(_) => ErrorKind::Permission,
            Self::Config(_) => ErrorKind::Config,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// Error classification carried by error events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Storage,
    Capture,
    Service,
    Permission,
    Config,
    Unknown,
}

pub type RecorderResult<T> = Result<T, RecorderError>;
