//! Shared error type across dualcast crates.

use thiserror::Error;

/// Error categories (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or truncated bytes at the envelope or payload layer.
    Decode,
    /// Socket or framing failure while sending or receiving.
    Transport,
    /// The application dispatcher failed on one message.
    Dispatch,
    /// Missing or out-of-range startup parameter.
    Config,
    /// A value handed to a constructor is out of range.
    InvalidArgument,
}

impl ErrorKind {
    /// String representation used in logs and test assertions.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Decode => "DECODE",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Dispatch => "DISPATCH",
            ErrorKind::Config => "CONFIG",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, DualcastError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum DualcastError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DualcastError {
    /// Map the error to its stable category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DualcastError::Decode(_) => ErrorKind::Decode,
            DualcastError::Transport(_) => ErrorKind::Transport,
            DualcastError::Dispatch(_) => ErrorKind::Dispatch,
            DualcastError::Config(_) => ErrorKind::Config,
            DualcastError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        DualcastError::Decode(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        DualcastError::Transport(msg.into())
    }

    pub fn dispatch(msg: impl Into<String>) -> Self {
        DualcastError::Dispatch(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DualcastError::Config(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        DualcastError::InvalidArgument(msg.into())
    }
}
