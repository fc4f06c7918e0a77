//! Error types for doorkey operations.
//!
//! One error type is shared by every layer of the client: value construction, configuration,
//! the transport channel and the directory operations built on top of it.

use std::io;
use thiserror::Error;

/// Main error type for doorkey operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value violated its format rule, or an operation was called with invalid arguments.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The admin user id or password has not been set.
    #[error("Admin credentials are not set")]
    MissingCredentials,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The channel holds no open connection.
    #[error("Not connected")]
    NotConnected,

    /// Establishing the connection or the TLS session failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation timed out
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The peer closed the stream before a reply line arrived.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Any other I/O failure on an open connection.
    #[error("I/O error: {0}")]
    Io(String),

    /// The hash algorithm is not available on this platform.
    #[error("Hash algorithm unavailable: {0}")]
    HashUnavailable(String),
}

/// Specialized result type for doorkey operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::MissingCredentials => "MISSING_CREDENTIALS",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::NotConnected => "NOT_CONNECTED",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::Timeout(_) => "TIMEOUT",
            Self::ConnectionClosed => "CONNECTION_CLOSED",
            Self::Io(_) => "IO_ERROR",
            Self::HashUnavailable(_) => "HASH_UNAVAILABLE",
        }
    }

    /// Returns true if the error means the I/O with the server failed.
    ///
    /// Callers treat all of these alike: the request may or may not have reached the server and
    /// nothing was retried.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::ConnectionFailed(_)
                | Self::Timeout(_)
                | Self::ConnectionClosed
                | Self::Io(_)
        )
    }

    /// Returns true if the caller has to fix its input before trying again.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::MissingCredentials)
    }
}

// Conversions from external error types
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout(err.to_string()),
            io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            io::ErrorKind::NotConnected => Self::NotConnected,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::AddrNotAvailable => Self::ConnectionFailed(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}
