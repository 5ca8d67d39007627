//! Client error types
//!
//! Callers only ever see [`ClientError`]. Any rejection by the authority
//! surfaces as `AuthenticationFailed`, and transport failures stay separate
//! so a network outage is never mistaken for a revoked session.

use thiserror::Error;

/// Failure to reach the API or read its response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Failure of a login, refresh or logout exchange with the authority
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The authority answered with an error status
    #[error("Rejected by authority ({status}): {code}")]
    Rejected { status: u16, code: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure of the durable session store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session store I/O failed: {0}")]
    Io(String),

    #[error("Stored session is unreadable: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupt(e.to_string())
    }
}

/// Error returned to callers of the client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The session is gone; the user must sign in again
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Too many requests are already waiting on the in-flight refresh
    #[error("Too many requests waiting for credential refresh")]
    WaiterQueueFull,

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<ExchangeError> for ClientError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::Rejected { .. } => Self::AuthenticationFailed,
            ExchangeError::Transport(t) => Self::Transport(t),
        }
    }
}

/// Invalid client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}
