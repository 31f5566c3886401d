//! Error types for the SiliconCloud adapter

use std::fmt;
use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Main error type for the adapter
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("{0}")]
    Classified(#[from] ClassifiedError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Usage tracking error: {0}")]
    Usage(String),
}

impl AdapterError {
    /// Whether the retry policy may attempt the call again
    pub fn is_retryable(&self) -> bool {
        match self {
            AdapterError::Classified(e) => e.retryable,
            _ => false,
        }
    }

    /// Classification of the failure, if it came from the provider call
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AdapterError::Classified(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// Failure categories reported by a provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    AuthFailed,
    EndpointNotFound,
    ServerTransient,
    MalformedResponse,
    ConnectionFailed,
    Unclassified,
}

impl ErrorKind {
    /// Retryability assigned to errors of this kind when they are raised
    pub fn default_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited
                | ErrorKind::ServerTransient
                | ErrorKind::ConnectionFailed
                | ErrorKind::MalformedResponse
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::AuthFailed => "authentication failed",
            ErrorKind::EndpointNotFound => "endpoint not found",
            ErrorKind::ServerTransient => "server error",
            ErrorKind::MalformedResponse => "invalid response",
            ErrorKind::ConnectionFailed => "connection failed",
            ErrorKind::Unclassified => "request failed",
        };
        f.write_str(name)
    }
}

/// A provider failure tagged with its kind and retryability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    /// Set when a connection failure was a timeout
    pub timeout: bool,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.default_retryable(),
            timeout: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthFailed, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EndpointNotFound, message)
    }

    pub fn server_transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerTransient, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unclassified, message)
    }

    /// Map a transport failure from reqwest
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let mut classified = Self::new(ErrorKind::ConnectionFailed, err.to_string());
        classified.timeout = err.is_timeout();
        classified
    }
}

impl From<config::ConfigError> for AdapterError {
    fn from(err: config::ConfigError) -> Self {
        AdapterError::Config(err.to_string())
    }
}
