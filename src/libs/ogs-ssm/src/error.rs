//! SSM Error Types
//!
//! Transport and protocol errors raised while talking to the Secure
//! Storage Module

use thiserror::Error;

/// SSM client error type
#[derive(Error, Debug)]
pub enum SsmError {
    /// TCP connection or HTTP handshake error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connect, request or caller deadline elapsed
    #[error("Request timeout")]
    Timeout,

    /// Invalid URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Non-2xx HTTP status from the SSM
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// TLS/SSL error
    #[error("TLS error: {0}")]
    TlsError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Hyper error
    #[error("Hyper error: {0}")]
    HyperError(String),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Login credentials missing from configuration and environment
    #[error("SSM login credentials are not set")]
    MissingCredentials,
}

impl SsmError {
    /// Create an HTTP error from status code
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code if this is an HTTP error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            Self::Timeout => Some(408),
            _ => None,
        }
    }
}

/// Result type for SSM operations
pub type SsmResult<T> = Result<T, SsmError>;
