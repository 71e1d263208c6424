//! Lookup error types.

use thiserror::Error;

/// Errors from a batched fulfillment lookup.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The lookup client could not be configured (bad base URL, headers).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request did not complete at the network or protocol level.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The service answered, but the body carries an error message.
    #[error("Backend reported error (status {status}): {message}")]
    BackendReported { status: u16, message: String },

    /// The response could not be read into lookup records.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LookupError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a backend-reported error.
    pub fn backend(status: u16, msg: impl Into<String>) -> Self {
        Self::BackendReported {
            status,
            message: msg.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::TransportError(err.to_string())
        }
    }
}
