//! Search gateway error types.

use thiserror::Error;

/// Errors from executing a grouped search.
#[derive(Debug, Clone, Error)]
pub enum SearchGatewayError {
    /// Failed to build a client for the search backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete at the network or protocol level.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The backend answered, but reported a failure in the response.
    #[error("Backend reported error (status {status}): {message}")]
    BackendReported { status: u16, message: String },

    /// The response body could not be read into grouped hits.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchGatewayError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
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
