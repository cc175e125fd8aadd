//! # AppError
//!
//! Centralized error handling for the quiz core.
//! Transport and parse failures are both "upstream" failures; the caller
//! decides how to present them. Nothing here is ever retried.

use thiserror::Error;

/// Status and message of a non-success upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiLayerError {
    pub status: u16,
    pub message: String,
}

impl std::fmt::Display for ApiLayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Status: {}, Message: {}", self.status, self.message)
    }
}

/// A single HTTP GET against the upstream failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure
    #[error("network failure: {0}")]
    Network(String),

    /// Upstream answered with a 4xx (or otherwise non-success) status
    #[error("upstream client error: {0}")]
    Client(ApiLayerError),

    /// Upstream answered with a 5xx status
    #[error("upstream server error: {0}")]
    Server(ApiLayerError),

    /// The body could not be decompressed or is not UTF-8 text
    #[error("decompression failure: {0}")]
    Decompression(String),
}

impl TransportError {
    /// Builds the status variant matching `status`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let err = ApiLayerError {
            status,
            message: message.into(),
        };
        if (500..600).contains(&status) {
            TransportError::Server(err)
        } else {
            TransportError::Client(err)
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Client(e) | TransportError::Server(e) => Some(e.status),
            _ => None,
        }
    }

    /// Whether upstream most likely rejected the call for exceeding its
    /// request quota. Stack Exchange reports throttling as HTTP 400 with a
    /// `throttle_violation` error name, sometimes as 429.
    pub fn is_throttled(&self) -> bool {
        match self {
            TransportError::Client(e) => {
                let message = e.message.to_ascii_lowercase();
                e.status == 429 || message.contains("throttle") || message.contains("too many requests")
            }
            _ => false,
        }
    }
}

/// An upstream document did not match the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("response envelope has no `items` array")]
    MissingItems,

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Umbrella for every failure of a retrieval against upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl UpstreamError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, UpstreamError::Transport(e) if e.is_throttled())
    }
}

/// The primary error type for quiz-session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// The id resolved to zero (or more than one) upstream items
    #[error("{kind} not found with ID {id}")]
    NotFound { kind: &'static str, id: u64 },
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Upstream(err.into())
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::Upstream(err.into())
    }
}

/// A specialized Result type for quiz logic.
pub type Result<T> = std::result::Result<T, AppError>;
