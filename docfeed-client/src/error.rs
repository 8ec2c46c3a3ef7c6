//! Feed client error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for feed client operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Feed client errors.
///
/// Configuration errors are only produced while constructing a
/// [`Client`](crate::Client). Everything else ends up in
/// [`SendResult::error`](crate::SendResult) and never escapes `send`.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Base URL could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// Client was constructed without any transport.
    #[error("Need at least one transport")]
    NoTransports,

    /// A configured header name or value is not valid HTTP.
    #[error("Invalid header {name}: {message}")]
    InvalidHeader {
        /// Header name as configured.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// Document id does not follow the `id:<namespace>:<type>:<selector>:<id>` scheme.
    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    /// Any other bad option, e.g. an unparseable environment variable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payload compression failed before anything was sent.
    #[error("Failed to encode request body: {0}")]
    Encoding(String),

    /// The HTTP request could not be assembled.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// The credential provider could not produce a credential.
    #[error("Failed to obtain credentials: {0}")]
    Credentials(String),

    /// Transport reported a failure without more structure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out locally.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body was not the expected JSON object.
    #[error("Failed to decode json response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error, typically while draining a response body.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Check if this error can only come from client construction.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::NoTransports | Self::InvalidHeader { .. } | Self::Config(_)
        )
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this error was raised by the network layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Http(_) | Self::Io(_)
        )
    }
}
