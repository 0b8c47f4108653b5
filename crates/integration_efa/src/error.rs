//! EFA error types

use thiserror::Error;

/// Errors that can occur while talking to an EFA server
#[derive(Debug, Error)]
pub enum EfaError {
    /// The request could not be sent or the response body could not be read
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport deadline elapsed before a response arrived
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },

    /// The server answered with a non-success HTTP status
    #[error("Server returned HTTP {0}")]
    HttpStatus(u16),

    /// The response body is not an EFA document this client understands
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The response was decoded but the stop was not identified
    #[error("Stop does not exist or name is not unique (state: {state})")]
    StopNotResolved {
        /// State token reported by the server
        state: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EfaError {
    /// Returns true if the failure happened before a response could be decoded
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::HttpStatus(_)
        )
    }

    /// Returns true if repeating the same call may succeed
    ///
    /// The client itself never retries; this is a hint for callers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.is_transport()
    }

    /// Returns true if the server could not resolve the requested stop
    #[must_use]
    pub const fn is_stop_not_resolved(&self) -> bool {
        matches!(self, Self::StopNotResolved { .. })
    }
}
