//! Backend transport error types.

use thiserror::Error;

/// Errors that can occur while talking to the search backend.
///
/// Transient errors are retried inside the client and only surface after
/// the retry budget is exhausted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// A transient failure (timeout, 5xx, rate limit) that persisted
    /// through all retry attempts.
    #[error("Transient backend error after {attempts} attempts: {message}")]
    Transient { attempts: u32, message: String },

    /// A non-retryable failure (malformed query, auth failure).
    #[error("Backend error: {0}")]
    Fatal(String),

    /// The backend responded with a shape this client does not understand.
    #[error("Failed to parse backend response: {0}")]
    Parse(String),
}

impl BackendError {
    /// Create a transient error after retry exhaustion.
    pub fn transient(attempts: u32, message: impl Into<String>) -> Self {
        Self::Transient {
            attempts,
            message: message.into(),
        }
    }

    /// Create a fatal error.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
