//! Error types for the Thunder client.
//!
//! # Design
//! Three failure classes reach the caller: bad input caught before any I/O
//! (`Validation`), the transport itself failing (`Transport`), and a response
//! whose status differs from the one the endpoint promises
//! (`StatusMismatch`). The mismatch variant keeps the raw body so callers can
//! read the server's own error message.

/// Error produced by a `Transport` when the round trip itself fails.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `ThunderClient` and `Thunder` operations.
#[derive(Debug, thiserror::Error)]
pub enum ThunderError {
    /// Caller input rejected before a request was sent.
    #[error("{0}")]
    Validation(String),

    /// The transport failed (DNS, connection refused, transport timeout...).
    #[error(transparent)]
    Transport(TransportError),

    /// The server answered with a status other than the expected one.
    #[error("The status code {status} does not match expected {expected}")]
    StatusMismatch {
        status: u16,
        expected: u16,
        body: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The client was constructed with unusable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ThunderError {
    /// Status code of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ThunderError::StatusMismatch { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body attached to a status mismatch.
    pub fn body(&self) -> Option<&str> {
        match self {
            ThunderError::StatusMismatch { body, .. } => Some(body),
            _ => None,
        }
    }
}
