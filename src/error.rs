//! Error taxonomy for the Zenfolio client.
//!
//! Two layers mirror the two halves of the pipeline: [`TransportError`] for
//! anything that went wrong on the wire (connection, timeout, non-2xx status,
//! redirect cap) and [`ZenfolioError`] for everything the caller sees:
//! argument validation, envelope correlation, and structured remote faults.
//!
//! Remote string codes (e.g. `E_NOSUCHOBJECT`) are surfaced as-is; the crate
//! never invents numeric codes. Nothing here is retried automatically.

use thiserror::Error;

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ZenfolioError>;

/// Transport-level failures. Safe for the caller to retry at its discretion.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Server answered with a non-2xx status
    #[error("request failed with HTTP status {status}: {reason}")]
    Status { status: u16, reason: String },

    /// DNS, connection refusal, or TLS failure
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    /// Connect or overall timeout exceeded
    #[error("request timed out")]
    Timeout,

    /// Redirect chain exceeded the configured cap
    #[error("redirect limit of {max} exceeded")]
    TooManyRedirects { max: usize },
}

/// Errors surfaced to callers of [`crate::ZenfolioClient`].
#[derive(Debug, Error)]
pub enum ZenfolioError {
    /// Caller supplied a malformed or missing input. Raised before any
    /// network activity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Response id does not echo the request id; a correlation bug or replay.
    #[error("incorrect response ID for method {method} (request ID: {expected}, response ID: {received})")]
    IdMismatch {
        method: String,
        expected: String,
        received: String,
    },

    /// Response body is not a well-formed envelope, or violates the
    /// result-XOR-error invariant.
    #[error("malformed response envelope for method {method}: {detail}")]
    InvalidEnvelope { method: String, detail: String },

    /// The remote service does not know the requested method.
    #[error("no such method: {method}")]
    BadMethodCall { method: String },

    /// Structured application error returned by Zenfolio.
    #[error("Zenfolio API error for method {method}: {code}: {message}")]
    Remote {
        method: String,
        code: String,
        message: String,
    },

    /// Wire-level failure, see [`TransportError`].
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Local I/O failure while reading an upload body.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
