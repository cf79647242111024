//! Error types for the Dubbo client.

use thiserror::Error;

/// Frame-level decode failure.
///
/// `Incomplete` is a normal "wait for more bytes" signal from the receive
/// accumulator and is never surfaced as a call failure. `InvalidMagic` is
/// fatal to the connection that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The buffer does not yet hold a complete header + body.
    #[error("incomplete frame: have {available} bytes, need {needed}")]
    Incomplete { available: usize, needed: usize },

    /// The first two bytes do not match the protocol magic.
    #[error("invalid magic: 0x{found:04x}")]
    InvalidMagic { found: u16 },
}

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum DubboError {
    /// Malformed call input. Local, no network I/O was performed.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Wire-format violation or incomplete frame.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The remote endpoint refused the TCP connection.
    #[error("connection refused by {0}")]
    ConnectionRefused(String),

    /// Connection establishment exceeded the connect timeout.
    #[error("connect timeout to {0}")]
    ConnectTimeout(String),

    /// The transport errored or was closed by the peer.
    #[error("connection reset")]
    ConnectionReset,

    /// The connection carrying this call failed before its response arrived.
    #[error("connection lost")]
    ConnectionLost,

    /// Deadline elapsed while awaiting the correlated response.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Response status was not OK; carries the remote-supplied message.
    #[error("remote error: {0}")]
    Remote(String),

    /// Declared body length exceeds the configured maximum.
    #[error("body size {size} exceeds maximum {max}")]
    BodyTooLarge { size: u32, max: u32 },

    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using [`DubboError`].
pub type Result<T> = std::result::Result<T, DubboError>;
