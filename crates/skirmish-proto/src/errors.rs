//! Error types for the skirmish wire format.
//!
//! All errors are structured, testable, and provide actionable information.

use thiserror::Error;

/// Errors that can occur while decoding a round payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload carried no bytes at all
    #[error("empty payload")]
    Empty,

    /// Payload exceeds the longest known token
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Payload bytes are not valid UTF-8
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload decoded to text that names no known choice
    #[error("unknown choice token: {0:?}")]
    UnknownToken(String),
}

/// Convenient Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
