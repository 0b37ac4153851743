//! Error types for the skirmish session core.
//!
//! None of these errors is fatal to a session. Transport and protocol errors
//! are logged and absorbed where they occur; [`SessionError::Closed`] only
//! tells a [`crate::driver::SessionHandle`] that the driver task is gone.

use skirmish_proto::ProtocolError;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The transport refused a request
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A received payload could not be decoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The session driver has stopped and no longer accepts commands
    #[error("session driver has stopped")]
    Closed,
}

impl SessionError {
    /// Returns true if the session keeps running after this error.
    ///
    /// Only a stopped driver is terminal. Everything else is recovered
    /// locally: a failed negotiation falls back to searching, an undecodable
    /// payload is dropped.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SessionError::Closed)
    }
}
