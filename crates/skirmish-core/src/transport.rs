//! Transport abstraction for nearby peer-to-peer links.
//!
//! The `PeerTransport` trait is the only way the session core reaches the
//! radio. It models a Nearby-Connections-style engine:
//!
//! - **Advertising**: broadcast local presence under a service id
//! - **Discovery**: scan for advertisers of the same service id
//! - **Connections**: request / accept a link to a discovered endpoint
//! - **Payloads**: send message-atomic byte payloads over an established link
//!
//! # Fire-and-Forget
//!
//! Every call returns immediately. Outcomes arrive later as
//! [`TransportEvent`]s on a channel owned by whoever drives the session. A
//! returned `Ok(())` only means the request was handed to the engine.
//!
//! # Implementations
//!
//! - **Production**: a binding to the platform's nearby engine (BLE, Wi-Fi
//!   Direct, ...), outside this workspace
//! - **`SimTransport`** (skirmish-harness): in-memory radio with fault
//!   injection
//!
//! # What We're NOT Modelling
//!
//! - Multi-hop or mesh topologies
//! - Payload fragmentation (payloads are a handful of bytes)
//! - Channel encryption or authentication digits

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque transport-level address of a remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    /// Wrap a transport-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EndpointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Progress of a single payload transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Bytes are still moving
    InProgress,
    /// Transfer finished successfully
    Success,
    /// Transfer failed
    Failure,
    /// Transfer was cancelled by either side
    Canceled,
}

/// Asynchronous notifications delivered by the transport.
///
/// Events for a single endpoint arrive in the order the engine produced them.
/// Events for different endpoints may interleave arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Discovery found an advertiser of our service
    EndpointFound {
        /// Address of the advertiser
        endpoint: EndpointId,
        /// Name the advertiser broadcasts
        name: String,
    },

    /// A previously found advertiser is gone
    EndpointLost {
        /// Address of the advertiser
        endpoint: EndpointId,
    },

    /// A connection with `endpoint` is being set up (by either side) and is
    /// waiting for local acceptance
    ConnectionInitiated {
        /// Remote side of the pending connection
        endpoint: EndpointId,
        /// Remote display name
        name: String,
    },

    /// Final outcome of a connection attempt
    ConnectionResult {
        /// Remote side of the attempt
        endpoint: EndpointId,
        /// Whether both sides accepted and the link is up
        success: bool,
    },

    /// An established link went away
    Disconnected {
        /// Remote side of the link
        endpoint: EndpointId,
    },

    /// A complete payload arrived from `endpoint`
    PayloadReceived {
        /// Sender
        endpoint: EndpointId,
        /// Payload bytes, delivered atomically
        payload: Bytes,
    },

    /// Transfer progress for a payload sent to, or received from, `endpoint`.
    ///
    /// Fires for outgoing and incoming payloads alike.
    PayloadTransferUpdate {
        /// Remote side of the transfer
        endpoint: EndpointId,
        /// Current status
        status: TransferStatus,
    },
}

impl TransportEvent {
    /// The remote endpoint this event concerns.
    #[must_use]
    pub fn endpoint(&self) -> &EndpointId {
        match self {
            Self::EndpointFound { endpoint, .. }
            | Self::EndpointLost { endpoint }
            | Self::ConnectionInitiated { endpoint, .. }
            | Self::ConnectionResult { endpoint, .. }
            | Self::Disconnected { endpoint }
            | Self::PayloadReceived { endpoint, .. }
            | Self::PayloadTransferUpdate { endpoint, .. } => endpoint,
        }
    }
}

/// Errors a transport may report synchronously when handed a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No established link to this endpoint
    #[error("not connected to endpoint {0}")]
    NotConnected(EndpointId),

    /// The engine has never heard of this endpoint
    #[error("unknown endpoint {0}")]
    UnknownEndpoint(EndpointId),

    /// The engine refused the request (radio off, missing capability, ...)
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Nearby transport capability consumed by the session core.
///
/// Implementations take `&self`: the platform engine is a shared client
/// handle, and calls never block.
pub trait PeerTransport: Send + Sync + 'static {
    /// Start broadcasting `local_name` under `service_id`.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the engine cannot advertise.
    fn start_advertising(&self, local_name: &str, service_id: &str) -> Result<(), TransportError>;

    /// Start scanning for advertisers of `service_id`.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the engine cannot scan.
    fn start_discovery(&self, service_id: &str) -> Result<(), TransportError>;

    /// Stop advertising. No-op if not advertising.
    fn stop_advertising(&self);

    /// Stop discovery. No-op if not discovering.
    fn stop_discovery(&self);

    /// Drop every pending and established connection. Safe to call at any
    /// time.
    fn stop_all_endpoints(&self);

    /// Ask `endpoint` for a connection, introducing ourselves as
    /// `local_name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEndpoint` if the endpoint was never discovered.
    fn request_connection(
        &self,
        local_name: &str,
        endpoint: &EndpointId,
    ) -> Result<(), TransportError>;

    /// Accept a pending connection and start receiving its payloads.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEndpoint` if there is no pending connection.
    fn accept_connection(&self, endpoint: &EndpointId) -> Result<(), TransportError>;

    /// Tear down the connection with `endpoint`, pending or established.
    fn disconnect_from_endpoint(&self, endpoint: &EndpointId);

    /// Send one message-atomic payload.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if no link to `endpoint` is established.
    fn send_payload(&self, endpoint: &EndpointId, payload: Bytes) -> Result<(), TransportError>;
}
