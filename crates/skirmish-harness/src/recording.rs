//! Transport that records calls and emits nothing.
//!
//! Used when a test wants to play the radio by hand: it feeds events into
//! the session itself and then checks exactly which requests the session
//! made.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use skirmish_core::transport::{EndpointId, PeerTransport, TransportError};

/// One call made on a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `start_advertising(local_name, service_id)`
    StartAdvertising {
        /// Advertised name
        local_name: String,
        /// Service id
        service_id: String,
    },
    /// `start_discovery(service_id)`
    StartDiscovery(String),
    /// `stop_advertising()`
    StopAdvertising,
    /// `stop_discovery()`
    StopDiscovery,
    /// `stop_all_endpoints()`
    StopAllEndpoints,
    /// `request_connection(_, endpoint)`
    RequestConnection(EndpointId),
    /// `accept_connection(endpoint)`
    AcceptConnection(EndpointId),
    /// `disconnect_from_endpoint(endpoint)`
    Disconnect(EndpointId),
    /// `send_payload(endpoint, payload)`
    SendPayload(EndpointId, Bytes),
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<TransportCall>,
    refuse: Option<TransportError>,
}

/// Call-recording [`PeerTransport`].
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingTransport {
    /// Create an empty recorder that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every fallible call return `error` from now on.
    pub fn refuse_with(&self, error: TransportError) {
        self.lock().refuse = Some(error);
    }

    /// Accept calls again.
    pub fn accept_all(&self) {
        self.lock().refuse = None;
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Return and forget the calls recorded so far.
    pub fn take_calls(&self) -> Vec<TransportCall> {
        std::mem::take(&mut self.lock().calls)
    }

    fn record(&self, call: TransportCall) {
        self.lock().calls.push(call);
    }

    fn try_record(&self, call: TransportCall) -> Result<(), TransportError> {
        let mut recorder = self.lock();
        recorder.calls.push(call);
        match &recorder.refuse {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PeerTransport for RecordingTransport {
    fn start_advertising(&self, local_name: &str, service_id: &str) -> Result<(), TransportError> {
        self.try_record(TransportCall::StartAdvertising {
            local_name: local_name.to_string(),
            service_id: service_id.to_string(),
        })
    }

    fn start_discovery(&self, service_id: &str) -> Result<(), TransportError> {
        self.try_record(TransportCall::StartDiscovery(service_id.to_string()))
    }

    fn stop_advertising(&self) {
        self.record(TransportCall::StopAdvertising);
    }

    fn stop_discovery(&self) {
        self.record(TransportCall::StopDiscovery);
    }

    fn stop_all_endpoints(&self) {
        self.record(TransportCall::StopAllEndpoints);
    }

    fn request_connection(
        &self,
        _local_name: &str,
        endpoint: &EndpointId,
    ) -> Result<(), TransportError> {
        self.try_record(TransportCall::RequestConnection(endpoint.clone()))
    }

    fn accept_connection(&self, endpoint: &EndpointId) -> Result<(), TransportError> {
        self.try_record(TransportCall::AcceptConnection(endpoint.clone()))
    }

    fn disconnect_from_endpoint(&self, endpoint: &EndpointId) {
        self.record(TransportCall::Disconnect(endpoint.clone()));
    }

    fn send_payload(&self, endpoint: &EndpointId, payload: Bytes) -> Result<(), TransportError> {
        self.try_record(TransportCall::SendPayload(endpoint.clone(), payload))
    }
}
