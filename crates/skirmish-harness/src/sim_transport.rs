//! In-memory nearby radio implementing `PeerTransport`.
//!
//! A [`SimMedium`] is the shared air between simulated players. Each player
//! joins it and gets a [`SimTransport`] plus the receiving end of its event
//! channel. Transport calls update the medium and queue events for the
//! affected stations; nothing is delivered until the caller drains the
//! channels, so delivery order is fully controlled by the test.
//!
//! # Modelled Behaviour
//!
//! - **Discovery**: a discovering station gets `EndpointFound` for every
//!   advertiser of the same service id, whichever of the two started first
//! - **Connections**: a request opens a pending link and sends
//!   `ConnectionInitiated` to both sides; once both sides accept, both get
//!   `ConnectionResult(success)`
//! - **Simultaneous requests**: a request between two stations that already
//!   share a pending link joins that link instead of opening a second one
//! - **Teardown**: the remote side of a removed link gets `Disconnected` if it
//!   was established, `ConnectionResult(failure)` if it was still pending
//! - **Payloads**: delivered whole, followed by a `Success` transfer update on
//!   both sides
//!
//! # Fault Injection
//!
//! [`FaultConfig`] rejects connection requests or duplicates transfer
//! updates. Arbitrary events (corrupt payloads, spurious results) can be
//! pushed with [`SimMedium::inject`].

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use skirmish_core::transport::{
    EndpointId, PeerTransport, TransferStatus, TransportError, TransportEvent,
};
use tokio::sync::mpsc;

/// Faults applied by the medium to every station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultConfig {
    /// Every connection request fails with `ConnectionResult(failure)`
    pub reject_connections: bool,
    /// Every transfer update is delivered twice
    pub duplicate_transfer_updates: bool,
}

#[derive(Debug)]
struct Station {
    advertising: Option<Advert>,
    discovering: Option<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

#[derive(Debug, Clone)]
struct Advert {
    name: String,
    service_id: String,
}

#[derive(Debug, Clone)]
struct Link {
    requester: EndpointId,
    target: EndpointId,
    requester_accepted: bool,
    target_accepted: bool,
    established: bool,
}

impl Link {
    fn joins(&self, a: &EndpointId, b: &EndpointId) -> bool {
        (self.requester == *a && self.target == *b) || (self.requester == *b && self.target == *a)
    }

    fn involves(&self, endpoint: &EndpointId) -> bool {
        self.requester == *endpoint || self.target == *endpoint
    }

    fn other(&self, endpoint: &EndpointId) -> &EndpointId {
        if self.requester == *endpoint { &self.target } else { &self.requester }
    }
}

#[derive(Debug, Default)]
struct MediumState {
    stations: BTreeMap<EndpointId, Station>,
    links: Vec<Link>,
    faults: FaultConfig,
}

impl MediumState {
    fn deliver(&self, to: &EndpointId, event: TransportEvent) {
        let Some(station) = self.stations.get(to) else {
            return;
        };

        if station.events.send(event).is_err() {
            tracing::trace!(endpoint = %to, "station stopped listening, event dropped");
        }
    }

    fn advert(&self, endpoint: &EndpointId) -> Option<&Advert> {
        self.stations.get(endpoint).and_then(|station| station.advertising.as_ref())
    }

    fn link_index(&self, a: &EndpointId, b: &EndpointId) -> Option<usize> {
        self.links.iter().position(|link| link.joins(a, b))
    }

    // Tell the remote side of a removed link what happened
    fn tear_down(&self, link: &Link, local: &EndpointId) {
        let remote = link.other(local);
        let event = if link.established {
            TransportEvent::Disconnected { endpoint: local.clone() }
        } else {
            TransportEvent::ConnectionResult { endpoint: local.clone(), success: false }
        };
        self.deliver(remote, event);
    }

    fn transfer_update(&self, to: &EndpointId, remote: &EndpointId) {
        let copies = if self.faults.duplicate_transfer_updates { 2 } else { 1 };
        for _ in 0..copies {
            self.deliver(to, TransportEvent::PayloadTransferUpdate {
                endpoint: remote.clone(),
                status: TransferStatus::Success,
            });
        }
    }
}

/// Shared radio medium for simulated players.
///
/// Cloning yields another handle to the same medium.
#[derive(Debug, Clone, Default)]
pub struct SimMedium {
    state: Arc<Mutex<MediumState>>,
}

impl SimMedium {
    /// Create an empty medium with no faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station reachable as `endpoint`.
    ///
    /// Returns its transport and the channel its events arrive on. Joining
    /// again with the same id replaces the previous station.
    pub fn join(
        &self,
        endpoint: impl Into<EndpointId>,
    ) -> (SimTransport, mpsc::UnboundedReceiver<TransportEvent>) {
        let endpoint = endpoint.into();
        let (events, receiver) = mpsc::unbounded_channel();

        self.lock()
            .stations
            .insert(endpoint.clone(), Station { advertising: None, discovering: None, events });

        (SimTransport { medium: self.clone(), endpoint }, receiver)
    }

    /// Replace the active faults.
    pub fn set_faults(&self, faults: FaultConfig) {
        self.lock().faults = faults;
    }

    /// Queue an arbitrary event for `to`, bypassing the medium's rules.
    pub fn inject(&self, to: &EndpointId, event: TransportEvent) {
        self.lock().deliver(to, event);
    }

    /// Number of established links `endpoint` takes part in.
    pub fn established_links(&self, endpoint: &EndpointId) -> usize {
        self.lock().links.iter().filter(|link| link.established && link.involves(endpoint)).count()
    }

    /// Whether `a` and `b` share an established link.
    pub fn is_connected(&self, a: &EndpointId, b: &EndpointId) -> bool {
        self.lock().links.iter().any(|link| link.established && link.joins(a, b))
    }

    /// Whether `endpoint` is advertising.
    pub fn is_advertising(&self, endpoint: &EndpointId) -> bool {
        self.lock().advert(endpoint).is_some()
    }

    /// Whether `endpoint` is discovering.
    pub fn is_discovering(&self, endpoint: &EndpointId) -> bool {
        self.lock().stations.get(endpoint).is_some_and(|station| station.discovering.is_some())
    }

    /// All station ids, in order.
    pub fn stations(&self) -> Vec<EndpointId> {
        self.lock().stations.keys().cloned().collect()
    }

    // Single-threaded simulation: a poisoned lock only follows a test panic
    fn lock(&self) -> MutexGuard<'_, MediumState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One station's view of a [`SimMedium`].
#[derive(Debug, Clone)]
pub struct SimTransport {
    medium: SimMedium,
    endpoint: EndpointId,
}

impl SimTransport {
    /// This station's address, as seen by other stations.
    pub fn endpoint(&self) -> &EndpointId {
        &self.endpoint
    }

    /// The medium this station is on.
    pub fn medium(&self) -> &SimMedium {
        &self.medium
    }

    fn remove_links(&self, filter: impl Fn(&Link) -> bool) {
        let mut state = self.medium.lock();
        let (removed, kept): (Vec<_>, Vec<_>) =
            state.links.drain(..).partition(|link| link.involves(&self.endpoint) && filter(link));
        state.links = kept;

        for link in &removed {
            state.tear_down(link, &self.endpoint);
        }
    }
}

impl PeerTransport for SimTransport {
    fn start_advertising(&self, local_name: &str, service_id: &str) -> Result<(), TransportError> {
        let mut state = self.medium.lock();
        let advert = Advert { name: local_name.to_string(), service_id: service_id.to_string() };

        let Some(station) = state.stations.get_mut(&self.endpoint) else {
            return Err(TransportError::Unavailable(format!("{} left the medium", self.endpoint)));
        };
        station.advertising = Some(advert);

        let listeners: Vec<EndpointId> = state
            .stations
            .iter()
            .filter(|(id, station)| {
                **id != self.endpoint && station.discovering.as_deref() == Some(service_id)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for listener in listeners {
            state.deliver(&listener, TransportEvent::EndpointFound {
                endpoint: self.endpoint.clone(),
                name: local_name.to_string(),
            });
        }

        Ok(())
    }

    fn start_discovery(&self, service_id: &str) -> Result<(), TransportError> {
        let mut state = self.medium.lock();

        let Some(station) = state.stations.get_mut(&self.endpoint) else {
            return Err(TransportError::Unavailable(format!("{} left the medium", self.endpoint)));
        };
        station.discovering = Some(service_id.to_string());

        let found: Vec<(EndpointId, String)> = state
            .stations
            .iter()
            .filter(|(id, _)| **id != self.endpoint)
            .filter_map(|(id, station)| {
                station
                    .advertising
                    .as_ref()
                    .filter(|advert| advert.service_id == service_id)
                    .map(|advert| (id.clone(), advert.name.clone()))
            })
            .collect();

        for (endpoint, name) in found {
            state.deliver(&self.endpoint, TransportEvent::EndpointFound { endpoint, name });
        }

        Ok(())
    }

    fn stop_advertising(&self) {
        let mut state = self.medium.lock();

        let Some(advert) =
            state.stations.get_mut(&self.endpoint).and_then(|station| station.advertising.take())
        else {
            return;
        };

        let listeners: Vec<EndpointId> = state
            .stations
            .iter()
            .filter(|(id, station)| {
                **id != self.endpoint
                    && station.discovering.as_deref() == Some(advert.service_id.as_str())
            })
            .map(|(id, _)| id.clone())
            .collect();

        for listener in listeners {
            state.deliver(&listener, TransportEvent::EndpointLost { endpoint: self.endpoint.clone() });
        }
    }

    fn stop_discovery(&self) {
        if let Some(station) = self.medium.lock().stations.get_mut(&self.endpoint) {
            station.discovering = None;
        }
    }

    fn stop_all_endpoints(&self) {
        self.remove_links(|_| true);
    }

    fn request_connection(
        &self,
        local_name: &str,
        endpoint: &EndpointId,
    ) -> Result<(), TransportError> {
        let mut state = self.medium.lock();

        if !state.stations.contains_key(endpoint) {
            return Err(TransportError::UnknownEndpoint(endpoint.clone()));
        }

        if state.link_index(&self.endpoint, endpoint).is_some() {
            tracing::trace!(from = %self.endpoint, to = %endpoint, "request joins existing link");
            return Ok(());
        }

        let Some(remote_name) = state.advert(endpoint).map(|advert| advert.name.clone()) else {
            state.deliver(&self.endpoint, TransportEvent::ConnectionResult {
                endpoint: endpoint.clone(),
                success: false,
            });
            return Ok(());
        };

        if state.faults.reject_connections {
            state.deliver(&self.endpoint, TransportEvent::ConnectionResult {
                endpoint: endpoint.clone(),
                success: false,
            });
            return Ok(());
        }

        state.links.push(Link {
            requester: self.endpoint.clone(),
            target: endpoint.clone(),
            requester_accepted: false,
            target_accepted: false,
            established: false,
        });

        state.deliver(&self.endpoint, TransportEvent::ConnectionInitiated {
            endpoint: endpoint.clone(),
            name: remote_name,
        });
        state.deliver(endpoint, TransportEvent::ConnectionInitiated {
            endpoint: self.endpoint.clone(),
            name: local_name.to_string(),
        });

        Ok(())
    }

    fn accept_connection(&self, endpoint: &EndpointId) -> Result<(), TransportError> {
        let mut state = self.medium.lock();

        let Some(index) = state.link_index(&self.endpoint, endpoint) else {
            return Err(TransportError::UnknownEndpoint(endpoint.clone()));
        };

        let link = &mut state.links[index];
        if link.requester == self.endpoint {
            link.requester_accepted = true;
        } else {
            link.target_accepted = true;
        }

        if link.established || !(link.requester_accepted && link.target_accepted) {
            return Ok(());
        }
        link.established = true;

        state.deliver(&self.endpoint, TransportEvent::ConnectionResult {
            endpoint: endpoint.clone(),
            success: true,
        });
        state.deliver(endpoint, TransportEvent::ConnectionResult {
            endpoint: self.endpoint.clone(),
            success: true,
        });

        Ok(())
    }

    fn disconnect_from_endpoint(&self, endpoint: &EndpointId) {
        self.remove_links(|link| link.involves(endpoint));
    }

    fn send_payload(&self, endpoint: &EndpointId, payload: Bytes) -> Result<(), TransportError> {
        let state = self.medium.lock();

        let linked =
            state.links.iter().any(|link| link.established && link.joins(&self.endpoint, endpoint));
        if !linked {
            return Err(TransportError::NotConnected(endpoint.clone()));
        }

        state.deliver(endpoint, TransportEvent::PayloadReceived {
            endpoint: self.endpoint.clone(),
            payload,
        });
        state.transfer_update(endpoint, &self.endpoint);
        state.transfer_update(&self.endpoint, endpoint);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(receiver: &mut mpsc::UnboundedReceiver<TransportEvent>) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn discovery_finds_earlier_advertiser() {
        let medium = SimMedium::new();
        let (a, _a_rx) = medium.join("a");
        let (b, mut b_rx) = medium.join("b");

        a.start_advertising("Alice", "svc").unwrap();
        b.start_discovery("svc").unwrap();

        assert_eq!(drain(&mut b_rx), vec![TransportEvent::EndpointFound {
            endpoint: "a".into(),
            name: "Alice".to_string(),
        }]);
    }

    #[test]
    fn discovery_ignores_other_services() {
        let medium = SimMedium::new();
        let (a, _a_rx) = medium.join("a");
        let (b, mut b_rx) = medium.join("b");

        b.start_discovery("svc").unwrap();
        a.start_advertising("Alice", "other").unwrap();

        assert!(drain(&mut b_rx).is_empty());
    }

    #[test]
    fn mutual_accept_establishes_link() {
        let medium = SimMedium::new();
        let (a, mut a_rx) = medium.join("a");
        let (b, mut b_rx) = medium.join("b");
        b.start_advertising("Bob", "svc").unwrap();

        a.request_connection("Alice", &"b".into()).unwrap();
        assert!(matches!(
            drain(&mut b_rx).as_slice(),
            [TransportEvent::ConnectionInitiated { name, .. }] if name == "Alice"
        ));
        drain(&mut a_rx);

        a.accept_connection(&"b".into()).unwrap();
        assert!(!medium.is_connected(&"a".into(), &"b".into()));
        b.accept_connection(&"a".into()).unwrap();

        assert!(medium.is_connected(&"a".into(), &"b".into()));
        assert_eq!(drain(&mut a_rx), vec![TransportEvent::ConnectionResult {
            endpoint: "b".into(),
            success: true,
        }]);
    }

    #[test]
    fn simultaneous_requests_share_one_link() {
        let medium = SimMedium::new();
        let (a, _a_rx) = medium.join("a");
        let (b, _b_rx) = medium.join("b");
        a.start_advertising("Alice", "svc").unwrap();
        b.start_advertising("Bob", "svc").unwrap();

        a.request_connection("Alice", &"b".into()).unwrap();
        b.request_connection("Bob", &"a".into()).unwrap();
        a.accept_connection(&"b".into()).unwrap();
        b.accept_connection(&"a".into()).unwrap();

        assert_eq!(medium.established_links(&"a".into()), 1);
    }

    #[test]
    fn send_without_link_fails() {
        let medium = SimMedium::new();
        let (a, _a_rx) = medium.join("a");
        let _b = medium.join("b");

        assert_eq!(
            a.send_payload(&"b".into(), Bytes::from_static(b"ROCK")),
            Err(TransportError::NotConnected("b".into()))
        );
    }

    #[test]
    fn disconnect_notifies_remote_only() {
        let medium = SimMedium::new();
        let (a, mut a_rx) = medium.join("a");
        let (b, mut b_rx) = medium.join("b");
        b.start_advertising("Bob", "svc").unwrap();
        a.request_connection("Alice", &"b".into()).unwrap();
        a.accept_connection(&"b".into()).unwrap();
        b.accept_connection(&"a".into()).unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);

        a.disconnect_from_endpoint(&"b".into());

        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(drain(&mut b_rx), vec![TransportEvent::Disconnected { endpoint: "a".into() }]);
        assert_eq!(medium.established_links(&"b".into()), 0);
    }

    #[test]
    fn rejected_request_reports_failure() {
        let medium = SimMedium::new();
        medium.set_faults(FaultConfig { reject_connections: true, ..FaultConfig::default() });
        let (a, mut a_rx) = medium.join("a");
        let (b, _b_rx) = medium.join("b");
        b.start_advertising("Bob", "svc").unwrap();

        a.request_connection("Alice", &"b".into()).unwrap();

        assert_eq!(drain(&mut a_rx), vec![TransportEvent::ConnectionResult {
            endpoint: "b".into(),
            success: false,
        }]);
    }
}
