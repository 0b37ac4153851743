//! Connection coordinator for skirmish sessions.
//!
//! This module implements the pairing layer: turning raw transport events
//! into one negotiated one-to-one link.
//!
//! # Architecture: Action-Based Reducer
//!
//! - [`transition`] is a pure function `(state, input) -> (state, actions)`
//! - [`Coordinator`] holds the current [`SessionState`] and replaces it with
//!   whatever `transition` returns
//! - The driver (the session facade) executes the returned actions against
//!   the transport and the presentation state
//!
//! # State Machine
//!
//! ```text
//!            find_opponent               EndpointFound(p) /
//! ┌──────┐ ───────────────> ┌───────────┐ ConnectionInitiated(p) ┌─────────────────┐
//! │ Idle │                  │ Searching │ ──────────────────────>│ Negotiating(p)  │
//! └──────┘ <─────┐          └───────────┘ <──────────────────────└─────────────────┘
//!    ↑           │                         ConnectionResult(p, ✗)         │
//!    │           │ disconnect / shutdown                                  │ ConnectionResult(p, ✓)
//!    │           │ (from any state)                                       ↓
//!    │           │                                               ┌─────────────────┐
//!    └───────────┴───────────────────────────────────────────────│  Connected(p)   │
//!                        Disconnected(p)                         └─────────────────┘
//! ```
//!
//! # Policies
//!
//! - **First discovered wins**: the first `EndpointFound` while searching is
//!   the only candidate. Later discoveries are ignored, no ranking.
//! - **Always accept the candidate**: there is no veto step. Accepting is
//!   what attaches the payload listener.
//! - **One peer**: connection attempts from anyone but the candidate are torn
//!   down with a disconnect. A repeated initiation from the connected peer
//!   is ignored, since its link is already live.
//! - **No retry**: a failed negotiation falls back to `Searching`; the failed
//!   candidate is not requested again.
//! - **No timeout**: a negotiation the transport never resolves stays in
//!   `Negotiating` until the user disconnects or shuts down.

use crate::transport::{EndpointId, TransportEvent};

/// Remote party of a pending or established connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerHandle {
    /// Transport address
    pub endpoint_id: EndpointId,
    /// Name the peer introduced itself with
    pub display_name: String,
}

impl PeerHandle {
    /// Create a handle from a transport address and a display name.
    pub fn new(endpoint_id: EndpointId, display_name: impl Into<String>) -> Self {
        Self { endpoint_id, display_name: display_name.into() }
    }
}

/// Pairing state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not advertising, not discovering, no peer
    #[default]
    Idle,
    /// Advertising and discovering, no candidate yet
    Searching,
    /// A connection with this candidate is in flight
    Negotiating(PeerHandle),
    /// Linked to this peer; rounds can be played
    Connected(PeerHandle),
}

impl SessionState {
    /// The connected peer, if any.
    #[must_use]
    pub fn active_peer(&self) -> Option<&PeerHandle> {
        match self {
            SessionState::Connected(peer) => Some(peer),
            _ => None,
        }
    }

    /// The peer being negotiated with or connected to, if any.
    #[must_use]
    pub fn peer(&self) -> Option<&PeerHandle> {
        match self {
            SessionState::Negotiating(peer) | SessionState::Connected(peer) => Some(peer),
            SessionState::Idle | SessionState::Searching => None,
        }
    }

    /// Whether `endpoint` is the connected peer.
    #[must_use]
    pub fn is_connected_to(&self, endpoint: &EndpointId) -> bool {
        self.active_peer().is_some_and(|peer| peer.endpoint_id == *endpoint)
    }

    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Searching => "searching",
            SessionState::Negotiating(_) => "negotiating",
            SessionState::Connected(_) => "connected",
        }
    }
}

/// Inputs to the coordinator: user intents and transport events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorInput {
    /// Start looking for an opponent
    FindOpponent,
    /// Leave the current peer (or stop looking)
    Disconnect,
    /// Tear everything down
    Shutdown,
    /// Something happened on the transport
    Event(TransportEvent),
}

/// Requests the coordinator makes of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Broadcast local presence
    StartAdvertising,
    /// Scan for other players
    StartDiscovery,
    /// Stop broadcasting
    StopAdvertising,
    /// Stop scanning
    StopDiscovery,
    /// Drop every connection
    StopAllEndpoints,
    /// Ask this endpoint for a connection
    RequestConnection(EndpointId),
    /// Accept a pending connection with this endpoint
    AcceptConnection(EndpointId),
    /// Tear down the connection with this endpoint
    Disconnect(EndpointId),
}

/// Actions returned by the coordinator.
///
/// The driver executes these in order:
/// - `Transport`: call the matching [`crate::transport::PeerTransport`] method
/// - the others: update presentation and round state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// Issue this transport request
    Transport(TransportCommand),
    /// Searching began; show the searching affordance
    SearchStarted,
    /// Link to this peer is up; rounds may start
    PeerConnected(PeerHandle),
    /// Negotiation with this candidate failed; still searching
    NegotiationFailed(PeerHandle),
    /// Run the full session reset
    Reset,
}

/// Pure transition function.
///
/// Returns the replacement state and the actions to execute. Every
/// `(state, input)` pair is defined; pairs with no effect return the state
/// unchanged and no actions.
#[must_use]
pub fn transition(
    state: &SessionState,
    input: &CoordinatorInput,
) -> (SessionState, Vec<CoordinatorAction>) {
    use CoordinatorAction::{Reset, SearchStarted, Transport};
    use TransportCommand::{
        Disconnect, StartAdvertising, StartDiscovery, StopAdvertising, StopAllEndpoints,
        StopDiscovery,
    };

    match (state, input) {
        (_, CoordinatorInput::Shutdown) => (SessionState::Idle, vec![
            Transport(StopAdvertising),
            Transport(StopDiscovery),
            Transport(StopAllEndpoints),
            Reset,
        ]),

        (_, CoordinatorInput::Disconnect) => {
            let mut actions = match state {
                SessionState::Idle => vec![],
                SessionState::Searching => {
                    vec![Transport(StopAdvertising), Transport(StopDiscovery)]
                },
                SessionState::Negotiating(peer) => vec![
                    Transport(StopAdvertising),
                    Transport(StopDiscovery),
                    Transport(Disconnect(peer.endpoint_id.clone())),
                ],
                SessionState::Connected(peer) => {
                    vec![Transport(Disconnect(peer.endpoint_id.clone()))]
                },
            };
            actions.push(Reset);
            (SessionState::Idle, actions)
        },

        (SessionState::Idle, CoordinatorInput::FindOpponent) => (SessionState::Searching, vec![
            Transport(StartAdvertising),
            Transport(StartDiscovery),
            SearchStarted,
        ]),

        // Already searching or paired
        (_, CoordinatorInput::FindOpponent) => (state.clone(), vec![]),

        (_, CoordinatorInput::Event(event)) => on_event(state, event),
    }
}

fn on_event(state: &SessionState, event: &TransportEvent) -> (SessionState, Vec<CoordinatorAction>) {
    use CoordinatorAction::{NegotiationFailed, PeerConnected, Reset, Transport};
    use TransportCommand::{
        AcceptConnection, Disconnect, RequestConnection, StopAdvertising, StopDiscovery,
    };

    let unchanged = || (state.clone(), vec![]);

    match (state, event) {
        (SessionState::Searching, TransportEvent::EndpointFound { endpoint, name }) => (
            SessionState::Negotiating(PeerHandle::new(endpoint.clone(), name.clone())),
            vec![Transport(RequestConnection(endpoint.clone()))],
        ),

        // Someone found us first
        (SessionState::Searching, TransportEvent::ConnectionInitiated { endpoint, name }) => (
            SessionState::Negotiating(PeerHandle::new(endpoint.clone(), name.clone())),
            vec![Transport(AcceptConnection(endpoint.clone()))],
        ),

        (SessionState::Negotiating(peer), TransportEvent::ConnectionInitiated { endpoint, name })
            if peer.endpoint_id == *endpoint =>
        {
            (
                SessionState::Negotiating(PeerHandle::new(endpoint.clone(), name.clone())),
                vec![Transport(AcceptConnection(endpoint.clone()))],
            )
        },

        // Repeated initiation from the live peer
        (SessionState::Connected(peer), TransportEvent::ConnectionInitiated { endpoint, .. })
            if peer.endpoint_id == *endpoint =>
        {
            unchanged()
        },

        (_, TransportEvent::ConnectionInitiated { endpoint, .. }) => {
            (state.clone(), vec![Transport(Disconnect(endpoint.clone()))])
        },

        (
            SessionState::Negotiating(peer),
            TransportEvent::ConnectionResult { endpoint, success: true },
        ) if peer.endpoint_id == *endpoint => (SessionState::Connected(peer.clone()), vec![
            Transport(StopAdvertising),
            Transport(StopDiscovery),
            PeerConnected(peer.clone()),
        ]),

        (
            SessionState::Negotiating(peer),
            TransportEvent::ConnectionResult { endpoint, success: false }
            | TransportEvent::Disconnected { endpoint },
        ) if peer.endpoint_id == *endpoint => {
            (SessionState::Searching, vec![NegotiationFailed(peer.clone())])
        },

        // A request we did not initiate won the transport's arbitration
        (SessionState::Searching, TransportEvent::ConnectionResult { endpoint, success: true }) => {
            let peer = PeerHandle::new(endpoint.clone(), endpoint.to_string());
            (SessionState::Connected(peer.clone()), vec![
                Transport(StopAdvertising),
                Transport(StopDiscovery),
                PeerConnected(peer),
            ])
        },

        (SessionState::Connected(peer), TransportEvent::ConnectionResult { endpoint, .. })
            if peer.endpoint_id == *endpoint =>
        {
            unchanged()
        },

        (_, TransportEvent::ConnectionResult { endpoint, success: true }) => {
            (state.clone(), vec![Transport(Disconnect(endpoint.clone()))])
        },

        (SessionState::Connected(peer), TransportEvent::Disconnected { endpoint })
            if peer.endpoint_id == *endpoint =>
        {
            (SessionState::Idle, vec![Reset])
        },

        _ => unchanged(),
    }
}

/// Connection coordinator.
///
/// Owns the single [`SessionState`] of a session and feeds every input
/// through [`transition`].
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    state: SessionState,
}

impl Coordinator {
    /// Create a coordinator in [`SessionState::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply one input and return the actions to execute.
    pub fn apply(&mut self, input: &CoordinatorInput) -> Vec<CoordinatorAction> {
        let (next, actions) = transition(&self.state, input);

        if next != self.state {
            tracing::debug!(from = self.state.name(), to = next.name(), "session transition");
        } else if actions.is_empty() {
            tracing::debug!(state = self.state.name(), ?input, "input ignored");
        }

        self.state = next;
        actions
    }

    /// User intent: start looking for an opponent.
    pub fn find_opponent(&mut self) -> Vec<CoordinatorAction> {
        self.apply(&CoordinatorInput::FindOpponent)
    }

    /// User intent: leave the current peer or stop looking.
    pub fn disconnect(&mut self) -> Vec<CoordinatorAction> {
        self.apply(&CoordinatorInput::Disconnect)
    }

    /// Teardown: stop all transport activity.
    pub fn shutdown(&mut self) -> Vec<CoordinatorAction> {
        self.apply(&CoordinatorInput::Shutdown)
    }

    /// Transport event.
    pub fn handle_event(&mut self, event: &TransportEvent) -> Vec<CoordinatorAction> {
        self.apply(&CoordinatorInput::Event(event.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(id: &str) -> TransportEvent {
        TransportEvent::EndpointFound { endpoint: id.into(), name: format!("{id}-name") }
    }

    fn result(id: &str, success: bool) -> TransportEvent {
        TransportEvent::ConnectionResult { endpoint: id.into(), success }
    }

    fn searching() -> Coordinator {
        let mut coordinator = Coordinator::new();
        coordinator.find_opponent();
        coordinator
    }

    fn connected(id: &str) -> Coordinator {
        let mut coordinator = searching();
        coordinator.handle_event(&found(id));
        coordinator.handle_event(&result(id, true));
        coordinator
    }

    #[test]
    fn find_opponent_starts_advertising_and_discovery() {
        let mut coordinator = Coordinator::new();
        let actions = coordinator.find_opponent();

        assert_eq!(coordinator.state(), &SessionState::Searching);
        assert_eq!(actions, vec![
            CoordinatorAction::Transport(TransportCommand::StartAdvertising),
            CoordinatorAction::Transport(TransportCommand::StartDiscovery),
            CoordinatorAction::SearchStarted,
        ]);
    }

    #[test]
    fn find_opponent_is_idempotent_while_searching() {
        let mut coordinator = searching();
        assert!(coordinator.find_opponent().is_empty());
        assert_eq!(coordinator.state(), &SessionState::Searching);
    }

    #[test]
    fn first_discovery_requests_connection() {
        let mut coordinator = searching();
        let actions = coordinator.handle_event(&found("p1"));

        assert!(matches!(coordinator.state(), SessionState::Negotiating(p) if p.endpoint_id.as_str() == "p1"));
        assert_eq!(actions, vec![CoordinatorAction::Transport(
            TransportCommand::RequestConnection("p1".into())
        )]);
    }

    #[test]
    fn later_discoveries_are_ignored() {
        let mut coordinator = searching();
        coordinator.handle_event(&found("p1"));

        let before = coordinator.state().clone();
        assert!(coordinator.handle_event(&found("p2")).is_empty());
        assert_eq!(coordinator.state(), &before);
    }

    #[test]
    fn candidate_initiation_is_accepted_and_renames_peer() {
        let mut coordinator = searching();
        coordinator.handle_event(&found("p1"));

        let actions = coordinator.handle_event(&TransportEvent::ConnectionInitiated {
            endpoint: "p1".into(),
            name: "Jade Raven".to_string(),
        });

        assert_eq!(actions, vec![CoordinatorAction::Transport(
            TransportCommand::AcceptConnection("p1".into())
        )]);
        assert_eq!(
            coordinator.state().peer().map(|p| p.display_name.as_str()),
            Some("Jade Raven")
        );
    }

    #[test]
    fn foreign_initiation_is_torn_down() {
        let mut coordinator = searching();
        coordinator.handle_event(&found("p1"));

        let actions = coordinator.handle_event(&TransportEvent::ConnectionInitiated {
            endpoint: "p2".into(),
            name: "Intruder".to_string(),
        });

        assert_eq!(actions, vec![CoordinatorAction::Transport(TransportCommand::Disconnect(
            "p2".into()
        ))]);
        assert_eq!(coordinator.state().peer().map(|p| p.endpoint_id.as_str()), Some("p1"));
    }

    #[test]
    fn repeated_initiation_from_connected_peer_keeps_link() {
        let mut coordinator = connected("p1");
        let before = coordinator.state().clone();

        let actions = coordinator.handle_event(&TransportEvent::ConnectionInitiated {
            endpoint: "p1".into(),
            name: "p1-name".to_string(),
        });

        assert!(actions.is_empty());
        assert_eq!(coordinator.state(), &before);
    }

    #[test]
    fn initiation_while_connected_to_someone_else_is_torn_down() {
        let mut coordinator = connected("p1");

        let actions = coordinator.handle_event(&TransportEvent::ConnectionInitiated {
            endpoint: "p2".into(),
            name: "Intruder".to_string(),
        });

        assert_eq!(actions, vec![CoordinatorAction::Transport(TransportCommand::Disconnect(
            "p2".into()
        ))]);
        assert!(coordinator.state().is_connected_to(&"p1".into()));
    }

    #[test]
    fn initiation_while_idle_is_torn_down() {
        let mut coordinator = Coordinator::new();

        let actions = coordinator.handle_event(&TransportEvent::ConnectionInitiated {
            endpoint: "p1".into(),
            name: "Early".to_string(),
        });

        assert_eq!(coordinator.state(), &SessionState::Idle);
        assert_eq!(actions, vec![CoordinatorAction::Transport(TransportCommand::Disconnect(
            "p1".into()
        ))]);
    }

    #[test]
    fn success_from_other_endpoint_while_negotiating_is_torn_down() {
        let mut coordinator = searching();
        coordinator.handle_event(&found("p1"));

        let actions = coordinator.handle_event(&result("p2", true));

        assert_eq!(actions, vec![CoordinatorAction::Transport(TransportCommand::Disconnect(
            "p2".into()
        ))]);
        assert_eq!(coordinator.state().peer().map(|p| p.endpoint_id.as_str()), Some("p1"));
    }

    #[test]
    fn successful_result_connects_and_stops_searching() {
        let mut coordinator = searching();
        coordinator.handle_event(&found("p1"));
        let actions = coordinator.handle_event(&result("p1", true));

        let peer = PeerHandle::new("p1".into(), "p1-name");
        assert_eq!(coordinator.state(), &SessionState::Connected(peer.clone()));
        assert_eq!(actions, vec![
            CoordinatorAction::Transport(TransportCommand::StopAdvertising),
            CoordinatorAction::Transport(TransportCommand::StopDiscovery),
            CoordinatorAction::PeerConnected(peer),
        ]);
    }

    #[test]
    fn failed_result_falls_back_to_searching_without_retry() {
        let mut coordinator = searching();
        coordinator.handle_event(&found("p1"));
        let actions = coordinator.handle_event(&result("p1", false));

        assert_eq!(coordinator.state(), &SessionState::Searching);
        assert_eq!(actions, vec![CoordinatorAction::NegotiationFailed(PeerHandle::new(
            "p1".into(),
            "p1-name"
        ))]);
    }

    #[test]
    fn unsolicited_success_while_searching_connects() {
        let mut coordinator = searching();
        coordinator.handle_event(&result("p9", true));

        assert!(coordinator.state().is_connected_to(&"p9".into()));
    }

    #[test]
    fn stray_success_while_idle_is_disconnected() {
        let mut coordinator = Coordinator::new();
        let actions = coordinator.handle_event(&result("p1", true));

        assert_eq!(coordinator.state(), &SessionState::Idle);
        assert_eq!(actions, vec![CoordinatorAction::Transport(TransportCommand::Disconnect(
            "p1".into()
        ))]);
    }

    #[test]
    fn peer_disconnect_resets() {
        let mut coordinator = connected("p1");
        let actions =
            coordinator.handle_event(&TransportEvent::Disconnected { endpoint: "p1".into() });

        assert_eq!(coordinator.state(), &SessionState::Idle);
        assert_eq!(actions, vec![CoordinatorAction::Reset]);
    }

    #[test]
    fn disconnect_from_other_endpoint_is_ignored() {
        let mut coordinator = connected("p1");
        let actions =
            coordinator.handle_event(&TransportEvent::Disconnected { endpoint: "p2".into() });

        assert!(actions.is_empty());
        assert!(coordinator.state().is_connected_to(&"p1".into()));
    }

    #[test]
    fn user_disconnect_while_connected_disconnects_peer() {
        let mut coordinator = connected("p1");
        let actions = coordinator.disconnect();

        assert_eq!(coordinator.state(), &SessionState::Idle);
        assert_eq!(actions, vec![
            CoordinatorAction::Transport(TransportCommand::Disconnect("p1".into())),
            CoordinatorAction::Reset,
        ]);
    }

    #[test]
    fn user_disconnect_while_negotiating_stops_everything() {
        let mut coordinator = searching();
        coordinator.handle_event(&found("p1"));
        let actions = coordinator.disconnect();

        assert_eq!(actions, vec![
            CoordinatorAction::Transport(TransportCommand::StopAdvertising),
            CoordinatorAction::Transport(TransportCommand::StopDiscovery),
            CoordinatorAction::Transport(TransportCommand::Disconnect("p1".into())),
            CoordinatorAction::Reset,
        ]);
    }

    #[test]
    fn shutdown_from_idle_still_stops_endpoints() {
        let mut coordinator = Coordinator::new();
        let actions = coordinator.shutdown();

        assert_eq!(coordinator.state(), &SessionState::Idle);
        assert!(actions.contains(&CoordinatorAction::Transport(TransportCommand::StopAllEndpoints)));
        assert_eq!(actions.last(), Some(&CoordinatorAction::Reset));
    }

    #[test]
    fn payload_events_never_change_state() {
        let mut coordinator = connected("p1");
        let before = coordinator.state().clone();

        let actions = coordinator.handle_event(&TransportEvent::PayloadReceived {
            endpoint: "p1".into(),
            payload: bytes::Bytes::from_static(b"ROCK"),
        });

        assert!(actions.is_empty());
        assert_eq!(coordinator.state(), &before);
    }
}
