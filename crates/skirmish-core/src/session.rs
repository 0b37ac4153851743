//! Session facade: the one entry point for the presentation layer.
//!
//! A [`Session`] owns the [`Coordinator`], the [`RoundSynchronizer`] and the
//! transport, and is the only place where their actions turn into transport
//! calls and [`SessionSnapshot`] updates.
//!
//! # Architecture
//!
//! ```text
//!   intents                        TransportEvent
//!      │                                 │
//!      ↓                                 ↓
//! ┌─────────────────────────────────────────────────┐
//! │ Session                                         │
//! │   ├─ payload / transfer from active peer ──> RoundSynchronizer
//! │   └─ everything else ─────────────────────> Coordinator
//! │                                                 │
//! │   actions ──> PeerTransport calls               │
//! │           └─> SessionSnapshot                   │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The facade is `&mut self` throughout. Serializing user intents with
//! transport events is the caller's job; [`crate::driver`] does it with a
//! single task.
//!
//! # Failure Handling
//!
//! No error stops a session:
//!
//! - A refused transport request is logged. A refused connection request or
//!   accept is fed back to the coordinator as a failed connection result.
//! - A refused send withdraws the local choice and re-enables input.
//! - An undecodable payload is logged and dropped.

use serde::{Deserialize, Serialize};
use skirmish_proto::Choice;

use crate::{
    coordinator::{Coordinator, CoordinatorAction, SessionState, TransportCommand},
    env::Environment,
    error::SessionError,
    identity::LocalIdentity,
    round::{RoundAction, RoundSynchronizer, Score},
    transport::{PeerTransport, TransferStatus, TransportEvent},
};

/// Status text while idle.
pub const STATUS_IDLE: &str = "...";

/// Status text while advertising and discovering.
pub const STATUS_SEARCHING: &str = "Searching for opponents...";

/// Status text once paired.
pub const STATUS_CONNECTED: &str = "Connected";

/// Service id used when none is configured.
pub const DEFAULT_SERVICE_ID: &str = "skirmish";

/// Session configuration.
///
/// Every field has a default, so an empty document deserializes to
/// [`SessionConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Service id advertised and discovered. Only peers with the same id
    /// find each other.
    pub service_id: String,

    /// Name to advertise. A codename is generated when unset.
    pub local_name: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { service_id: DEFAULT_SERVICE_ID.to_string(), local_name: None }
    }
}

impl SessionConfig {
    /// Use a different service id.
    #[must_use]
    pub fn with_service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = service_id.into();
        self
    }

    /// Advertise under a fixed name instead of a generated codename.
    #[must_use]
    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }
}

/// Everything the presentation layer renders.
///
/// `find_opponent_visible` and `disconnect_visible` are never both true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Our advertised name
    pub local_name: String,
    /// Status line
    pub status: String,
    /// Running score
    pub score: Score,
    /// Connected opponent's name
    pub opponent_name: Option<String>,
    /// Show the "find opponent" control
    pub find_opponent_visible: bool,
    /// Show the "disconnect" control
    pub disconnect_visible: bool,
    /// Enable the three choice controls
    pub choices_enabled: bool,
}

impl SessionSnapshot {
    /// The snapshot right after a reset.
    pub fn idle(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            status: STATUS_IDLE.to_string(),
            score: Score::default(),
            opponent_name: None,
            find_opponent_visible: true,
            disconnect_visible: false,
            choices_enabled: false,
        }
    }

    /// Score rendered as `"mine : opponent"`.
    pub fn score_text(&self) -> String {
        self.score.to_string()
    }
}

/// One player's session over a nearby transport.
pub struct Session<T: PeerTransport> {
    config: SessionConfig,
    identity: LocalIdentity,
    transport: T,
    coordinator: Coordinator,
    round: RoundSynchronizer,
    snapshot: SessionSnapshot,
}

impl<T: PeerTransport> Session<T> {
    /// Create an idle session.
    ///
    /// Uses `config.local_name` if set, otherwise draws a codename from
    /// `env`.
    pub fn new<E: Environment>(config: SessionConfig, transport: T, env: &E) -> Self {
        let identity = match &config.local_name {
            Some(name) => LocalIdentity::new(name.clone()),
            None => LocalIdentity::generate(env),
        };
        Self::with_identity(config, identity, transport)
    }

    /// Create an idle session with an explicit identity.
    pub fn with_identity(config: SessionConfig, identity: LocalIdentity, transport: T) -> Self {
        let snapshot = SessionSnapshot::idle(identity.display_name());
        let mut session = Self {
            config,
            identity,
            transport,
            coordinator: Coordinator::new(),
            round: RoundSynchronizer::new(),
            snapshot,
        };
        session.reset();
        session
    }

    /// Pairing state.
    pub fn state(&self) -> &SessionState {
        self.coordinator.state()
    }

    /// Current presentation state.
    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// Our identity.
    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    /// Running score.
    pub fn score(&self) -> Score {
        self.round.score()
    }

    /// Configuration this session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start looking for an opponent. No-op unless idle.
    pub fn find_opponent(&mut self) {
        let actions = self.coordinator.find_opponent();
        self.execute(actions);
    }

    /// Leave the current peer, or stop looking. Safe from any state.
    pub fn disconnect(&mut self) {
        let actions = self.coordinator.disconnect();
        self.execute(actions);
    }

    /// Stop all transport activity and reset. Safe from any state.
    pub fn shutdown(&mut self) {
        let actions = self.coordinator.shutdown();
        self.execute(actions);
    }

    /// Pick a choice for the current round.
    ///
    /// Silent no-op without a connected peer or with a choice already
    /// pending.
    pub fn submit_choice(&mut self, choice: Choice) {
        if self.coordinator.state().active_peer().is_none() {
            tracing::debug!(%choice, state = self.state().name(), "choice without peer ignored");
            return;
        }

        let actions = self.round.submit_choice(choice);
        self.apply_round(actions);
    }

    /// Feed one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match &event {
            TransportEvent::PayloadReceived { endpoint, payload } => {
                if !self.coordinator.state().is_connected_to(endpoint) {
                    tracing::debug!(endpoint = %endpoint, "payload from inactive endpoint ignored");
                    return;
                }

                if let Err(err) = self.round.on_payload_received(payload) {
                    tracing::warn!(
                        endpoint = %endpoint,
                        error = %SessionError::from(err),
                        "discarding undecodable payload"
                    );
                }
                return;
            },

            TransportEvent::PayloadTransferUpdate { endpoint, status } => {
                if *status == TransferStatus::Success
                    && self.coordinator.state().is_connected_to(endpoint)
                {
                    let actions = self.round.on_transfer_complete();
                    self.apply_round(actions);
                }
                return;
            },

            TransportEvent::Disconnected { endpoint }
                if self.coordinator.state().is_connected_to(endpoint) =>
            {
                tracing::info!(endpoint = %endpoint, "peer disconnected");
            },

            TransportEvent::EndpointLost { endpoint } => {
                tracing::debug!(endpoint = %endpoint, "endpoint lost");
            },

            _ => {},
        }

        let actions = self.coordinator.handle_event(&event);
        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<CoordinatorAction>) {
        for action in actions {
            match action {
                CoordinatorAction::Transport(command) => {
                    if let Err(err) = self.run_command(&command) {
                        tracing::warn!(?command, error = %err, "transport request failed");
                        self.on_command_failed(command);
                    }
                },

                CoordinatorAction::SearchStarted => {
                    self.snapshot.status = STATUS_SEARCHING.to_string();
                    self.snapshot.find_opponent_visible = false;
                    self.snapshot.disconnect_visible = true;
                },

                CoordinatorAction::PeerConnected(peer) => {
                    tracing::info!(
                        endpoint = %peer.endpoint_id,
                        name = %peer.display_name,
                        "connected to opponent"
                    );
                    self.snapshot.status = STATUS_CONNECTED.to_string();
                    self.snapshot.opponent_name = Some(peer.display_name);
                    self.snapshot.find_opponent_visible = false;
                    self.snapshot.disconnect_visible = true;

                    let actions = self.round.arm();
                    self.apply_round(actions);
                },

                CoordinatorAction::NegotiationFailed(peer) => {
                    tracing::info!(endpoint = %peer.endpoint_id, "negotiation failed");
                    self.snapshot.status =
                        format!("Could not connect to {}. {STATUS_SEARCHING}", peer.display_name);
                },

                CoordinatorAction::Reset => self.reset(),
            }
        }
    }

    fn run_command(&self, command: &TransportCommand) -> Result<(), SessionError> {
        let local_name = self.identity.display_name();
        let service_id = self.config.service_id.as_str();

        match command {
            TransportCommand::StartAdvertising => {
                self.transport.start_advertising(local_name, service_id)?;
            },
            TransportCommand::StartDiscovery => self.transport.start_discovery(service_id)?,
            TransportCommand::StopAdvertising => self.transport.stop_advertising(),
            TransportCommand::StopDiscovery => self.transport.stop_discovery(),
            TransportCommand::StopAllEndpoints => self.transport.stop_all_endpoints(),
            TransportCommand::RequestConnection(endpoint) => {
                self.transport.request_connection(local_name, endpoint)?;
            },
            TransportCommand::AcceptConnection(endpoint) => {
                self.transport.accept_connection(endpoint)?;
            },
            TransportCommand::Disconnect(endpoint) => {
                self.transport.disconnect_from_endpoint(endpoint);
            },
        }

        Ok(())
    }

    // A refused request or accept never produces a result event, so report
    // one ourselves.
    fn on_command_failed(&mut self, command: TransportCommand) {
        if let TransportCommand::RequestConnection(endpoint)
        | TransportCommand::AcceptConnection(endpoint) = command
        {
            let actions = self
                .coordinator
                .handle_event(&TransportEvent::ConnectionResult { endpoint, success: false });
            self.execute(actions);
        }
    }

    fn apply_round(&mut self, actions: Vec<RoundAction>) {
        for action in actions {
            match action {
                RoundAction::SetInputEnabled(enabled) => self.snapshot.choices_enabled = enabled,
                RoundAction::Status(status) => self.snapshot.status = status,
                RoundAction::SendChoice(choice) => {
                    if let Err(err) = self.send_choice(choice) {
                        tracing::warn!(%choice, error = %err, "failed to send choice");
                        let undo = self.round.withdraw_choice();
                        self.apply_round(undo);
                    }
                },
                RoundAction::Judged(_) => self.snapshot.score = self.round.score(),
            }
        }
    }

    fn send_choice(&self, choice: Choice) -> Result<(), SessionError> {
        // submit_choice only arms a send with an active peer
        let Some(peer) = self.coordinator.state().active_peer() else {
            return Ok(());
        };
        self.transport.send_payload(&peer.endpoint_id, choice.encode())?;
        Ok(())
    }

    fn reset(&mut self) {
        self.round.reset();
        self.snapshot = SessionSnapshot::idle(self.identity.display_name());
    }
}
