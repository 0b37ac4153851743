//! Player actor for scenario execution.
//!
//! A player wraps one [`Session`] on a [`SimMedium`] together with the
//! receiving end of its transport events, and exposes the user intents plus
//! a way to feed queued events into the session.

use skirmish_core::{
    coordinator::SessionState,
    round::Score,
    session::{Session, SessionConfig, SessionSnapshot},
    transport::{EndpointId, TransportEvent},
};
use skirmish_proto::Choice;
use tokio::sync::mpsc;

use crate::{
    SimEnv,
    sim_transport::{SimMedium, SimTransport},
};

/// One simulated player.
pub struct Player {
    endpoint: EndpointId,
    session: Session<SimTransport>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Player {
    /// Join `medium` as `endpoint` with a fresh idle session.
    pub fn join(
        medium: &SimMedium,
        endpoint: impl Into<EndpointId>,
        config: SessionConfig,
        env: &SimEnv,
    ) -> Self {
        let endpoint = endpoint.into();
        let (transport, events) = medium.join(endpoint.clone());
        let session = Session::new(config, transport, env);
        Self { endpoint, session, events }
    }

    /// Address other players see.
    pub fn endpoint(&self) -> &EndpointId {
        &self.endpoint
    }

    /// Advertised display name.
    pub fn name(&self) -> &str {
        self.session.identity().display_name()
    }

    /// The underlying session (for oracle access).
    pub fn session(&self) -> &Session<SimTransport> {
        &self.session
    }

    /// Pairing state.
    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    /// Presentation state.
    pub fn snapshot(&self) -> &SessionSnapshot {
        self.session.snapshot()
    }

    /// Running score.
    pub fn score(&self) -> Score {
        self.session.score()
    }

    /// Endpoint of the connected opponent.
    pub fn opponent(&self) -> Option<&EndpointId> {
        self.state().active_peer().map(|peer| &peer.endpoint_id)
    }

    /// Start searching.
    pub fn find_opponent(&mut self) {
        self.session.find_opponent();
    }

    /// Pick a choice.
    pub fn submit_choice(&mut self, choice: Choice) {
        self.session.submit_choice(choice);
    }

    /// Leave the opponent.
    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }

    /// Tear everything down.
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }

    /// Feed every queued transport event into the session.
    ///
    /// Returns the number of events handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            tracing::trace!(player = %self.endpoint, ?event, "delivering event");
            self.session.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Expect this player to be connected, returning its opponent.
    pub fn expect_connected(&self) -> Result<&EndpointId, String> {
        self.opponent()
            .ok_or_else(|| format!("{} expected Connected, got {:?}", self.endpoint, self.state()))
    }
}
