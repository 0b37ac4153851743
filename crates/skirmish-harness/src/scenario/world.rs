//! World state for scenario execution.
//!
//! The World owns the shared medium and every player on it, and delivers
//! queued transport events until the system is quiet.

use skirmish_core::transport::EndpointId;

use crate::{scenario::Player, sim_transport::SimMedium};

/// Upper bound on delivery passes in one [`World::settle`].
///
/// A healthy exchange settles in a handful of passes; hitting the bound means
/// two players are bouncing events forever.
const MAX_SETTLE_PASSES: usize = 1_000;

/// Every player plus the medium between them.
pub struct World {
    medium: SimMedium,
    players: Vec<Player>,
    events_delivered: usize,
}

impl World {
    /// Create an empty world on `medium`.
    pub fn new(medium: SimMedium) -> Self {
        Self { medium, players: Vec::new(), events_delivered: 0 }
    }

    /// Add a player.
    pub(crate) fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    /// The shared medium.
    pub fn medium(&self) -> &SimMedium {
        &self.medium
    }

    /// All players, in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player by join index.
    ///
    /// Panics if there is no such player.
    pub fn player(&self, index: usize) -> &Player {
        &self.players[index]
    }

    /// Mutable player by join index.
    ///
    /// Panics if there is no such player.
    pub(crate) fn player_mut(&mut self, index: usize) -> &mut Player {
        &mut self.players[index]
    }

    /// Player by endpoint.
    pub fn player_at(&self, endpoint: &EndpointId) -> Option<&Player> {
        self.players.iter().find(|player| player.endpoint() == endpoint)
    }

    /// Join index of the player at `endpoint`.
    pub fn index_of(&self, endpoint: &EndpointId) -> Option<usize> {
        self.players.iter().position(|player| player.endpoint() == endpoint)
    }

    /// Total transport events handled so far.
    pub fn events_delivered(&self) -> usize {
        self.events_delivered
    }

    /// Deliver events, player by player in join order, until no queue has
    /// anything left.
    ///
    /// # Errors
    ///
    /// Returns an error if the world does not quiet down.
    pub fn settle(&mut self) -> Result<(), String> {
        for _ in 0..MAX_SETTLE_PASSES {
            let handled: usize = self.players.iter_mut().map(Player::poll).sum();
            if handled == 0 {
                return Ok(());
            }
            self.events_delivered += handled;
        }

        Err(format!("world did not settle after {MAX_SETTLE_PASSES} passes"))
    }
}
