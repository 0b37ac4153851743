//! Oracle functions for scenario verification.
//!
//! Oracle functions run at the end of scenarios to verify global consistency.
//! They receive the entire world and assert invariants.

use skirmish_core::{coordinator::SessionState, session::SessionSnapshot};

use crate::scenario::World;

/// Oracle function type.
///
/// Receives immutable reference to world state and returns:
/// - `Ok(())` if all invariants hold
/// - `Err(message)` if verification fails
pub type OracleFn = Box<dyn FnOnce(&World) -> Result<(), String>>;

/// No station takes part in more than one established link.
pub fn at_most_one_link() -> OracleFn {
    Box::new(|world| {
        for endpoint in world.medium().stations() {
            let links = world.medium().established_links(&endpoint);
            if links > 1 {
                return Err(format!("{endpoint} has {links} established links"));
            }
        }
        Ok(())
    })
}

/// Every player is connected, and its opponent is connected back to it.
pub fn all_connected() -> OracleFn {
    Box::new(|world| {
        for player in world.players() {
            let opponent = player.expect_connected()?;
            let back = world
                .player_at(opponent)
                .and_then(|other| other.opponent())
                .ok_or_else(|| format!("{opponent} is not connected back"))?;

            if back != player.endpoint() {
                return Err(format!("{} -> {opponent} but {opponent} -> {back}", player.endpoint()));
            }
            if !world.medium().is_connected(player.endpoint(), opponent) {
                return Err(format!("no link between {} and {opponent}", player.endpoint()));
            }
        }
        Ok(())
    })
}

/// Every player is idle with a freshly reset snapshot.
pub fn all_idle() -> OracleFn {
    Box::new(|world| {
        for player in world.players() {
            if player.state() != &SessionState::Idle {
                return Err(format!("{} expected Idle, got {:?}", player.endpoint(), player.state()));
            }
            if player.snapshot() != &SessionSnapshot::idle(player.name()) {
                return Err(format!("{} snapshot not reset: {:?}", player.endpoint(), player.snapshot()));
            }
        }
        Ok(())
    })
}

/// Connected opponents agree on the score.
pub fn scores_mirror() -> OracleFn {
    Box::new(|world| {
        for player in world.players() {
            let Some(other) = player.opponent().and_then(|opponent| world.player_at(opponent))
            else {
                continue;
            };

            let (mine, theirs) = (player.score(), other.score());
            if mine.mine != theirs.opponent || mine.opponent != theirs.mine {
                return Err(format!(
                    "{} has {mine}, {} has {theirs}",
                    player.endpoint(),
                    other.endpoint()
                ));
            }
        }
        Ok(())
    })
}

/// Search and disconnect controls are never shown together.
pub fn controls_exclusive() -> OracleFn {
    Box::new(|world| {
        for player in world.players() {
            let snapshot = player.snapshot();
            if snapshot.find_opponent_visible == snapshot.disconnect_visible {
                return Err(format!("{} shows inconsistent controls", player.endpoint()));
            }
        }
        Ok(())
    })
}

/// Wrap an ad-hoc check as an oracle.
pub fn check(oracle: impl FnOnce(&World) -> Result<(), String> + 'static) -> OracleFn {
    Box::new(oracle)
}

/// Combine multiple oracles into one.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| {
        for oracle in oracles {
            oracle(world)?;
        }
        Ok(())
    })
}
