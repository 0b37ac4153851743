//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use skirmish_core::{session::SessionConfig, transport::TransportEvent};
use skirmish_proto::Choice;

use crate::{
    SimEnv,
    scenario::{OracleFn, Player, World},
    sim_transport::{FaultConfig, SimMedium},
};

/// One scripted step, run after every player has started searching.
#[derive(Debug, Clone)]
enum Step {
    /// Player 0 picks `first`, its opponent picks `second`
    Round { first: Choice, second: Choice },
    /// This player disconnects
    Disconnect(usize),
    /// This player shuts down
    Shutdown(usize),
    /// This player starts searching again
    FindOpponent(usize),
    /// Push a raw event at this player
    Inject { player: usize, event: TransportEvent },
}

/// Scenario builder.
///
/// Construct a scenario by choosing the number of players, faults and
/// scripted steps, then add an oracle verification function.
pub struct Scenario {
    players: usize,
    seed: u64,
    config: SessionConfig,
    faults: FaultConfig,
    steps: Vec<Step>,
}

impl Scenario {
    /// Two players, seed 0, default config, no faults, no steps.
    pub fn new() -> Self {
        Self {
            players: 2,
            seed: 0,
            config: SessionConfig::default(),
            faults: FaultConfig::default(),
            steps: Vec::new(),
        }
    }

    /// Number of players on the medium.
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players;
        self
    }

    /// Seed for generated player names.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Session config shared by every player.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Faults active from the start.
    pub fn with_faults(mut self, faults: FaultConfig) -> Self {
        self.faults = faults;
        self
    }

    /// Play one round: player 0 picks `first`, its opponent picks `second`.
    ///
    /// Both submit before any event is delivered.
    pub fn with_round(mut self, first: Choice, second: Choice) -> Self {
        self.steps.push(Step::Round { first, second });
        self
    }

    /// `player` disconnects.
    pub fn with_disconnect(mut self, player: usize) -> Self {
        self.steps.push(Step::Disconnect(player));
        self
    }

    /// `player` shuts down.
    pub fn with_shutdown(mut self, player: usize) -> Self {
        self.steps.push(Step::Shutdown(player));
        self
    }

    /// `player` searches again.
    pub fn with_search(mut self, player: usize) -> Self {
        self.steps.push(Step::FindOpponent(player));
        self
    }

    /// Deliver `event` to `player` as if the radio produced it.
    pub fn with_injected(mut self, player: usize, event: TransportEvent) -> Self {
        self.steps.push(Step::Inject { player, event });
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// 1. Every player joins the medium and calls `find_opponent`, in order
    /// 2. Events are delivered until the world is quiet
    /// 3. Each scripted step runs, followed by another settle
    /// 4. The oracle verifies the final world
    pub fn run(self) -> Result<(), String> {
        let world = self.execute()?;
        (self.oracle)(&world)
    }

    fn execute(&self) -> Result<World, String> {
        let scenario = &self.scenario;
        let env = SimEnv::with_seed(scenario.seed);
        let medium = SimMedium::new();
        medium.set_faults(scenario.faults);

        let mut world = World::new(medium.clone());
        for index in 0..scenario.players {
            let player =
                Player::join(&medium, format!("player-{index}"), scenario.config.clone(), &env);
            world.add_player(player);
        }

        for index in 0..scenario.players {
            world.player_mut(index).find_opponent();
        }
        world.settle()?;

        for step in &scenario.steps {
            Self::run_step(&mut world, step)?;
            world.settle()?;
        }

        Ok(world)
    }

    fn run_step(world: &mut World, step: &Step) -> Result<(), String> {
        match step {
            Step::Round { first, second } => {
                let opponent = world.player(0).expect_connected()?.clone();
                let index = world
                    .index_of(&opponent)
                    .ok_or_else(|| format!("opponent {opponent} is not a player"))?;

                world.player_mut(0).submit_choice(*first);
                world.player_mut(index).submit_choice(*second);
            },
            Step::Disconnect(player) => world.player_mut(*player).disconnect(),
            Step::Shutdown(player) => world.player_mut(*player).shutdown(),
            Step::FindOpponent(player) => world.player_mut(*player).find_opponent(),
            Step::Inject { player, event } => {
                let endpoint = world.player(*player).endpoint().clone();
                world.medium().inject(&endpoint, event.clone());
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::oracle;

    #[test]
    fn scenario_requires_oracle() {
        let _scenario = Scenario::new().oracle(Box::new(|_world| Ok(())));
    }

    #[test]
    fn two_players_pair_up() {
        Scenario::new()
            .oracle(oracle::all_of(vec![oracle::all_connected(), oracle::at_most_one_link()]))
            .run()
            .expect("scenario should succeed");
    }

    #[test]
    fn round_without_opponent_fails() {
        let result = Scenario::new()
            .with_players(1)
            .with_round(Choice::Rock, Choice::Paper)
            .oracle(Box::new(|_world| Ok(())))
            .run();

        assert!(result.is_err());
    }
}
