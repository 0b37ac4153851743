//! Pairing lifecycle scenarios on the simulated medium.
//!
//! Players search, pair, play rounds and leave. Every scenario ends with an
//! oracle over the whole world.

use skirmish_core::{coordinator::SessionState, session::SessionConfig};
use skirmish_harness::{
    SimEnv, SimMedium,
    scenario::{Player, Scenario, oracle},
};
use skirmish_proto::Choice;

#[test]
fn two_players_pair_and_play() {
    Scenario::new()
        .with_round(Choice::Rock, Choice::Scissors)
        .oracle(oracle::all_of(vec![
            oracle::all_connected(),
            oracle::at_most_one_link(),
            oracle::scores_mirror(),
            oracle::check(|world| {
                let first = world.player(0);
                if first.snapshot().status != "ROCK beats SCISSORS" {
                    return Err(format!("unexpected status {:?}", first.snapshot().status));
                }
                if first.snapshot().score_text() != "1 : 0" {
                    return Err(format!("unexpected score {}", first.snapshot().score_text()));
                }

                let second = world.player(1);
                if second.snapshot().status != "SCISSORS loses to ROCK" {
                    return Err(format!("unexpected status {:?}", second.snapshot().status));
                }
                if !first.snapshot().choices_enabled || !second.snapshot().choices_enabled {
                    return Err("input not re-enabled after judging".to_string());
                }
                Ok(())
            }),
        ]))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn opponent_names_come_from_the_other_side() {
    Scenario::new()
        .with_seed(42)
        .oracle(oracle::check(|world| {
            for player in world.players() {
                let opponent = world
                    .player_at(player.expect_connected()?)
                    .ok_or_else(|| "opponent missing".to_string())?;

                if player.snapshot().opponent_name.as_deref() != Some(opponent.name()) {
                    return Err(format!(
                        "{} sees {:?}, opponent is {}",
                        player.endpoint(),
                        player.snapshot().opponent_name,
                        opponent.name()
                    ));
                }
            }
            Ok(())
        }))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn score_accumulates_over_rounds() {
    Scenario::new()
        .with_round(Choice::Rock, Choice::Scissors)
        .with_round(Choice::Paper, Choice::Paper)
        .with_round(Choice::Paper, Choice::Scissors)
        .with_round(Choice::Scissors, Choice::Paper)
        .oracle(oracle::all_of(vec![
            oracle::scores_mirror(),
            oracle::check(|world| {
                let text = world.player(0).snapshot().score_text();
                if text == "2 : 1" { Ok(()) } else { Err(format!("expected 2 : 1, got {text}")) }
            }),
        ]))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn disconnect_resets_both_players() {
    Scenario::new()
        .with_round(Choice::Paper, Choice::Rock)
        .with_disconnect(0)
        .oracle(oracle::all_of(vec![
            oracle::all_idle(),
            oracle::controls_exclusive(),
            oracle::check(|world| {
                let endpoint = world.player(0).endpoint();
                if world.medium().established_links(endpoint) != 0 {
                    return Err("link survived disconnect".to_string());
                }
                Ok(())
            }),
        ]))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn players_can_pair_again_after_disconnect() {
    Scenario::new()
        .with_round(Choice::Rock, Choice::Scissors)
        .with_disconnect(1)
        .with_search(0)
        .with_search(1)
        .oracle(oracle::all_of(vec![
            oracle::all_connected(),
            oracle::at_most_one_link(),
            oracle::check(|world| {
                // Score is per connection
                let text = world.player(0).snapshot().score_text();
                if text == "0 : 0" { Ok(()) } else { Err(format!("score not reset: {text}")) }
            }),
        ]))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn third_player_keeps_searching() {
    Scenario::new()
        .with_players(3)
        .oracle(oracle::all_of(vec![
            oracle::at_most_one_link(),
            oracle::controls_exclusive(),
            oracle::check(|world| {
                let connected =
                    world.players().iter().filter(|p| p.opponent().is_some()).count();
                let searching = world
                    .players()
                    .iter()
                    .filter(|p| p.state() == &SessionState::Searching)
                    .count();

                if (connected, searching) == (2, 1) {
                    Ok(())
                } else {
                    Err(format!("expected 2 connected and 1 searching, got {connected}/{searching}"))
                }
            }),
        ]))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn shutdown_stops_advertising_and_discovery() {
    Scenario::new()
        .with_players(1)
        .with_shutdown(0)
        .oracle(oracle::all_of(vec![
            oracle::all_idle(),
            oracle::check(|world| {
                let endpoint = world.player(0).endpoint();
                if world.medium().is_advertising(endpoint) || world.medium().is_discovering(endpoint) {
                    return Err("radio still active after shutdown".to_string());
                }
                Ok(())
            }),
        ]))
        .run()
        .expect("scenario should succeed");
}

#[test]
fn service_ids_partition_the_medium() {
    let env = SimEnv::new();
    let medium = SimMedium::new();
    let lobby = |id: &str| SessionConfig::default().with_service_id(id);

    let mut a = Player::join(&medium, "a", lobby("lobby-a"), &env);
    let mut b = Player::join(&medium, "b", lobby("lobby-b"), &env);
    a.find_opponent();
    b.find_opponent();

    while a.poll() + b.poll() > 0 {}

    assert_eq!(a.state(), &SessionState::Searching);
    assert_eq!(b.state(), &SessionState::Searching);
}
