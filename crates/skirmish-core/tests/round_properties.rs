//! Property-based tests for the round synchronizer.
//!
//! A round's three inputs (local submit, remote payload, transfer
//! completions) may arrive in any order and completions any number of times.
//! The round must be judged exactly once, and the same way from both sides.

use proptest::prelude::*;
use skirmish_core::round::{RoundAction, RoundSynchronizer, Score};
use skirmish_proto::{Choice, Verdict};

#[derive(Debug, Clone, Copy)]
enum Step {
    Submit,
    Receive,
    Complete,
}

fn choice_strategy() -> impl Strategy<Value = Choice> {
    prop::sample::select(Choice::ALL.to_vec())
}

// Submit and Receive exactly once, Complete at least twice, shuffled
fn steps_strategy() -> impl Strategy<Value = Vec<Step>> {
    (2usize..6).prop_flat_map(|completions| {
        let mut steps = vec![Step::Submit, Step::Receive];
        steps.extend(std::iter::repeat_n(Step::Complete, completions));
        Just(steps).prop_shuffle()
    })
}

fn play(
    sync: &mut RoundSynchronizer,
    mine: Choice,
    theirs: Choice,
    steps: &[Step],
) -> Vec<RoundAction> {
    let mut actions = Vec::new();
    for step in steps {
        match step {
            Step::Submit => actions.extend(sync.submit_choice(mine)),
            Step::Receive => {
                sync.on_payload_received(&theirs.encode()).expect("valid token");
            },
            Step::Complete => actions.extend(sync.on_transfer_complete()),
        }
    }
    actions
}

fn judged(actions: &[RoundAction]) -> Vec<Verdict> {
    actions
        .iter()
        .filter_map(|action| match action {
            RoundAction::Judged(outcome) => Some(outcome.verdict),
            _ => None,
        })
        .collect()
}

#[test]
fn prop_round_judged_at_most_once() {
    proptest!(|(
        mine in choice_strategy(),
        theirs in choice_strategy(),
        steps in steps_strategy(),
    )| {
        let mut sync = RoundSynchronizer::new();
        sync.arm();

        let actions = play(&mut sync, mine, theirs, &steps);
        let verdicts = judged(&actions);

        // Judging needs a completion after both choices are in
        let last_choice = steps
            .iter()
            .rposition(|step| !matches!(step, Step::Complete))
            .unwrap_or(0);
        let completion_after = steps[last_choice..].iter().any(|step| matches!(step, Step::Complete));

        prop_assert_eq!(verdicts.len(), usize::from(completion_after));
        if completion_after {
            prop_assert_eq!(verdicts[0], mine.versus(theirs));
        }
    });
}

#[test]
fn prop_both_sides_agree() {
    proptest!(|(
        a in choice_strategy(),
        b in choice_strategy(),
        steps_a in steps_strategy(),
        steps_b in steps_strategy(),
    )| {
        let mut alice = RoundSynchronizer::new();
        let mut bob = RoundSynchronizer::new();
        alice.arm();
        bob.arm();

        play(&mut alice, a, b, &steps_a);
        play(&mut bob, b, a, &steps_b);
        // Trailing completion, as the transport always delivers one last
        alice.on_transfer_complete();
        bob.on_transfer_complete();

        let (sa, sb) = (alice.score(), bob.score());
        prop_assert_eq!(sa.mine, sb.opponent);
        prop_assert_eq!(sa.opponent, sb.mine);
        prop_assert!(sa.mine + sa.opponent <= 1);
    });
}

#[test]
fn prop_score_accumulates_across_rounds() {
    proptest!(|(rounds in prop::collection::vec((choice_strategy(), choice_strategy()), 1..20))| {
        let mut sync = RoundSynchronizer::new();
        sync.arm();
        let mut expected = Score::default();

        for (mine, theirs) in rounds {
            sync.submit_choice(mine);
            sync.on_payload_received(&theirs.encode()).expect("valid token");
            sync.on_transfer_complete();

            match mine.versus(theirs) {
                Verdict::Win => expected.mine += 1,
                Verdict::Loss => expected.opponent += 1,
                Verdict::Tie => {},
            }
            prop_assert_eq!(sync.score(), expected);
            prop_assert!(sync.accepts_choice());
        }
    });
}

#[test]
fn prop_garbage_payload_never_touches_round() {
    proptest!(|(payload in prop::collection::vec(any::<u8>(), 0..16), mine in choice_strategy())| {
        let mut sync = RoundSynchronizer::new();
        sync.arm();
        sync.submit_choice(mine);
        let before = *sync.round();

        if sync.on_payload_received(&payload).is_err() {
            prop_assert_eq!(sync.round(), &before);
        }
    });
}
