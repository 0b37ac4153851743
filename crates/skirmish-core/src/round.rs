//! Round synchronization between the two paired players.
//!
//! Each round both sides pick a [`Choice`], send it, and judge once both
//! choices are known. Neither side waits for the other: a round resolves as
//! soon as the last of the two choices lands, regardless of which one arrived
//! first.
//!
//! # Architecture
//!
//! - **Sans-IO**: methods return [`RoundAction`]s; the session facade performs
//!   the send and updates presentation state
//! - **Predicate judging**: a round is judged when both choices are present,
//!   not after counting transfer completions. Extra or duplicated completions
//!   are harmless.
//!
//! # Flow
//!
//! ```text
//! submit_choice(mine)          on_payload_received(theirs)
//!        │                              │
//!        ↓                              ↓
//!   my_choice = Some           opponent_choice = Some
//!        │                              │
//!        └──────── on_transfer_complete ┘
//!                        │
//!               both present? ── no ──> wait
//!                        │
//!                       yes
//!                        ↓
//!        judge → score → clear round → re-enable input
//! ```

use std::fmt;

use serde::Serialize;
use skirmish_proto::{Choice, ProtocolError, Verdict};

/// Running score for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Score {
    /// Rounds won by the local player
    pub mine: u32,
    /// Rounds won by the opponent
    pub opponent: u32,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.mine, self.opponent)
    }
}

/// Choices collected for the round in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundState {
    /// What we picked, once submitted
    pub my_choice: Option<Choice>,
    /// What the opponent picked, once received
    pub opponent_choice: Option<Choice>,
}

impl RoundState {
    /// Both choices, if the round is ready to judge.
    #[must_use]
    pub fn both(&self) -> Option<(Choice, Choice)> {
        self.my_choice.zip(self.opponent_choice)
    }
}

/// A judged round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Local choice
    pub mine: Choice,
    /// Opponent choice
    pub theirs: Choice,
    /// Result from the local side
    pub verdict: Verdict,
}

impl RoundOutcome {
    /// Judge `mine` against `theirs`.
    pub fn judge(mine: Choice, theirs: Choice) -> Self {
        Self { mine, theirs, verdict: mine.versus(theirs) }
    }
}

/// Status line shown after the round.
impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            Verdict::Win => write!(f, "{} beats {}", self.mine, self.theirs),
            Verdict::Loss => write!(f, "{} loses to {}", self.mine, self.theirs),
            Verdict::Tie => write!(f, "You both chose {}", self.mine),
        }
    }
}

/// Actions returned by the round synchronizer, executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundAction {
    /// Enable or disable the three choice controls
    SetInputEnabled(bool),
    /// Replace the status line
    Status(String),
    /// Encode and send this choice to the active peer
    SendChoice(Choice),
    /// A round was judged and the score updated
    Judged(RoundOutcome),
}

/// Per-session round synchronizer.
#[derive(Debug, Clone, Default)]
pub struct RoundSynchronizer {
    round: RoundState,
    score: Score,
    /// Whether a peer is connected and choices are accepted
    armed: bool,
}

impl RoundSynchronizer {
    /// Create a disarmed synchronizer with a zero score.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score.
    pub fn score(&self) -> Score {
        self.score
    }

    /// Choices collected so far this round.
    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Whether submissions are currently accepted.
    pub fn accepts_choice(&self) -> bool {
        self.armed && self.round.my_choice.is_none()
    }

    /// A peer connected: start a fresh round and enable input.
    ///
    /// The score is kept. Only [`Self::reset`] zeroes it.
    pub fn arm(&mut self) -> Vec<RoundAction> {
        self.armed = true;
        self.round = RoundState::default();
        vec![RoundAction::SetInputEnabled(true)]
    }

    /// Full session reset: clear the round, zero the score, disarm.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Local player picked `choice`.
    ///
    /// Silent no-op unless armed and no choice is pending for this round.
    /// The send comes last so that a failed send can be undone with
    /// [`Self::withdraw_choice`] after input was disabled.
    pub fn submit_choice(&mut self, choice: Choice) -> Vec<RoundAction> {
        if !self.accepts_choice() {
            tracing::debug!(%choice, armed = self.armed, "premature choice ignored");
            return vec![];
        }

        self.round.my_choice = Some(choice);

        vec![
            RoundAction::SetInputEnabled(false),
            RoundAction::Status(format!("You chose {choice}")),
            RoundAction::SendChoice(choice),
        ]
    }

    /// Undo a submission whose payload never left.
    pub fn withdraw_choice(&mut self) -> Vec<RoundAction> {
        match self.round.my_choice.take() {
            Some(choice) if self.armed => vec![
                RoundAction::Status(format!("Could not send {choice}")),
                RoundAction::SetInputEnabled(true),
            ],
            _ => vec![],
        }
    }

    /// Opponent payload arrived.
    ///
    /// A second payload before judging replaces the first.
    ///
    /// # Errors
    ///
    /// Returns the decoding error if the payload is not a choice token. The
    /// round state is left untouched.
    pub fn on_payload_received(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
        let choice = Choice::decode(payload)?;

        if let Some(previous) = self.round.opponent_choice.replace(choice) {
            tracing::debug!(%previous, %choice, "opponent choice replaced before judging");
        }

        Ok(())
    }

    /// A payload transfer finished, in either direction.
    ///
    /// Judges the round if both choices are present; otherwise nothing.
    pub fn on_transfer_complete(&mut self) -> Vec<RoundAction> {
        let Some((mine, theirs)) = self.round.both() else {
            return vec![];
        };

        let outcome = RoundOutcome::judge(mine, theirs);
        match outcome.verdict {
            Verdict::Win => self.score.mine += 1,
            Verdict::Loss => self.score.opponent += 1,
            Verdict::Tie => {},
        }
        self.round = RoundState::default();

        tracing::info!(%mine, %theirs, verdict = ?outcome.verdict, score = %self.score, "round judged");

        vec![
            RoundAction::Judged(outcome),
            RoundAction::Status(outcome.to_string()),
            RoundAction::SetInputEnabled(true),
        ]
    }
}
