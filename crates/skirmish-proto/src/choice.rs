//! Round choices and the judging rule.
//!
//! # Beats Relation
//!
//! ```text
//!        ROCK
//!       ↗    ↘
//!  PAPER ←──── SCISSORS
//! ```
//!
//! An arrow points from the winner to the loser: ROCK beats SCISSORS,
//! SCISSORS beats PAPER, PAPER beats ROCK. Every choice beats exactly one
//! other choice and loses to exactly one other choice. Equal choices tie.

use std::{fmt, str};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Longest wire token (`SCISSORS`).
pub const MAX_PAYLOAD_SIZE: usize = 8;

/// One player's pick for a round.
///
/// # Representation
///
/// The wire token is the uppercase variant name. The serde representation
/// uses the same string so that snapshots and configs agree with the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Choice {
    /// Beats scissors
    Rock,
    /// Beats rock
    Paper,
    /// Beats paper
    Scissors,
}

/// Result of judging one choice against another, from the first player's
/// point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// First choice beats the second
    Win,
    /// Second choice beats the first
    Loss,
    /// Both choices are equal
    Tie,
}

impl Choice {
    /// All choices, in wire-token order.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// The wire token for this choice.
    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Choice::Rock => "ROCK",
            Choice::Paper => "PAPER",
            Choice::Scissors => "SCISSORS",
        }
    }

    /// Parse an exact wire token. Returns `None` for anything else.
    ///
    /// Matching is case-sensitive: `"rock"` is not a valid token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|choice| choice.as_token() == token)
    }

    /// The one choice this choice beats.
    #[must_use]
    pub const fn beaten(self) -> Self {
        match self {
            Choice::Rock => Choice::Scissors,
            Choice::Paper => Choice::Rock,
            Choice::Scissors => Choice::Paper,
        }
    }

    /// Whether `self` beats `other`.
    #[must_use]
    pub fn beats(self, other: Choice) -> bool {
        self.beaten() == other
    }

    /// Judge `self` (mine) against `other` (theirs).
    #[must_use]
    pub fn versus(self, other: Choice) -> Verdict {
        if self == other {
            Verdict::Tie
        } else if self.beats(other) {
            Verdict::Win
        } else {
            Verdict::Loss
        }
    }

    /// Encode as a round payload.
    #[must_use]
    pub fn encode(self) -> Bytes {
        Bytes::from_static(self.as_token().as_bytes())
    }

    /// Decode a round payload.
    ///
    /// # Errors
    ///
    /// - `Empty` if the payload has no bytes
    /// - `PayloadTooLarge` if it is longer than [`MAX_PAYLOAD_SIZE`]
    /// - `InvalidUtf8` if the bytes are not UTF-8
    /// - `UnknownToken` if the text is not an exact token
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.is_empty() {
            return Err(ProtocolError::Empty);
        }

        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let text = str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;

        Self::from_token(text).ok_or_else(|| ProtocolError::UnknownToken(text.to_string()))
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl str::FromStr for Choice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s.as_bytes())
    }
}

impl Verdict {
    /// The same verdict seen from the other player's side.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Verdict::Win => Verdict::Loss,
            Verdict::Loss => Verdict::Win,
            Verdict::Tie => Verdict::Tie,
        }
    }
}
