//! # Skirmish Protocol: Wire Format
//!
//! This crate implements the payload layer exchanged between two paired
//! skirmish peers.
//!
//! ## Protocol Design
//!
//! A round carries exactly one message per direction: the sender's
//! [`Choice`]. The message is the choice's uppercase ASCII name (`ROCK`,
//! `PAPER`, `SCISSORS`) encoded as UTF-8 with no length prefix and no
//! framing. The nearby transport delivers each payload atomically, so the
//! payload boundary is the message boundary.
//!
//! ## Implementation Notes
//!
//! - **Bounded Decoding**: Payloads longer than [`MAX_PAYLOAD_SIZE`] are
//!   rejected before any UTF-8 validation or token matching happens.
//!
//! - **Closed Token Set**: Decoding is an exact, case-sensitive match against
//!   the three known tokens. Anything else is a [`ProtocolError`], never a
//!   panic.
//!
//! - **Judging Lives Here**: The cyclic "beats" relation is part of the
//!   protocol, so both peers compute the same [`Verdict`] from the same pair of
//!   choices (mirrored).
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod choice;
pub mod errors;

pub use choice::{Choice, MAX_PAYLOAD_SIZE, Verdict};
pub use errors::{ProtocolError, Result};
