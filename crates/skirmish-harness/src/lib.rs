//! Deterministic simulation harness for skirmish session testing.
//!
//! This crate provides a seeded, Turmoil-timed `Environment`, an in-memory
//! nearby radio implementing `PeerTransport`, a call-recording transport, and
//! a scenario framework for reproducible multi-player pairing tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod recording;
pub mod scenario;
pub mod sim_env;
pub mod sim_transport;

pub use recording::{RecordingTransport, TransportCall};
pub use sim_env::SimEnv;
pub use sim_transport::{FaultConfig, SimMedium, SimTransport};
