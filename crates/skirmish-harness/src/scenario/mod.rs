//! Scenario testing framework for deterministic simulation tests.
//!
//! This module provides a declarative API for writing multi-player pairing
//! tests that follow the Oracle Pattern. Scenarios create the players on a
//! shared [`crate::SimMedium`], deliver events until the world is quiet, run
//! scripted steps, and enforce oracle verification at the end.

mod actor;
mod builder;
pub mod oracle;
mod world;

pub use actor::Player;
pub use builder::{RunnableScenario, Scenario};
pub use oracle::OracleFn;
pub use world::World;
