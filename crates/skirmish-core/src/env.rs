//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples session logic from system resources
//! (time and randomness). This enables:
//!
//! - Deterministic Simulation: the harness provides a virtual clock and a
//!   seeded RNG, so a failing pairing scenario replays identically.
//!
//! - Production Runtime: a host application supplies the real clock and OS
//!   entropy without any change to the coordinator or synchronizer.
//!
//! # Where Randomness Is Used
//!
//! The only random decision in the core is the default human-readable name
//! of the local player (see [`crate::identity::LocalIdentity::generate`]).
//! Routing it through the environment keeps simulated players' names stable
//! across runs.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleeping.
///
/// # Implementations
///
/// - Simulation (`skirmish-harness::SimEnv`): Turmoil virtual time, ChaCha20
///   RNG seeded per test.
/// - Production: supplied by the embedding application.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Type representing a point in time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Returns the current time.
    ///
    /// Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver and test code should sleep. The coordinator and the round
    /// synchronizer never wait on time.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    ///
    /// Simulation implementations MUST be seeded and log or expose the seed
    /// for reproducibility.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Picks a uniformly-ish random index below `len`.
    ///
    /// Returns 0 when `len` is 0 so callers indexing a non-empty table never
    /// need a separate guard.
    fn random_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.random_u64() % len as u64) as usize
    }
}
