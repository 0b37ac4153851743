//! Turmoil-based Environment implementation for deterministic testing.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use skirmish_core::env::Environment;

/// Simulation environment using Turmoil's virtual time and seeded RNG.
///
/// - **Virtual Time**: `now()` returns Turmoil's simulated time, which
///   advances instantly via `sleep()`.
///
/// - **Seeded RNG**: `random_bytes()` uses ChaCha20Rng seeded with a fixed
///   value, so generated player names are the same on every run.
///
/// Different seeds give different (still reproducible) names:
/// ```ignore
/// let env = SimEnv::with_seed(12345);
/// ```
///
/// # Panics
///
/// `now()` and `sleep()` panic outside a Tokio runtime. Inside a Turmoil
/// simulation they follow virtual time.
#[derive(Clone)]
pub struct SimEnv {
    /// Shared across clones so every clone continues the same sequence
    rng: Arc<Mutex<ChaCha20Rng>>,
    seed: u64,
}

impl SimEnv {
    /// Create a new SimEnv with default seed (0)
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a new SimEnv with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))), seed }
    }

    /// The seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now().into()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn random_bytes(&self, dest: &mut [u8]) {
        // Single-threaded simulation: a poisoned lock only follows a test panic
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(dest);
    }
}
