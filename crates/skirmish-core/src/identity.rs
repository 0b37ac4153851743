//! Local player identity.

use serde::{Deserialize, Serialize};

use crate::env::Environment;

const ADJECTIVES: [&str; 10] =
    ["Amber", "Brisk", "Copper", "Dusky", "Ember", "Frosty", "Gilded", "Hollow", "Ivory", "Jade"];

const NOUNS: [&str; 12] = [
    "Badger", "Comet", "Falcon", "Harbor", "Lantern", "Meadow", "Otter", "Pebble", "Quarry", "Raven",
    "Thistle", "Willow",
];

/// Name this instance advertises and requests connections with.
///
/// Created once per session and never changed, not even by a session reset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalIdentity {
    display_name: String,
}

impl LocalIdentity {
    /// Use an explicit display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self { display_name: display_name.into() }
    }

    /// Generate a two-word codename ("Copper Falcon") from the environment's
    /// RNG.
    pub fn generate<E: Environment>(env: &E) -> Self {
        let adjective = ADJECTIVES[env.random_index(ADJECTIVES.len())];
        let noun = NOUNS[env.random_index(NOUNS.len())];
        Self::new(format!("{adjective} {noun}"))
    }

    /// The advertised name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}
