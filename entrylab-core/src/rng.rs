//! Seed hierarchy for parameter search.
//!
//! One master seed expands into a sub-seed per `(stream, trial)` pair by
//! BLAKE3 hashing. Derivation is a pure function of its inputs, so trial 17
//! gets the same parameters whether it runs first, last, or on another thread.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream label used by the optimizer when sampling trial parameters.
pub const SAMPLE_STREAM: &str = "sample";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Hierarchy with a master seed drawn from OS entropy. The seed is kept
    /// below `i64::MAX` so it can be stored as a TOML integer.
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>() >> 1)
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for `trial` within a named stream.
    pub fn sub_seed(&self, stream: &str, trial: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(stream.as_bytes());
        hasher.update(&trial.to_le_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    pub fn rng_for(&self, stream: &str, trial: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(stream, trial))
    }
}
