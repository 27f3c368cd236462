#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod dimension;
pub mod enchantment;
pub mod item;
pub mod position;
pub mod random;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use dimension::DimensionId;
pub use enchantment::{Enchantment, EnchantmentType};
pub use item::{ItemId, ItemStack, DEFAULT_STACK_SIZE};
pub use position::{BlockPos, Vec3};
pub use random::RandomSource;

/// Fixed tick type (20 TPS => 50 ms per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }

    /// Whether this tick falls on a period boundary of `interval` ticks.
    ///
    /// An interval of 0 is treated as 1 (every tick).
    pub fn is_every(self, interval: u64) -> bool {
        self.0 % interval.max(1) == 0
    }
}

/// Helper to derive a reproducible RNG seeded by world + tick domains.
pub fn scoped_rng(world_seed: u64, chunk_hash: u64, tick: SimTick) -> StdRng {
    let seed = world_seed ^ chunk_hash ^ tick.0;
    StdRng::seed_from_u64(seed)
}
