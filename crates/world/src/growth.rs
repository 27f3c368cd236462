//! Pale oak growth rewards.
//!
//! A pale oak tree growing has a small chance of leaving a creaking heart
//! behind. Growth is observed two ways: the host's structure-grow event, and a
//! follow-up check one tick after a sapling is placed or replaced.

use crate::access::{QueryResult, WorldAccess, AIR};
use serde::{Deserialize, Serialize};
use tracing::debug;
use voxelhooks_core::{BlockPos, DimensionId, ItemStack, RandomSource};

/// Pale oak sapling block id.
pub const PALE_OAK_SAPLING: &str = "minecraft:pale_oak_sapling";

/// Structure id reported when a pale oak tree grows.
pub const PALE_OAK_TREE: &str = "minecraft:pale_oak_tree";

/// Reward item id.
pub const CREAKING_HEART: &str = "minecraft:creaking_heart";

/// Chance of a creaking heart per observed growth.
pub const DEFAULT_DROP_CHANCE: f64 = 0.02;

/// Tunables for growth rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthDropSettings {
    /// Probability in `[0, 1]` that a growth drops a creaking heart.
    pub drop_chance: f64,
}

impl Default for GrowthDropSettings {
    fn default() -> Self {
        Self {
            drop_chance: DEFAULT_DROP_CHANCE,
        }
    }
}

/// Handle a structure-grow event. Returns `true` when a heart was dropped.
pub fn on_structure_grow(
    world: &mut dyn WorldAccess,
    rng: &mut dyn RandomSource,
    settings: &GrowthDropSettings,
    dimension: DimensionId,
    location: BlockPos,
    structure_id: &str,
) -> QueryResult<bool> {
    if structure_id != PALE_OAK_TREE {
        return Ok(false);
    }

    if rng.next_unit() >= settings.drop_chance {
        return Ok(false);
    }

    world.spawn_item(
        dimension,
        ItemStack::new(CREAKING_HEART, 1),
        location.center(),
    )?;
    debug!(%location, "Pale oak growth dropped a creaking heart");
    Ok(true)
}

/// Whether placing `block_type` should schedule a sapling check.
pub fn should_check_after_place(block_type: &str) -> bool {
    block_type == PALE_OAK_SAPLING
}

/// Whether a block change from `previous` to `current` looks like a sapling growing.
///
/// Only changes away from a pale oak sapling count; other blocks turning into
/// something else never schedule a check.
pub fn should_check_after_change(previous: &str, current: &str) -> bool {
    previous == PALE_OAK_SAPLING && current != PALE_OAK_SAPLING && current != AIR
}

/// Deferred sapling check, run the tick after a placement or change.
///
/// Saplings only grow in the Overworld, so the check always reads there. A
/// sapling still standing at `location` means nothing grew.
pub fn check_sapling_growth(
    world: &mut dyn WorldAccess,
    rng: &mut dyn RandomSource,
    settings: &GrowthDropSettings,
    location: BlockPos,
) -> QueryResult<bool> {
    let block = world.block(DimensionId::Overworld, location)?;
    if block.is_some_and(|block| block.is(PALE_OAK_SAPLING)) {
        return Ok(false);
    }

    if rng.next_unit() >= settings.drop_chance {
        return Ok(false);
    }

    world.spawn_item(
        DimensionId::Overworld,
        ItemStack::new(CREAKING_HEART, 1),
        location.corner(),
    )?;
    world.broadcast(&format!(
        "§a[Pale Oak] §eA Creaking Heart dropped at {location}!"
    ));
    Ok(true)
}
