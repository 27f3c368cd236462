//! Shulker loot and respawning.
//!
//! Shulkers killed by a player drop levitation arrows, more with Looting.
//! End cities slowly repopulate: every check interval, each player in the End
//! has a small chance to respawn a shulker on a nearby purpur block.

use crate::access::{
    EntityId, EntityQuery, EntityRef, PlayerRef, QueryResult, WorldAccess, AIR,
};
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};
use voxelhooks_core::{
    BlockPos, DimensionId, EnchantmentType, ItemStack, RandomSource, Vec3,
};

/// Shulker entity id.
pub const SHULKER: &str = "minecraft:shulker";

/// Block a shulker may respawn on.
pub const PURPUR_BLOCK: &str = "minecraft:purpur_block";

/// Dropped arrow item id.
pub const TIPPED_ARROW: &str = "minecraft:tipped_arrow";

/// Auxiliary value that makes a tipped arrow carry levitation.
pub const LEVITATION_POTION_ID: u16 = 25;

/// Tunables for the respawn loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShulkerSettings {
    /// Per-player chance of attempting a respawn on a check tick.
    pub respawn_chance: f64,
    /// Ticks between respawn checks (20 = once per second).
    pub check_interval_ticks: u64,
    /// Horizontal and vertical search radius around the player.
    pub check_range: f64,
    /// Lowest candidate y (end city floor).
    pub min_y: f64,
    /// Highest candidate y.
    pub max_y: f64,
    /// No respawn while another shulker is within this distance.
    pub cluster_radius: f64,
}

impl Default for ShulkerSettings {
    fn default() -> Self {
        Self {
            respawn_chance: 0.005,
            check_interval_ticks: 20,
            check_range: 20.0,
            min_y: 40.0,
            max_y: 100.0,
            cluster_radius: 8.0,
        }
    }
}

/// Upper bound of the arrow drop for a Looting level.
pub fn max_drop_for_looting(looting_level: u8) -> u32 {
    match looting_level {
        0 => 3,
        1 => 5,
        2 => 7,
        _ => 10,
    }
}

/// Arrow count in `0..=max_drop_for_looting(level)`.
pub fn roll_drop_count(looting_level: u8, rng: &mut dyn RandomSource) -> u32 {
    rng.next_up_to(max_drop_for_looting(looting_level))
}

/// Looting level of the killer's held item; 0 when it can't be read.
pub fn looting_level(world: &dyn WorldAccess, killer: EntityId) -> u8 {
    match world.held_item(killer) {
        Ok(Some(stack)) => stack.enchantment_level(EnchantmentType::Looting),
        Ok(None) => 0,
        Err(err) => {
            warn!(%killer, %err, "Failed to read killer's held item; assuming no Looting");
            0
        }
    }
}

/// Handle an entity death, returning the number of arrows dropped.
pub fn on_entity_die(
    world: &mut dyn WorldAccess,
    rng: &mut dyn RandomSource,
    dead: &EntityRef,
    killer: Option<&EntityRef>,
) -> QueryResult<u32> {
    if dead.type_id != SHULKER {
        return Ok(0);
    }
    let Some(killer) = killer.filter(|killer| killer.is_player()) else {
        return Ok(0);
    };

    let level = looting_level(world, killer.id);
    let count = roll_drop_count(level, rng);
    if count > 0 {
        let arrows = ItemStack::new(TIPPED_ARROW, count).with_aux_value(LEVITATION_POTION_ID);
        world.spawn_item(dead.dimension, arrows, dead.location)?;
    }
    Ok(count)
}

/// What a respawn attempt near one player ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum RespawnAttempt {
    /// The player isn't in the End.
    NotInEnd,
    /// The chance roll failed.
    SkippedRoll,
    /// The candidate block isn't purpur.
    NoPurpur(BlockPos),
    /// The block above the candidate isn't air.
    Obstructed(BlockPos),
    /// Another shulker is too close.
    Crowded(BlockPos),
    /// A shulker was spawned.
    Spawned {
        /// New entity.
        entity: EntityId,
        /// Purpur block it sits on.
        location: BlockPos,
    },
}

/// Pick a candidate block around `origin`, consuming three rolls (x, y, z).
pub fn respawn_candidate(
    origin: Vec3,
    settings: &ShulkerSettings,
    rng: &mut dyn RandomSource,
) -> BlockPos {
    let range = settings.check_range;
    let x = origin.x + (rng.next_unit() - 0.5) * 2.0 * range;
    // max/min rather than clamp: a malformed band must not panic mid-tick.
    let y = (origin.y + (rng.next_unit() - 0.5) * 2.0 * range)
        .max(settings.min_y)
        .min(settings.max_y);
    let z = origin.z + (rng.next_unit() - 0.5) * 2.0 * range;
    Vec3::new(x, y, z).floor()
}

/// Attempt one respawn near `player`.
pub fn try_respawn_near(
    world: &mut dyn WorldAccess,
    rng: &mut dyn RandomSource,
    settings: &ShulkerSettings,
    player: &PlayerRef,
) -> QueryResult<RespawnAttempt> {
    if player.dimension != DimensionId::End {
        return Ok(RespawnAttempt::NotInEnd);
    }
    if rng.next_unit() > settings.respawn_chance {
        return Ok(RespawnAttempt::SkippedRoll);
    }

    let candidate = respawn_candidate(player.location, settings, rng);
    let dimension = DimensionId::End;

    let on_purpur = world
        .block(dimension, candidate)?
        .is_some_and(|block| block.is(PURPUR_BLOCK));
    if !on_purpur {
        return Ok(RespawnAttempt::NoPurpur(candidate));
    }

    let clear_above = world
        .block(dimension, candidate.above())?
        .is_some_and(|block| block.is(AIR));
    if !clear_above {
        return Ok(RespawnAttempt::Obstructed(candidate));
    }

    let nearby = world.entities_near(
        dimension,
        &EntityQuery {
            entity_type: Some(SHULKER.to_string()),
            location: candidate.corner(),
            max_distance: settings.cluster_radius,
        },
    )?;
    if !nearby.is_empty() {
        return Ok(RespawnAttempt::Crowded(candidate));
    }

    let entity = world.spawn_entity(dimension, SHULKER, candidate.center())?;
    info!(%entity, location = %candidate, "Shulker respawned");
    Ok(RespawnAttempt::Spawned {
        entity,
        location: candidate,
    })
}

/// Run the respawn loop for `tick`; a no-op off the check interval.
///
/// Query failures (usually an unloaded chunk) abandon that player's attempt.
pub fn run_respawn_checks(
    world: &mut dyn WorldAccess,
    rng: &mut dyn RandomSource,
    settings: &ShulkerSettings,
    tick: u64,
) -> Vec<RespawnAttempt> {
    if tick % settings.check_interval_ticks.max(1) != 0 {
        return Vec::new();
    }

    let mut attempts = Vec::new();
    for player in world.players() {
        match try_respawn_near(world, rng, settings, &player) {
            Ok(attempt) => attempts.push(attempt),
            Err(err) => trace!(player = %player.id, %err, "Shulker respawn check aborted"),
        }
    }
    attempts
}
