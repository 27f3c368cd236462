//! World access seam used by gameplay scripts.
//!
//! Scripts never hold ambient references to the host world. Every handler is
//! handed a `&mut dyn WorldAccess` and performs its queries and mutations
//! through it, which keeps them runnable against [`crate::SimWorld`] in tests.

use crate::container::ContainerAccessor;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use voxelhooks_core::{BlockPos, DimensionId, ItemStack, Vec3};

/// Entity type id of players.
pub const PLAYER_ENTITY: &str = "minecraft:player";

/// Block type id of air.
pub const AIR: &str = "minecraft:air";

/// Runtime entity identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure of a single world query.
///
/// These are transient: the caller abandons the operation for this tick and
/// never retries it within the same tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The position lies in a chunk that isn't loaded.
    #[error("chunk ({chunk_x}, {chunk_z}) in {dimension} is not loaded")]
    Unloaded {
        /// Dimension of the query.
        dimension: DimensionId,
        /// Chunk column x.
        chunk_x: i32,
        /// Chunk column z.
        chunk_z: i32,
    },
    /// The referenced entity no longer exists.
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),
}

/// Result alias for world queries.
pub type QueryResult<T> = Result<T, QueryError>;

/// Snapshot of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    /// Dimension the block lives in.
    pub dimension: DimensionId,
    /// Block position.
    pub location: BlockPos,
    /// Block type id (`minecraft:purpur_block`).
    pub type_id: String,
}

impl BlockRef {
    /// Whether the block is of type `type_id`.
    pub fn is(&self, type_id: &str) -> bool {
        self.type_id == type_id
    }
}

/// Snapshot of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Runtime id.
    pub id: EntityId,
    /// Entity type id (`minecraft:shulker`).
    pub type_id: String,
    /// Dimension the entity lives in.
    pub dimension: DimensionId,
    /// World-space location.
    pub location: Vec3,
}

impl EntityRef {
    /// Whether this entity is a player.
    pub fn is_player(&self) -> bool {
        self.type_id == PLAYER_ENTITY
    }
}

/// Snapshot of a connected player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Runtime id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Dimension the player is in.
    pub dimension: DimensionId,
    /// World-space location.
    pub location: Vec3,
}

/// Filter for [`WorldAccess::entities_near`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    /// Restrict to one entity type.
    pub entity_type: Option<String>,
    /// Query center.
    pub location: Vec3,
    /// Maximum distance from `location` (inclusive).
    pub max_distance: f64,
}

/// Data attached to a custom form so the UI can address the block and player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormScriptData {
    /// Block x.
    pub block_x: i32,
    /// Block y.
    pub block_y: i32,
    /// Block z.
    pub block_z: i32,
    /// Player the form belongs to.
    pub player_id: EntityId,
}

/// Request to open a custom modal form for a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRequest {
    /// Form title.
    pub title: String,
    /// Custom UI definition id.
    pub custom_form_id: String,
    /// Script payload handed to the UI.
    pub script_data: FormScriptData,
}

/// Query/mutate operations the host world offers to scripts.
pub trait WorldAccess {
    /// Block at `pos`, `Ok(None)` when nothing is recorded there.
    fn block(&self, dimension: DimensionId, pos: BlockPos) -> QueryResult<Option<BlockRef>>;

    /// Drop an item stack into the world.
    fn spawn_item(
        &mut self,
        dimension: DimensionId,
        stack: ItemStack,
        location: Vec3,
    ) -> QueryResult<()>;

    /// Spawn an entity, returning its id.
    fn spawn_entity(
        &mut self,
        dimension: DimensionId,
        entity_type: &str,
        location: Vec3,
    ) -> QueryResult<EntityId>;

    /// Entities within `query.max_distance` of `query.location`.
    fn entities_near(
        &self,
        dimension: DimensionId,
        query: &EntityQuery,
    ) -> QueryResult<Vec<EntityRef>>;

    /// All connected players.
    fn players(&self) -> Vec<PlayerRef>;

    /// Item in the player's selected hotbar slot.
    fn held_item(&self, player: EntityId) -> QueryResult<Option<ItemStack>>;

    /// Inventory capability of the block at `pos`, if it has one.
    fn container_mut(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
    ) -> Option<&mut dyn ContainerAccessor>;

    /// Send a chat message to every player.
    fn broadcast(&mut self, message: &str);

    /// Open a custom form for `player`.
    fn show_form(&mut self, player: EntityId, form: FormRequest);
}
