//! In-memory world used by tests and the headless host.
//!
//! Only what the gameplay scripts observe is modelled: block types, block
//! containers, entities, players with a held item, dropped items, chat
//! broadcasts and opened forms. Positions inside an unloaded chunk make every
//! query fail with [`QueryError::Unloaded`].

use crate::access::{
    BlockRef, EntityId, EntityQuery, EntityRef, FormRequest, PlayerRef, QueryError, QueryResult,
    WorldAccess, AIR, PLAYER_ENTITY,
};
use crate::container::{BlockContainer, ContainerAccessor};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use voxelhooks_core::{BlockPos, DimensionId, ItemStack, Vec3};

/// Lowest y with blocks.
pub const MIN_BUILD_Y: i32 = -64;

/// Highest y with blocks (exclusive).
pub const MAX_BUILD_Y: i32 = 320;

/// A block recorded in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimBlock {
    /// Block type id.
    pub type_id: String,
    /// Inventory capability, if the block has one.
    pub container: Option<BlockContainer>,
}

/// An item stack lying in the world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedStack {
    /// Dimension it was dropped in.
    pub dimension: DimensionId,
    /// Drop location.
    pub location: Vec3,
    /// The dropped stack.
    pub stack: ItemStack,
}

#[derive(Debug, Clone)]
struct SimPlayer {
    name: String,
    held_item: Option<ItemStack>,
}

/// In-memory [`WorldAccess`] implementation.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    blocks: BTreeMap<(DimensionId, BlockPos), SimBlock>,
    entities: BTreeMap<EntityId, EntityRef>,
    players: BTreeMap<EntityId, SimPlayer>,
    unloaded_chunks: BTreeSet<(DimensionId, i32, i32)>,
    dropped: Vec<DroppedStack>,
    messages: Vec<String>,
    forms: Vec<(EntityId, FormRequest)>,
    next_entity_id: u64,
}

impl SimWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_entity_id += 1;
        EntityId(self.next_entity_id)
    }

    fn ensure_loaded(&self, dimension: DimensionId, pos: BlockPos) -> QueryResult<()> {
        let (chunk_x, chunk_z) = pos.chunk();
        if self.unloaded_chunks.contains(&(dimension, chunk_x, chunk_z)) {
            return Err(QueryError::Unloaded {
                dimension,
                chunk_x,
                chunk_z,
            });
        }
        Ok(())
    }

    /// Set the block type at `pos`, dropping any previous container.
    ///
    /// Returns the previous type (air when nothing was recorded).
    pub fn set_block(&mut self, dimension: DimensionId, pos: BlockPos, type_id: &str) -> String {
        let previous = if type_id == AIR {
            self.blocks.remove(&(dimension, pos))
        } else {
            self.blocks.insert(
                (dimension, pos),
                SimBlock {
                    type_id: type_id.to_string(),
                    container: None,
                },
            )
        };
        previous
            .map(|block| block.type_id)
            .unwrap_or_else(|| AIR.to_string())
    }

    /// Place a block that owns a container with `slots` slots.
    pub fn set_container_block(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
        type_id: &str,
        slots: usize,
    ) {
        self.blocks.insert(
            (dimension, pos),
            SimBlock {
                type_id: type_id.to_string(),
                container: Some(BlockContainer::new(slots)),
            },
        );
    }

    /// Recorded block at `pos`.
    pub fn block_at(&self, dimension: DimensionId, pos: BlockPos) -> Option<&SimBlock> {
        self.blocks.get(&(dimension, pos))
    }

    /// Container of the block at `pos`.
    pub fn container(&self, dimension: DimensionId, pos: BlockPos) -> Option<&BlockContainer> {
        self.block_at(dimension, pos)?.container.as_ref()
    }

    /// Mutable container of the block at `pos`.
    pub fn container_entry(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
    ) -> Option<&mut BlockContainer> {
        self.blocks.get_mut(&(dimension, pos))?.container.as_mut()
    }

    /// Connect a player, returning its entity id.
    pub fn add_player(&mut self, name: &str, dimension: DimensionId, location: Vec3) -> EntityId {
        let id = self.allocate_id();
        self.entities.insert(
            id,
            EntityRef {
                id,
                type_id: PLAYER_ENTITY.to_string(),
                dimension,
                location,
            },
        );
        self.players.insert(
            id,
            SimPlayer {
                name: name.to_string(),
                held_item: None,
            },
        );
        id
    }

    /// Put `stack` in the player's selected hotbar slot.
    pub fn set_held_item(&mut self, player: EntityId, stack: Option<ItemStack>) -> bool {
        match self.players.get_mut(&player) {
            Some(entry) => {
                entry.held_item = stack;
                true
            }
            None => false,
        }
    }

    /// Move an entity (or player).
    pub fn move_entity(&mut self, id: EntityId, dimension: DimensionId, location: Vec3) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.dimension = dimension;
                entity.location = location;
                true
            }
            None => false,
        }
    }

    /// Spawn an entity without going through the load check.
    pub fn insert_entity(&mut self, dimension: DimensionId, type_id: &str, location: Vec3) -> EntityId {
        let id = self.allocate_id();
        self.entities.insert(
            id,
            EntityRef {
                id,
                type_id: type_id.to_string(),
                dimension,
                location,
            },
        );
        id
    }

    /// Remove an entity, returning its last snapshot.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<EntityRef> {
        self.players.remove(&id);
        self.entities.remove(&id)
    }

    /// Snapshot of an entity.
    pub fn entity(&self, id: EntityId) -> Option<&EntityRef> {
        self.entities.get(&id)
    }

    /// Entities of `type_id` in `dimension`.
    pub fn entities_of_type<'a>(
        &'a self,
        dimension: DimensionId,
        type_id: &'a str,
    ) -> impl Iterator<Item = &'a EntityRef> + 'a {
        self.entities
            .values()
            .filter(move |entity| entity.dimension == dimension && entity.type_id == type_id)
    }

    /// Mark the chunk column containing `pos` as unloaded.
    pub fn unload_chunk_at(&mut self, dimension: DimensionId, pos: BlockPos) {
        let (chunk_x, chunk_z) = pos.chunk();
        self.unloaded_chunks.insert((dimension, chunk_x, chunk_z));
    }

    /// Mark the chunk column containing `pos` as loaded again.
    pub fn load_chunk_at(&mut self, dimension: DimensionId, pos: BlockPos) {
        let (chunk_x, chunk_z) = pos.chunk();
        self.unloaded_chunks.remove(&(dimension, chunk_x, chunk_z));
    }

    /// Items dropped so far.
    pub fn dropped_items(&self) -> &[DroppedStack] {
        &self.dropped
    }

    /// Chat messages broadcast so far.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Forms opened so far.
    pub fn forms(&self) -> &[(EntityId, FormRequest)] {
        &self.forms
    }
}

impl WorldAccess for SimWorld {
    fn block(&self, dimension: DimensionId, pos: BlockPos) -> QueryResult<Option<BlockRef>> {
        self.ensure_loaded(dimension, pos)?;
        if !(MIN_BUILD_Y..MAX_BUILD_Y).contains(&pos.y) {
            return Ok(None);
        }

        let type_id = self
            .blocks
            .get(&(dimension, pos))
            .map(|block| block.type_id.clone())
            .unwrap_or_else(|| AIR.to_string());
        Ok(Some(BlockRef {
            dimension,
            location: pos,
            type_id,
        }))
    }

    fn spawn_item(
        &mut self,
        dimension: DimensionId,
        stack: ItemStack,
        location: Vec3,
    ) -> QueryResult<()> {
        self.ensure_loaded(dimension, location.floor())?;
        self.dropped.push(DroppedStack {
            dimension,
            location,
            stack,
        });
        Ok(())
    }

    fn spawn_entity(
        &mut self,
        dimension: DimensionId,
        entity_type: &str,
        location: Vec3,
    ) -> QueryResult<EntityId> {
        self.ensure_loaded(dimension, location.floor())?;
        Ok(self.insert_entity(dimension, entity_type, location))
    }

    fn entities_near(
        &self,
        dimension: DimensionId,
        query: &EntityQuery,
    ) -> QueryResult<Vec<EntityRef>> {
        self.ensure_loaded(dimension, query.location.floor())?;
        Ok(self
            .entities
            .values()
            .filter(|entity| entity.dimension == dimension)
            .filter(|entity| {
                query
                    .entity_type
                    .as_deref()
                    .map_or(true, |wanted| entity.type_id == wanted)
            })
            .filter(|entity| entity.location.distance(query.location) <= query.max_distance)
            .cloned()
            .collect())
    }

    fn players(&self) -> Vec<PlayerRef> {
        self.players
            .iter()
            .filter_map(|(id, player)| {
                let entity = self.entities.get(id)?;
                Some(PlayerRef {
                    id: *id,
                    name: player.name.clone(),
                    dimension: entity.dimension,
                    location: entity.location,
                })
            })
            .collect()
    }

    fn held_item(&self, player: EntityId) -> QueryResult<Option<ItemStack>> {
        self.players
            .get(&player)
            .map(|entry| entry.held_item.clone())
            .ok_or(QueryError::UnknownEntity(player))
    }

    fn container_mut(
        &mut self,
        dimension: DimensionId,
        pos: BlockPos,
    ) -> Option<&mut dyn ContainerAccessor> {
        self.container_entry(dimension, pos)
            .map(|container| container as &mut dyn ContainerAccessor)
    }

    fn broadcast(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn show_form(&mut self, player: EntityId, form: FormRequest) {
        self.forms.push((player, form));
    }
}
