//! World event payloads.
//!
//! The host delivers events as loosely shaped records. They are decoded once,
//! here, into [`WorldEvent`]; handlers only ever see the validated enum.

use crate::access::{EntityId, EntityRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use voxelhooks_core::{BlockPos, DimensionId};

/// Discriminant used for subscription routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The world finished loading.
    WorldInitialize,
    /// Fixed-rate simulation step.
    Tick,
    /// A player placed a block.
    BlockPlace,
    /// A block changed type.
    BlockChange,
    /// A tree or other structure grew.
    StructureGrow,
    /// An entity died.
    EntityDie,
    /// A player interacted with a block.
    BlockInteract,
}

impl EventKind {
    /// Canonical name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WorldInitialize => "world_initialize",
            Self::Tick => "tick",
            Self::BlockPlace => "block_place",
            Self::BlockChange => "block_change",
            Self::StructureGrow => "structure_grow",
            Self::EntityDie => "entity_die",
            Self::BlockInteract => "block_interact",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded world event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", deny_unknown_fields)]
pub enum WorldEvent {
    /// The world finished loading.
    WorldInitialize,
    /// Fixed-rate simulation step.
    Tick {
        /// Tick counter since world start.
        current_tick: u64,
    },
    /// A player placed a block.
    BlockPlace {
        /// Dimension of the block.
        dimension: DimensionId,
        /// Block position.
        location: BlockPos,
        /// Placed block type.
        block_type: String,
        /// Player that placed it.
        player: EntityId,
    },
    /// A block changed type.
    BlockChange {
        /// Dimension of the block.
        dimension: DimensionId,
        /// Block position.
        location: BlockPos,
        /// Type before the change.
        previous_type: String,
        /// Type after the change.
        current_type: String,
    },
    /// A structure (tree, feature) grew at a location.
    StructureGrow {
        /// Dimension of the structure.
        dimension: DimensionId,
        /// Origin of the structure.
        location: BlockPos,
        /// Structure id (`minecraft:pale_oak_tree`).
        structure_id: String,
    },
    /// An entity died.
    EntityDie {
        /// The entity that died.
        dead_entity: EntityRef,
        /// Entity responsible for the killing blow, if any.
        #[serde(default)]
        damaging_entity: Option<EntityRef>,
    },
    /// A player interacted with a block.
    BlockInteract {
        /// Dimension of the block.
        dimension: DimensionId,
        /// Block position.
        location: BlockPos,
        /// Block type.
        block_type: String,
        /// Interacting player.
        player: EntityId,
    },
}

/// Errors produced while decoding an event at the host boundary.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    /// Payload isn't a known event shape.
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A required identifier is blank.
    #[error("event '{kind}' has an empty '{field}'")]
    EmptyField {
        /// Event kind.
        kind: EventKind,
        /// Field name.
        field: &'static str,
    },
}

impl WorldEvent {
    /// Decode and validate an event from its JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, EventDecodeError> {
        let event: WorldEvent = serde_json::from_str(payload)?;
        event.validate()?;
        Ok(event)
    }

    /// Decode and validate an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, EventDecodeError> {
        let event: WorldEvent = serde_json::from_value(value)?;
        event.validate()?;
        Ok(event)
    }

    /// Discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WorldInitialize => EventKind::WorldInitialize,
            Self::Tick { .. } => EventKind::Tick,
            Self::BlockPlace { .. } => EventKind::BlockPlace,
            Self::BlockChange { .. } => EventKind::BlockChange,
            Self::StructureGrow { .. } => EventKind::StructureGrow,
            Self::EntityDie { .. } => EventKind::EntityDie,
            Self::BlockInteract { .. } => EventKind::BlockInteract,
        }
    }

    fn validate(&self) -> Result<(), EventDecodeError> {
        let kind = self.kind();
        let require = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                Err(EventDecodeError::EmptyField { kind, field })
            } else {
                Ok(())
            }
        };

        match self {
            Self::WorldInitialize | Self::Tick { .. } => Ok(()),
            Self::BlockPlace { block_type, .. } | Self::BlockInteract { block_type, .. } => {
                require("block_type", block_type)
            }
            Self::BlockChange {
                previous_type,
                current_type,
                ..
            } => {
                require("previous_type", previous_type)?;
                require("current_type", current_type)
            }
            Self::StructureGrow { structure_id, .. } => require("structure_id", structure_id),
            Self::EntityDie {
                dead_entity,
                damaging_entity,
            } => {
                require("dead_entity.type_id", &dead_entity.type_id)?;
                match damaging_entity {
                    Some(entity) => require("damaging_entity.type_id", &entity.type_id),
                    None => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelhooks_core::Vec3;

    #[test]
    fn decodes_structure_grow() {
        let event = WorldEvent::from_json(
            r#"{"event": "structure_grow", "dimension": "overworld",
                "location": {"x": 1, "y": 64, "z": -2},
                "structure_id": "minecraft:pale_oak_tree"}"#,
        )
        .expect("valid event");

        assert_eq!(event.kind(), EventKind::StructureGrow);
        assert_eq!(
            event,
            WorldEvent::StructureGrow {
                dimension: DimensionId::Overworld,
                location: BlockPos::new(1, 64, -2),
                structure_id: "minecraft:pale_oak_tree".into(),
            }
        );
    }

    #[test]
    fn decodes_entity_death_without_killer() {
        let event = WorldEvent::from_json(
            r#"{"event": "entity_die",
                "dead_entity": {"id": 7, "type_id": "minecraft:shulker",
                                "dimension": "the_end",
                                "location": {"x": 0.5, "y": 70.0, "z": 0.5}}}"#,
        )
        .expect("valid event");

        match event {
            WorldEvent::EntityDie {
                dead_entity,
                damaging_entity,
            } => {
                assert_eq!(dead_entity.id, EntityId(7));
                assert_eq!(dead_entity.location, Vec3::new(0.5, 70.0, 0.5));
                assert!(damaging_entity.is_none());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_events_and_missing_fields() {
        assert!(matches!(
            WorldEvent::from_json(r#"{"event": "explode"}"#),
            Err(EventDecodeError::Malformed(_))
        ));
        assert!(matches!(
            WorldEvent::from_json(r#"{"event": "tick"}"#),
            Err(EventDecodeError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = WorldEvent::from_json(r#"{"event": "tick", "current_tick": 3, "bogus": 1}"#)
            .unwrap_err();
        assert!(matches!(err, EventDecodeError::Malformed(_)));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn rejects_blank_identifiers() {
        let err = WorldEvent::from_json(
            r#"{"event": "block_place", "dimension": "overworld",
                "location": {"x": 0, "y": 0, "z": 0}, "block_type": "  ", "player": 1}"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            EventDecodeError::EmptyField {
                kind: EventKind::BlockPlace,
                field: "block_type"
            }
        ));
    }

    #[test]
    fn serializes_with_event_tag() {
        let value = serde_json::to_value(WorldEvent::Tick { current_tick: 40 }).unwrap();
        assert_eq!(value["event"], "tick");
        assert_eq!(value["current_tick"], 40);
        assert_eq!(
            WorldEvent::from_value(value).unwrap(),
            WorldEvent::Tick { current_tick: 40 }
        );
    }
}
