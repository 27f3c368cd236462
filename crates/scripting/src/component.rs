//! Block custom components.

use crate::ScriptContext;
use anyhow::Result;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;
use voxelhooks_world::{BlockRef, EntityId};

/// Behaviour attached to a block type.
pub trait BlockComponent {
    /// A player interacted with the block. Return `true` to cancel the
    /// default interaction.
    fn on_interact(
        &mut self,
        _ctx: &mut ScriptContext<'_>,
        _block: &BlockRef,
        _player: EntityId,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Periodic component tick.
    fn on_tick(&mut self, _ctx: &mut ScriptContext<'_>, _block: &BlockRef) -> Result<()> {
        Ok(())
    }
}

/// Errors raised while registering components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A component id was registered twice.
    #[error("component '{0}' is already registered")]
    DuplicateComponent(String),
    /// A block type was bound to a component that doesn't exist.
    #[error("block '{block_type}' bound to unknown component '{component}'")]
    UnknownComponent {
        /// Block type being bound.
        block_type: String,
        /// Missing component id.
        component: String,
    },
    /// Component ids are namespaced (`pack:name`).
    #[error("component id '{0}' is missing a namespace")]
    InvalidId(String),
}

/// Component definitions and the block types that use them.
#[derive(Default)]
pub struct BlockComponentRegistry {
    components: BTreeMap<String, Box<dyn BlockComponent>>,
    bindings: BTreeMap<String, String>,
}

impl BlockComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under a namespaced id.
    pub fn register(
        &mut self,
        id: &str,
        component: Box<dyn BlockComponent>,
    ) -> Result<(), RegistryError> {
        match id.split_once(':') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {}
            _ => return Err(RegistryError::InvalidId(id.to_string())),
        }
        if self.components.contains_key(id) {
            return Err(RegistryError::DuplicateComponent(id.to_string()));
        }
        debug!(component = id, "Registered block component");
        self.components.insert(id.to_string(), component);
        Ok(())
    }

    /// Attach component `id` to every block of `block_type`.
    pub fn bind(&mut self, block_type: &str, id: &str) -> Result<(), RegistryError> {
        if !self.components.contains_key(id) {
            return Err(RegistryError::UnknownComponent {
                block_type: block_type.to_string(),
                component: id.to_string(),
            });
        }
        self.bindings.insert(block_type.to_string(), id.to_string());
        Ok(())
    }

    /// Whether `block_type` has a component.
    pub fn is_bound(&self, block_type: &str) -> bool {
        self.bindings.contains_key(block_type)
    }

    /// Component id bound to `block_type`.
    pub fn component_id(&self, block_type: &str) -> Option<&str> {
        self.bindings.get(block_type).map(String::as_str)
    }

    /// Component for `block_type`, if bound.
    pub fn component_for(&mut self, block_type: &str) -> Option<&mut (dyn BlockComponent + 'static)> {
        let id = self.bindings.get(block_type)?;
        self.components.get_mut(id).map(|component| component.as_mut())
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no component is registered.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
