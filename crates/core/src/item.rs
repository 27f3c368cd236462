//! Item identifiers and stacks.
//!
//! Item ids are opaque namespaced strings (`minecraft:netherite_ingot`). Code
//! in this workspace only ever compares them for equality.

use crate::enchantment::{Enchantment, EnchantmentType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum stack size for most items.
pub const DEFAULT_STACK_SIZE: u32 = 64;

/// Items that never stack (armor and tools).
const UNSTACKABLE_ITEMS: &[&str] = &[
    "minecraft:netherite_helmet",
    "minecraft:netherite_chestplate",
    "minecraft:netherite_leggings",
    "minecraft:netherite_boots",
    "minecraft:netherite_axe",
    "minecraft:netherite_hoe",
    "minecraft:netherite_pickaxe",
    "minecraft:netherite_spear",
    "minecraft:netherite_shovel",
    "minecraft:netherite_sword",
];

/// Opaque item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Maximum stack size for this item.
    pub fn max_stack_size(&self) -> u32 {
        if UNSTACKABLE_ITEMS.contains(&self.0.as_str()) {
            1
        } else {
            DEFAULT_STACK_SIZE
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for ItemId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ItemId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn is_default_stack(value: &u32) -> bool {
    *value == DEFAULT_STACK_SIZE
}

/// Wire shape of [`ItemStack`]; a missing `max_stack` comes from the item table.
#[derive(Deserialize)]
struct ItemStackFields {
    item: ItemId,
    count: u32,
    #[serde(default)]
    max_stack: Option<u32>,
    #[serde(default)]
    aux_value: Option<u16>,
    #[serde(default)]
    enchantments: Vec<Enchantment>,
}

impl From<ItemStackFields> for ItemStack {
    fn from(fields: ItemStackFields) -> Self {
        let max_stack = fields
            .max_stack
            .unwrap_or_else(|| fields.item.max_stack_size());
        Self {
            item: fields.item,
            count: fields.count,
            max_stack,
            aux_value: fields.aux_value,
            enchantments: fields.enchantments,
        }
    }
}

/// An item stack occupying an inventory slot or dropped in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ItemStackFields")]
pub struct ItemStack {
    /// Item identifier.
    pub item: ItemId,
    /// Quantity in stack.
    pub count: u32,
    /// Maximum quantity a slot holding this item accepts.
    #[serde(skip_serializing_if = "is_default_stack")]
    pub max_stack: u32,
    /// Auxiliary data value (potion id for tipped arrows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_value: Option<u16>,
    /// Enchantments applied to this item.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enchantments: Vec<Enchantment>,
}

impl ItemStack {
    /// Create a new item stack; the stack limit comes from the builtin item table.
    pub fn new(item: impl Into<ItemId>, count: u32) -> Self {
        let item = item.into();
        let max_stack = item.max_stack_size();
        Self {
            item,
            count,
            max_stack,
            aux_value: None,
            enchantments: Vec::new(),
        }
    }

    /// Set the auxiliary data value.
    pub fn with_aux_value(mut self, aux_value: u16) -> Self {
        self.aux_value = Some(aux_value);
        self
    }

    /// Add an enchantment, upgrading the level if the type is already present.
    pub fn with_enchantment(mut self, enchantment: Enchantment) -> Self {
        match self
            .enchantments
            .iter_mut()
            .find(|e| e.enchantment_type == enchantment.enchantment_type)
        {
            Some(existing) => existing.level = existing.level.max(enchantment.level),
            None => self.enchantments.push(enchantment),
        }
        self
    }

    /// Whether this stack holds `item`.
    pub fn is(&self, item: &ItemId) -> bool {
        &self.item == item
    }

    /// Maximum stack size for this stack.
    pub fn max_stack_size(&self) -> u32 {
        self.max_stack
    }

    /// Check if this stack is at max capacity.
    pub fn is_full(&self) -> bool {
        self.count >= self.max_stack
    }

    /// A stack with a count of zero is an empty slot.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get the level of a specific enchantment, or 0 if not present.
    pub fn enchantment_level(&self, enchant_type: EnchantmentType) -> u8 {
        self.enchantments
            .iter()
            .find(|e| e.enchantment_type == enchant_type)
            .map(|e| e.level)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gear_does_not_stack() {
        let helmet = ItemStack::new("minecraft:netherite_helmet", 1);
        assert_eq!(helmet.max_stack_size(), 1);
        assert!(helmet.is_full());

        let ingots = ItemStack::new("minecraft:netherite_ingot", 3);
        assert_eq!(ingots.max_stack_size(), DEFAULT_STACK_SIZE);
        assert!(!ingots.is_full());
    }

    #[test]
    fn enchantment_levels_upgrade_in_place() {
        let sword = ItemStack::new("minecraft:netherite_sword", 1)
            .with_enchantment(Enchantment::new(EnchantmentType::Looting, 1))
            .with_enchantment(Enchantment::new(EnchantmentType::Looting, 3))
            .with_enchantment(Enchantment::new(EnchantmentType::Looting, 2));
        assert_eq!(sword.enchantments.len(), 1);
        assert_eq!(sword.enchantment_level(EnchantmentType::Looting), 3);
        assert_eq!(sword.enchantment_level(EnchantmentType::Sharpness), 0);
    }

    #[test]
    fn stack_json_omits_defaults() {
        let stack = ItemStack::new("minecraft:stick", 4);
        let json = serde_json::to_string(&stack).unwrap();
        assert_eq!(json, r#"{"item":"minecraft:stick","count":4}"#);

        let parsed: ItemStack =
            serde_json::from_str(r#"{"item":"minecraft:tipped_arrow","count":2,"aux_value":25}"#)
                .unwrap();
        assert_eq!(parsed.max_stack_size(), DEFAULT_STACK_SIZE);
        assert_eq!(parsed.aux_value, Some(25));
    }

    #[test]
    fn gear_without_max_stack_takes_the_table_limit() {
        let parsed: ItemStack =
            serde_json::from_str(r#"{"item":"minecraft:netherite_helmet","count":1}"#).unwrap();
        assert_eq!(parsed.max_stack_size(), 1);
        assert_eq!(parsed, ItemStack::new("minecraft:netherite_helmet", 1));

        let json = serde_json::to_string(&parsed).unwrap();
        let reparsed: ItemStack = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, parsed);
    }
}
