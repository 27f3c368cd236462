//! Enchantments read off held items.

use serde::{Deserialize, Serialize};

/// Enchantments gameplay scripts read off held items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnchantmentType {
    /// Raises melee damage.
    Sharpness,
    /// Raises mob drop counts; shulker arrows scale with it.
    Looting,
}

impl EnchantmentType {
    /// Highest level an item can carry.
    pub fn max_level(self) -> u8 {
        match self {
            Self::Sharpness => 5,
            Self::Looting => 3,
        }
    }
}

/// One enchantment on an item stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enchantment {
    /// Which enchantment.
    #[serde(rename = "type")]
    pub enchantment_type: EnchantmentType,
    /// Level, `1..=max_level`.
    pub level: u8,
}

impl Enchantment {
    /// Enchantment at `level`, capped at the type's maximum.
    pub fn new(enchantment_type: EnchantmentType, level: u8) -> Self {
        Self {
            enchantment_type,
            level: level.min(enchantment_type.max_level()),
        }
    }
}
