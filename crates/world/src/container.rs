//! Block container storage.
//!
//! Provides the [`ContainerAccessor`] seam the crafting engine works against,
//! plus a fixed-size in-memory [`BlockContainer`] with stack merging and
//! slot validation.

use serde::{Deserialize, Serialize};
use voxelhooks_core::{ItemId, ItemStack};

/// Number of slots in a single chest-sized container (3 rows x 9 columns).
pub const CHEST_SLOT_COUNT: usize = 27;

/// Read/write access to the slots of a host-owned container.
///
/// Slots are addressed by index. Reads hand out copies so hosts that cannot
/// lend references (remote or script-bridged containers) can implement this.
pub trait ContainerAccessor {
    /// Declared number of slots.
    fn size(&self) -> usize;

    /// Copy of the stack in `slot`, `None` when empty or out of range.
    fn item(&self, slot: usize) -> Option<ItemStack>;

    /// Replace the contents of `slot`. Returns `false` when `slot` is out of range.
    ///
    /// A stack with a count of zero clears the slot.
    fn set_item(&mut self, slot: usize, stack: Option<ItemStack>) -> bool;
}

/// Fixed-size container owned by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockContainer {
    slots: Vec<Option<ItemStack>>,
}

impl BlockContainer {
    /// Create an empty container with `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Create an empty chest-sized container.
    pub fn chest() -> Self {
        Self::new(CHEST_SLOT_COUNT)
    }

    /// Borrow the stack in `slot`.
    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Insert items into `slot`, merging with a matching stack.
    ///
    /// Returns the number of items that didn't fit (all of them when the slot
    /// holds a different item or is out of range).
    pub fn insert(&mut self, slot: usize, stack: ItemStack) -> u32 {
        let Some(entry) = self.slots.get_mut(slot) else {
            return stack.count;
        };

        match entry {
            None => {
                let add = stack.count.min(stack.max_stack_size());
                let leftover = stack.count - add;
                if add > 0 {
                    *entry = Some(ItemStack { count: add, ..stack });
                }
                leftover
            }
            Some(existing) if existing.item == stack.item => {
                let space = existing.max_stack_size().saturating_sub(existing.count);
                let add = stack.count.min(space);
                existing.count += add;
                stack.count - add
            }
            Some(_) => stack.count,
        }
    }

    /// Take up to `amount` items out of `slot`.
    pub fn take(&mut self, slot: usize, amount: u32) -> Option<ItemStack> {
        let entry = self.slots.get_mut(slot)?;
        let existing = entry.as_mut()?;
        let taken = amount.min(existing.count);
        if taken == 0 {
            return None;
        }

        existing.count -= taken;
        let out = ItemStack {
            count: taken,
            ..existing.clone()
        };
        if existing.count == 0 {
            *entry = None;
        }
        Some(out)
    }

    /// Count items of `item` across all slots.
    pub fn count_item(&self, item: &ItemId) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|stack| &stack.item == item)
            .map(|stack| stack.count)
            .sum()
    }

    /// Iterate over occupied slots as `(index, stack)`.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|stack| (index, stack)))
    }

    /// Check if every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl Default for BlockContainer {
    fn default() -> Self {
        Self::chest()
    }
}

impl ContainerAccessor for BlockContainer {
    fn size(&self) -> usize {
        self.slots.len()
    }

    fn item(&self, slot: usize) -> Option<ItemStack> {
        self.get(slot).cloned()
    }

    fn set_item(&mut self, slot: usize, stack: Option<ItemStack>) -> bool {
        let Some(entry) = self.slots.get_mut(slot) else {
            return false;
        };
        *entry = stack.filter(|stack| !stack.is_empty());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INGOT: &str = "minecraft:netherite_ingot";

    #[test]
    fn insert_merges_and_reports_overflow() {
        let mut container = BlockContainer::chest();
        assert_eq!(container.insert(0, ItemStack::new(INGOT, 40)), 0);
        assert_eq!(container.insert(0, ItemStack::new(INGOT, 40)), 16);
        assert_eq!(container.get(0).map(|s| s.count), Some(64));
    }

    #[test]
    fn insert_refuses_foreign_items_and_bad_slots() {
        let mut container = BlockContainer::chest();
        container.insert(3, ItemStack::new(INGOT, 1));
        assert_eq!(container.insert(3, ItemStack::new("minecraft:stick", 5)), 5);
        assert_eq!(
            container.insert(CHEST_SLOT_COUNT, ItemStack::new(INGOT, 2)),
            2
        );
    }

    #[test]
    fn take_empties_slot_at_zero() {
        let mut container = BlockContainer::chest();
        container.insert(1, ItemStack::new(INGOT, 3));

        let taken = container.take(1, 2).expect("items present");
        assert_eq!(taken.count, 2);
        assert_eq!(container.get(1).map(|s| s.count), Some(1));

        let taken = container.take(1, 10).expect("remaining item");
        assert_eq!(taken.count, 1);
        assert!(container.get(1).is_none());
        assert!(container.take(1, 1).is_none());
    }

    #[test]
    fn set_item_normalizes_zero_counts() {
        let mut container = BlockContainer::new(2);
        assert!(container.set_item(0, Some(ItemStack::new(INGOT, 0))));
        assert!(container.item(0).is_none());
        assert!(!container.set_item(2, Some(ItemStack::new(INGOT, 1))));
        assert!(container.is_empty());
    }

    #[test]
    fn count_item_sums_across_slots() {
        let mut container = BlockContainer::chest();
        container.insert(0, ItemStack::new(INGOT, 2));
        container.insert(5, ItemStack::new(INGOT, 3));
        container.insert(6, ItemStack::new("minecraft:stick", 9));
        assert_eq!(container.count_item(&ItemId::new(INGOT)), 5);
        assert_eq!(container.occupied().count(), 3);
    }
}
