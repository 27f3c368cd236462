//! Slot-based crafting for crafter blocks.
//!
//! A [`RecipeTable`] maps fixed input slots of a block container to a
//! dedicated output slot. Every component tick the table is scanned in order
//! and each recipe whose inputs are present crafts at most one unit.
//!
//! Tables are validated once when built; a table that references a slot the
//! container doesn't have, or lets two recipes share an output slot, never
//! reaches the scan loop.

use crate::container::ContainerAccessor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;
use voxelhooks_core::{ItemId, ItemStack};

/// Slot count of the netherite crafter container (17 inputs + 10 outputs).
pub const NETHERITE_CRAFTER_SLOTS: usize = 27;

/// Netherite ingot item id.
pub const NETHERITE_INGOT: &str = "minecraft:netherite_ingot";

/// Stick item id.
pub const STICK: &str = "minecraft:stick";

/// One required input: `count` of `item` sitting in `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeInput {
    /// Container slot the input is read from.
    pub slot: usize,
    /// Required item.
    pub item: ItemId,
    /// Amount consumed per craft.
    pub count: u32,
}

impl RecipeInput {
    /// Create a new input requirement.
    pub fn new(slot: usize, item: impl Into<ItemId>, count: u32) -> Self {
        Self {
            slot,
            item: item.into(),
            count,
        }
    }
}

/// The slot a recipe writes into and the item it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeOutput {
    /// Dedicated output slot.
    pub slot: usize,
    /// Produced item.
    pub item: ItemId,
}

impl RecipeOutput {
    /// Create a new output definition.
    pub fn new(slot: usize, item: impl Into<ItemId>) -> Self {
        Self {
            slot,
            item: item.into(),
        }
    }
}

/// A crafting rule bound to container slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeDefinition {
    /// Opaque recipe key (armor/tool letter code).
    pub id: String,
    /// Required inputs, checked in order.
    pub inputs: Vec<RecipeInput>,
    /// Output slot and produced item.
    pub output: RecipeOutput,
}

impl RecipeDefinition {
    /// Create a new recipe definition.
    pub fn new(id: impl Into<String>, inputs: Vec<RecipeInput>, output: RecipeOutput) -> Self {
        Self {
            id: id.into(),
            inputs,
            output,
        }
    }

    /// Run one craft attempt against `container`.
    ///
    /// Either every input slot is decremented and the output grows by one, or
    /// nothing is touched.
    pub fn evaluate(&self, container: &mut dyn ContainerAccessor) -> CraftResult {
        if let Err(reason) = self.check_inputs(container) {
            return CraftResult::Blocked(reason);
        }

        let existing = match self.check_output(container) {
            Ok(existing) => existing,
            Err(reason) => return CraftResult::Blocked(reason),
        };

        self.commit(container, existing);
        CraftResult::Crafted
    }

    fn check_inputs(&self, container: &dyn ContainerAccessor) -> Result<(), BlockedReason> {
        for input in &self.inputs {
            let satisfied = container
                .item(input.slot)
                .map(|stack| stack.is(&input.item) && stack.count >= input.count)
                .unwrap_or(false);
            if !satisfied {
                return Err(BlockedReason::MissingInput { slot: input.slot });
            }
        }
        Ok(())
    }

    fn check_output(
        &self,
        container: &dyn ContainerAccessor,
    ) -> Result<Option<ItemStack>, BlockedReason> {
        let slot = self.output.slot;
        let Some(existing) = container.item(slot) else {
            return Ok(None);
        };

        if !existing.is(&self.output.item) {
            return Err(BlockedReason::ForeignOutput {
                slot,
                found: existing.item,
            });
        }

        // Stack limit comes from the produced item, not whatever the slot reports.
        let produced = ItemStack::new(self.output.item.clone(), 1);
        if existing.count >= produced.max_stack_size() {
            return Err(BlockedReason::OutputFull { slot });
        }

        Ok(Some(existing))
    }

    fn commit(&self, container: &mut dyn ContainerAccessor, existing: Option<ItemStack>) {
        let output = match existing {
            Some(mut stack) => {
                stack.count += 1;
                stack
            }
            None => ItemStack::new(self.output.item.clone(), 1),
        };
        container.set_item(self.output.slot, Some(output));

        for input in &self.inputs {
            let remaining = container.item(input.slot).and_then(|mut stack| {
                stack.count = stack.count.saturating_sub(input.count);
                (stack.count > 0).then_some(stack)
            });
            container.set_item(input.slot, remaining);
        }
    }

    fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.inputs
            .iter()
            .map(|input| input.slot)
            .chain(std::iter::once(self.output.slot))
    }
}

/// Why a recipe didn't craft this pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockedReason {
    /// An input slot is empty, holds another item, or holds too few.
    MissingInput {
        /// First failing input slot.
        slot: usize,
    },
    /// The output slot holds an item this recipe doesn't produce.
    ForeignOutput {
        /// Output slot.
        slot: usize,
        /// Item found there.
        found: ItemId,
    },
    /// The output slot is at the produced item's stack limit.
    OutputFull {
        /// Output slot.
        slot: usize,
    },
}

/// Result of one recipe for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftResult {
    /// One unit was produced and inputs consumed.
    Crafted,
    /// Nothing changed.
    Blocked(BlockedReason),
}

/// Per-recipe outcome of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeOutcome {
    /// Recipe key.
    pub recipe_id: String,
    /// What happened.
    pub result: CraftResult,
}

/// Outcome of one [`RecipeTable::evaluate_container`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CraftReport {
    /// Outcomes in table order (empty when the pass was skipped).
    pub outcomes: Vec<RecipeOutcome>,
    /// The container was too small for the table and was left alone.
    pub skipped: bool,
}

impl CraftReport {
    /// Number of recipes that crafted a unit this pass.
    pub fn crafted_count(&self) -> usize {
        self.crafted().count()
    }

    /// Ids of the recipes that crafted a unit this pass.
    pub fn crafted(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result == CraftResult::Crafted)
            .map(|outcome| outcome.recipe_id.as_str())
    }
}

/// Configuration defects caught while building a [`RecipeTable`].
#[derive(Debug, Error)]
pub enum RecipeTableError {
    /// A slot index is beyond the container's declared size.
    #[error("recipe '{recipe}' references slot {slot} but the container has {size} slots")]
    SlotIndexOutOfRange {
        /// Offending recipe.
        recipe: String,
        /// Offending slot.
        slot: usize,
        /// Declared container size.
        size: usize,
    },
    /// A recipe with no inputs would craft forever.
    #[error("recipe '{recipe}' has no inputs")]
    NoInputs {
        /// Offending recipe.
        recipe: String,
    },
    /// An input requiring zero items.
    #[error("recipe '{recipe}' requires zero items in slot {slot}")]
    ZeroCount {
        /// Offending recipe.
        recipe: String,
        /// Offending slot.
        slot: usize,
    },
    /// A slot used twice inside one recipe.
    #[error("recipe '{recipe}' uses slot {slot} more than once")]
    DuplicateSlot {
        /// Offending recipe.
        recipe: String,
        /// Offending slot.
        slot: usize,
    },
    /// Two recipes writing into the same slot.
    #[error("recipes '{first}' and '{second}' share output slot {slot}")]
    SharedOutputSlot {
        /// Recipe that owns the slot.
        first: String,
        /// Recipe that tried to reuse it.
        second: String,
        /// Shared slot.
        slot: usize,
    },
    /// An input read from another recipe's output slot.
    #[error("recipe '{recipe}' reads slot {slot}, which is the output slot of '{owner}'")]
    InputOnOutputSlot {
        /// Offending recipe.
        recipe: String,
        /// Recipe owning the output slot.
        owner: String,
        /// Contested slot.
        slot: usize,
    },
    /// Two recipes with the same key.
    #[error("duplicate recipe id '{0}'")]
    DuplicateId(String),
    /// Malformed recipe JSON.
    #[error("failed to parse recipe table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Validated, immutable recipe table for one container layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeTable {
    recipes: Vec<RecipeDefinition>,
    container_size: usize,
}

static NETHERITE_CRAFTER: OnceLock<RecipeTable> = OnceLock::new();

impl RecipeTable {
    /// Validate `recipes` against a container of `container_size` slots.
    pub fn new(
        container_size: usize,
        recipes: Vec<RecipeDefinition>,
    ) -> Result<Self, RecipeTableError> {
        let mut ids = BTreeSet::new();
        let mut output_owners: BTreeMap<usize, &str> = BTreeMap::new();

        for recipe in &recipes {
            if !ids.insert(recipe.id.as_str()) {
                return Err(RecipeTableError::DuplicateId(recipe.id.clone()));
            }
            if recipe.inputs.is_empty() {
                return Err(RecipeTableError::NoInputs {
                    recipe: recipe.id.clone(),
                });
            }

            let mut used = BTreeSet::new();
            for slot in recipe.slots() {
                if slot >= container_size {
                    return Err(RecipeTableError::SlotIndexOutOfRange {
                        recipe: recipe.id.clone(),
                        slot,
                        size: container_size,
                    });
                }
                if !used.insert(slot) {
                    return Err(RecipeTableError::DuplicateSlot {
                        recipe: recipe.id.clone(),
                        slot,
                    });
                }
            }

            if let Some(input) = recipe.inputs.iter().find(|input| input.count == 0) {
                return Err(RecipeTableError::ZeroCount {
                    recipe: recipe.id.clone(),
                    slot: input.slot,
                });
            }

            if let Some(owner) = output_owners.insert(recipe.output.slot, recipe.id.as_str()) {
                return Err(RecipeTableError::SharedOutputSlot {
                    first: owner.to_string(),
                    second: recipe.id.clone(),
                    slot: recipe.output.slot,
                });
            }
        }

        for recipe in &recipes {
            for input in &recipe.inputs {
                if let Some(owner) = output_owners.get(&input.slot) {
                    return Err(RecipeTableError::InputOnOutputSlot {
                        recipe: recipe.id.clone(),
                        owner: owner.to_string(),
                        slot: input.slot,
                    });
                }
            }
        }

        Ok(Self {
            recipes,
            container_size,
        })
    }

    /// Parse and validate a JSON array of recipe definitions.
    pub fn from_json_str(container_size: usize, json: &str) -> Result<Self, RecipeTableError> {
        let recipes: Vec<RecipeDefinition> = serde_json::from_str(json)?;
        Self::new(container_size, recipes)
    }

    /// Load and validate a recipe table from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(container_size: usize, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recipe file {}", path.display()))?;
        Self::from_json_str(container_size, &content)
            .with_context(|| format!("Invalid recipe table {}", path.display()))
    }

    /// The builtin 27-slot netherite crafter table.
    ///
    /// Inputs occupy slots 0-16, outputs slots 17-26, one row per recipe.
    pub fn netherite_crafter() -> &'static RecipeTable {
        NETHERITE_CRAFTER.get_or_init(|| {
            Self::new(NETHERITE_CRAFTER_SLOTS, netherite_crafter_recipes())
                .unwrap_or_else(|err| panic!("builtin netherite crafter table is invalid: {err}"))
        })
    }

    /// Recipes in scan order.
    pub fn recipes(&self) -> &[RecipeDefinition] {
        &self.recipes
    }

    /// Look up a recipe by key.
    pub fn get(&self, id: &str) -> Option<&RecipeDefinition> {
        self.recipes.iter().find(|recipe| recipe.id == id)
    }

    /// Container size the table was validated against.
    pub fn container_size(&self) -> usize {
        self.container_size
    }

    /// Number of recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the table has no recipes.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Scan every recipe once against `container`, crafting at most one unit each.
    ///
    /// A container smaller than the table's layout is left untouched.
    pub fn evaluate_container(&self, container: &mut dyn ContainerAccessor) -> CraftReport {
        if container.size() < self.container_size {
            debug!(
                size = container.size(),
                expected = self.container_size,
                "Container too small for recipe table; skipping pass"
            );
            return CraftReport {
                outcomes: Vec::new(),
                skipped: true,
            };
        }

        let outcomes = self
            .recipes
            .iter()
            .map(|recipe| RecipeOutcome {
                recipe_id: recipe.id.clone(),
                result: recipe.evaluate(container),
            })
            .collect();

        CraftReport {
            outcomes,
            skipped: false,
        }
    }
}

fn netherite_crafter_recipes() -> Vec<RecipeDefinition> {
    let ingot = |slot| RecipeInput::new(slot, NETHERITE_INGOT, 1);
    let stick = |slot| RecipeInput::new(slot, STICK, 1);

    let armor = [
        ("H", vec![ingot(0)], 17, "minecraft:netherite_helmet"),
        ("C", vec![ingot(1), ingot(2)], 18, "minecraft:netherite_chestplate"),
        ("L", vec![ingot(3)], 19, "minecraft:netherite_leggings"),
        ("B", vec![ingot(4)], 20, "minecraft:netherite_boots"),
    ];
    let tools = [
        ("A", 5, 21, "minecraft:netherite_axe"),
        ("O", 7, 22, "minecraft:netherite_hoe"),
        ("P", 9, 23, "minecraft:netherite_pickaxe"),
        ("R", 11, 24, "minecraft:netherite_spear"),
        ("S", 13, 25, "minecraft:netherite_shovel"),
        ("W", 15, 26, "minecraft:netherite_sword"),
    ];

    let armor = armor.into_iter().map(|(id, inputs, slot, item)| {
        RecipeDefinition::new(id, inputs, RecipeOutput::new(slot, item))
    });
    let tools = tools.into_iter().map(|(id, first, slot, item)| {
        RecipeDefinition::new(
            id,
            vec![ingot(first), stick(first + 1)],
            RecipeOutput::new(slot, item),
        )
    });
    armor.chain(tools).collect()
}
