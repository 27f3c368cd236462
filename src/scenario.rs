use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path};
use voxelhooks_core::{BlockPos, DimensionId, Enchantment, ItemStack, SimTick, Vec3};

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    steps: Vec<ScenarioStepDef>,
}

#[derive(Debug, Deserialize)]
struct ScenarioStepDef {
    tick: u64,
    #[serde(flatten)]
    action: ScenarioAction,
}

/// Item description used by scenario steps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemSpec {
    pub item: String,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub aux_value: Option<u16>,
    #[serde(default)]
    pub enchantments: Vec<Enchantment>,
}

fn one() -> u32 {
    1
}

impl ItemSpec {
    pub fn to_stack(&self) -> ItemStack {
        let mut stack = ItemStack::new(self.item.as_str(), self.count);
        if let Some(aux) = self.aux_value {
            stack = stack.with_aux_value(aux);
        }
        self.enchantments
            .iter()
            .fold(stack, |stack, enchantment| stack.with_enchantment(*enchantment))
    }
}

/// One world mutation or host event driven by a scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioAction {
    AddPlayer {
        name: String,
        dimension: DimensionId,
        location: Vec3,
        #[serde(default)]
        held_item: Option<ItemSpec>,
    },
    MovePlayer {
        name: String,
        dimension: DimensionId,
        location: Vec3,
    },
    /// Player places a block (dispatches `block_place`).
    PlaceBlock {
        dimension: DimensionId,
        location: BlockPos,
        block_type: String,
        player: String,
        #[serde(default)]
        container_slots: Option<usize>,
    },
    /// Block changes without a player (dispatches `block_change`).
    SetBlock {
        dimension: DimensionId,
        location: BlockPos,
        block_type: String,
    },
    GrowStructure {
        dimension: DimensionId,
        location: BlockPos,
        structure_id: String,
    },
    InsertItem {
        dimension: DimensionId,
        location: BlockPos,
        slot: usize,
        #[serde(flatten)]
        item: ItemSpec,
    },
    TakeItem {
        dimension: DimensionId,
        location: BlockPos,
        slot: usize,
        count: u32,
    },
    Interact {
        dimension: DimensionId,
        location: BlockPos,
        player: String,
    },
    KillEntity {
        dimension: DimensionId,
        entity_type: String,
        location: Vec3,
        #[serde(default)]
        killer: Option<String>,
    },
    UnloadChunk {
        dimension: DimensionId,
        location: BlockPos,
    },
    LoadChunk {
        dimension: DimensionId,
        location: BlockPos,
    },
    /// Raw host event payload, decoded like any other host event.
    RawEvent { payload: serde_json::Value },
}

/// Deterministic scenario runner.
///
/// Scenarios are a list of `{tick, action, ...}` steps sorted by tick.
#[derive(Debug)]
pub struct ScenarioPlayer {
    pending: VecDeque<(SimTick, ScenarioAction)>,
}

impl ScenarioPlayer {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let file: ScenarioFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            bail!("scenario contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        for step in file.steps {
            if let Some((prev, _)) = pending.back() {
                if SimTick(step.tick) < *prev {
                    bail!("scenario steps must be sorted by tick");
                }
            }
            pending.push_back((SimTick(step.tick), step.action));
        }
        Ok(Self { pending })
    }

    /// Drain and return every action scheduled for ticks `<= tick`.
    pub fn drain_ready(&mut self, tick: SimTick) -> Vec<ScenarioAction> {
        let mut ready = Vec::new();
        while self.pending.front().is_some_and(|(at, _)| *at <= tick) {
            if let Some((_, action)) = self.pending.pop_front() {
                ready.push(action);
            }
        }
        ready
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}
