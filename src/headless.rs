use crate::config::AddonConfig;
use crate::scenario::{ScenarioAction, ScenarioPlayer};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};
use voxelhooks_core::{BlockPos, DimensionId, ItemStack, SimTick};
use voxelhooks_scripting::addons::{install_default_addons, NETHERITE_CRAFTER_BLOCK};
use voxelhooks_scripting::{DispatchOutcome, ScriptHost};
use voxelhooks_testkit::{EventRecord, JsonlSink};
use voxelhooks_world::shulker::SHULKER;
use voxelhooks_world::{
    DroppedStack, EntityId, FormRequest, RecipeTable, SimWorld, WorldAccess, WorldEvent,
    NETHERITE_CRAFTER_SLOTS,
};

pub struct HeadlessConfig {
    pub config: AddonConfig,
    pub scenario: Option<PathBuf>,
    pub recipes: Option<PathBuf>,
    pub max_ticks: u64,
    pub event_log: Option<PathBuf>,
}

/// Final world state printed after a headless run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub components_registered: bool,
    pub messages: Vec<String>,
    pub dropped_items: Vec<DroppedStack>,
    pub forms: Vec<ShownForm>,
    pub shulkers_in_end: usize,
    pub containers: Vec<ContainerSummary>,
    pub cancelled_interactions: usize,
    pub handler_failures: usize,
}

#[derive(Debug, Serialize)]
pub struct ShownForm {
    pub player: EntityId,
    pub form: FormRequest,
}

#[derive(Debug, Serialize)]
pub struct ContainerSummary {
    pub dimension: DimensionId,
    pub location: BlockPos,
    pub block_type: String,
    pub slots: BTreeMap<usize, ItemStack>,
}

pub fn run(cfg: HeadlessConfig) -> Result<RunSummary> {
    let mut settings = cfg.config.addon_settings();
    if let Some(path) = &cfg.recipes {
        settings.recipes = Some(RecipeTable::load_from_file(NETHERITE_CRAFTER_SLOTS, path)?);
    }
    let mut scenario = cfg
        .scenario
        .as_deref()
        .map(ScenarioPlayer::from_path)
        .transpose()?;

    let sink = cfg
        .event_log
        .as_ref()
        .map(JsonlSink::create)
        .transpose()
        .context("Failed to open event log")?;

    let mut world = SimWorld::new();
    let mut host = ScriptHost::new(cfg.config.host_settings());
    let components_registered = install_default_addons(&mut host, &mut world, &settings);

    let mut runner = Runner {
        world,
        host,
        sink,
        players: BTreeMap::new(),
        logged_messages: 0,
        cancelled: 0,
        failures: 0,
    };

    runner.dispatch(WorldEvent::WorldInitialize)?;
    for _ in 0..cfg.max_ticks {
        let tick = runner.host.tick();
        if let Some(scenario) = scenario.as_mut() {
            for action in scenario.drain_ready(tick) {
                runner
                    .apply(action)
                    .with_context(|| format!("Scenario step at tick {} failed", tick.0))?;
            }
        }
        let outcome = runner.host.step(&mut runner.world);
        runner.record(outcome);
        runner.flush_messages()?;
    }

    if let Some(scenario) = &scenario {
        if !scenario.is_finished() {
            info!(max_ticks = cfg.max_ticks, "Run ended before the scenario finished");
        }
    }

    let summary = runner.summary(components_registered);
    if let Some(sink) = runner.sink.as_mut() {
        sink.write(&EventRecord {
            tick: runner.host.tick(),
            kind: "summary",
            payload: serde_json::to_value(&summary)?,
        })?;
        sink.flush()?;
    }
    Ok(summary)
}

struct Runner {
    world: SimWorld,
    host: ScriptHost,
    sink: Option<JsonlSink>,
    players: BTreeMap<String, EntityId>,
    logged_messages: usize,
    cancelled: usize,
    failures: usize,
}

impl Runner {
    fn tick(&self) -> SimTick {
        self.host.tick()
    }

    fn log(&mut self, kind: &str, payload: serde_json::Value) -> Result<()> {
        let tick = self.tick();
        if let Some(sink) = self.sink.as_mut() {
            sink.write(&EventRecord {
                tick,
                kind,
                payload,
            })?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: WorldEvent) -> Result<()> {
        self.log(event.kind().as_str(), serde_json::to_value(&event)?)?;
        let outcome = self.host.dispatch(&mut self.world, &event);
        self.record(outcome);
        self.flush_messages()
    }

    fn record(&mut self, outcome: DispatchOutcome) {
        if outcome.cancelled {
            self.cancelled += 1;
        }
        self.failures += outcome.failures;
    }

    fn flush_messages(&mut self) -> Result<()> {
        let fresh: Vec<String> = self.world.messages()[self.logged_messages..].to_vec();
        self.logged_messages += fresh.len();
        for message in fresh {
            self.log("broadcast", serde_json::json!({ "message": message }))?;
        }
        Ok(())
    }

    fn player(&self, name: &str) -> Result<EntityId> {
        self.players
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown player '{name}'"))
    }

    fn apply(&mut self, action: ScenarioAction) -> Result<()> {
        debug!(?action, "Applying scenario step");
        match action {
            ScenarioAction::AddPlayer {
                name,
                dimension,
                location,
                held_item,
            } => {
                let id = self.world.add_player(&name, dimension, location);
                self.world
                    .set_held_item(id, held_item.as_ref().map(|spec| spec.to_stack()));
                self.players.insert(name, id);
            }
            ScenarioAction::MovePlayer {
                name,
                dimension,
                location,
            } => {
                let id = self.player(&name)?;
                self.world.move_entity(id, dimension, location);
            }
            ScenarioAction::PlaceBlock {
                dimension,
                location,
                block_type,
                player,
                container_slots,
            } => {
                let player = self.player(&player)?;
                let slots = container_slots.or(
                    (block_type == NETHERITE_CRAFTER_BLOCK).then_some(NETHERITE_CRAFTER_SLOTS),
                );
                match slots {
                    Some(slots) => {
                        self.world
                            .set_container_block(dimension, location, &block_type, slots)
                    }
                    None => {
                        self.world.set_block(dimension, location, &block_type);
                    }
                }
                self.dispatch(WorldEvent::BlockPlace {
                    dimension,
                    location,
                    block_type,
                    player,
                })?;
            }
            ScenarioAction::SetBlock {
                dimension,
                location,
                block_type,
            } => {
                let previous_type = self.world.set_block(dimension, location, &block_type);
                if previous_type != block_type {
                    self.dispatch(WorldEvent::BlockChange {
                        dimension,
                        location,
                        previous_type,
                        current_type: block_type,
                    })?;
                }
            }
            ScenarioAction::GrowStructure {
                dimension,
                location,
                structure_id,
            } => {
                self.dispatch(WorldEvent::StructureGrow {
                    dimension,
                    location,
                    structure_id,
                })?;
            }
            ScenarioAction::InsertItem {
                dimension,
                location,
                slot,
                item,
            } => {
                let container = self
                    .world
                    .container_entry(dimension, location)
                    .ok_or_else(|| anyhow!("no container at {location}"))?;
                let leftover = container.insert(slot, item.to_stack());
                if leftover > 0 {
                    debug!(%location, slot, leftover, "Insert did not fit");
                }
            }
            ScenarioAction::TakeItem {
                dimension,
                location,
                slot,
                count,
            } => {
                let container = self
                    .world
                    .container_entry(dimension, location)
                    .ok_or_else(|| anyhow!("no container at {location}"))?;
                container.take(slot, count);
            }
            ScenarioAction::Interact {
                dimension,
                location,
                player,
            } => {
                let player = self.player(&player)?;
                let block = self
                    .world
                    .block(dimension, location)?
                    .ok_or_else(|| anyhow!("no block at {location}"))?;
                self.dispatch(WorldEvent::BlockInteract {
                    dimension,
                    location,
                    block_type: block.type_id,
                    player,
                })?;
            }
            ScenarioAction::KillEntity {
                dimension,
                entity_type,
                location,
                killer,
            } => {
                let damaging_entity = match killer {
                    Some(name) => {
                        let id = self.player(&name)?;
                        self.world.entity(id).cloned()
                    }
                    None => None,
                };
                let id = self.world.insert_entity(dimension, &entity_type, location);
                let dead_entity = self
                    .world
                    .remove_entity(id)
                    .ok_or_else(|| anyhow!("entity {id} vanished before dying"))?;
                self.dispatch(WorldEvent::EntityDie {
                    dead_entity,
                    damaging_entity,
                })?;
            }
            ScenarioAction::UnloadChunk {
                dimension,
                location,
            } => self.world.unload_chunk_at(dimension, location),
            ScenarioAction::LoadChunk {
                dimension,
                location,
            } => self.world.load_chunk_at(dimension, location),
            ScenarioAction::RawEvent { payload } => {
                let event = WorldEvent::from_value(payload)?;
                self.dispatch(event)?;
            }
        }
        Ok(())
    }

    fn summary(&self, components_registered: bool) -> RunSummary {
        let containers = self
            .host
            .tracked_blocks()
            .filter_map(|(dimension, location, block_type)| {
                let container = self.world.container(dimension, location)?;
                Some(ContainerSummary {
                    dimension,
                    location,
                    block_type: block_type.to_string(),
                    slots: container
                        .occupied()
                        .map(|(slot, stack)| (slot, stack.clone()))
                        .collect(),
                })
            })
            .collect();

        RunSummary {
            ticks: self.tick().0,
            components_registered,
            messages: self.world.messages().to_vec(),
            dropped_items: self.world.dropped_items().to_vec(),
            forms: self
                .world
                .forms()
                .iter()
                .map(|(player, form)| ShownForm {
                    player: *player,
                    form: form.clone(),
                })
                .collect(),
            shulkers_in_end: self.world.entities_of_type(DimensionId::End, SHULKER).count(),
            containers,
            cancelled_interactions: self.cancelled,
            handler_failures: self.failures,
        }
    }
}
