//! Bundled add-on scripts.
//!
//! [`install_default_addons`] wires up the netherite crafter block, the pale
//! oak growth reward, shulker loot and shulker respawning.

use crate::{BlockComponent, Script, ScriptContext, ScriptHost};
use anyhow::Result;
use tracing::debug;
use voxelhooks_core::BlockPos;
use voxelhooks_world::{
    growth, shulker, BlockRef, EntityId, EventKind, FormRequest, FormScriptData,
    GrowthDropSettings, RecipeTable, ShulkerSettings, WorldAccess, WorldEvent,
};

/// Id the crafter component is registered under.
pub const CRAFTER_COMPONENT_ID: &str = "convertedjava:netherite_crafter_script:crafter_component";

/// Block type carrying the crafter component.
pub const NETHERITE_CRAFTER_BLOCK: &str = "convertedjava:netherite_crafter";

/// Custom UI definition opened by the crafter.
pub const CRAFTER_FORM_ID: &str = "ui_netherite_crafter";

/// Title of the crafter form.
pub const CRAFTER_FORM_TITLE: &str = "Netherite Crafter";

/// Broadcast once the world finished loading.
pub const READY_MESSAGE: &str = "Scripting API fully initialized";

/// Tunables for the bundled add-ons.
#[derive(Debug, Clone, Default)]
pub struct AddonSettings {
    /// Pale oak growth reward.
    pub growth: GrowthDropSettings,
    /// Shulker respawn loop.
    pub shulker: ShulkerSettings,
    /// Crafter recipe table; the builtin netherite table when unset.
    pub recipes: Option<RecipeTable>,
}

/// Subscribe the bundled scripts and register the crafter component.
///
/// Returns whether component registration succeeded.
pub fn install_default_addons(
    host: &mut ScriptHost,
    world: &mut dyn WorldAccess,
    settings: &AddonSettings,
) -> bool {
    host.subscribe(Box::new(AnnounceReady));
    host.subscribe(Box::new(PaleOakGrowth::new(settings.growth.clone())));
    host.subscribe(Box::new(ShulkerLoot));
    host.subscribe(Box::new(ShulkerRespawn::new(settings.shulker.clone())));

    let table = settings
        .recipes
        .clone()
        .unwrap_or_else(|| RecipeTable::netherite_crafter().clone());
    host.before_initialize(world, move |registry| {
        registry.register(CRAFTER_COMPONENT_ID, Box::new(NetheriteCrafter::new(table)))?;
        registry.bind(NETHERITE_CRAFTER_BLOCK, CRAFTER_COMPONENT_ID)
    })
}

/// Crafting block: opens its form on interaction and runs recipes on tick.
pub struct NetheriteCrafter {
    table: RecipeTable,
}

impl NetheriteCrafter {
    /// Crafter evaluating `table`.
    pub fn new(table: RecipeTable) -> Self {
        Self { table }
    }
}

impl BlockComponent for NetheriteCrafter {
    fn on_interact(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        block: &BlockRef,
        player: EntityId,
    ) -> Result<bool> {
        ctx.world.show_form(
            player,
            FormRequest {
                title: CRAFTER_FORM_TITLE.to_string(),
                custom_form_id: CRAFTER_FORM_ID.to_string(),
                script_data: FormScriptData {
                    block_x: block.location.x,
                    block_y: block.location.y,
                    block_z: block.location.z,
                    player_id: player,
                },
            },
        );
        Ok(true)
    }

    fn on_tick(&mut self, ctx: &mut ScriptContext<'_>, block: &BlockRef) -> Result<()> {
        let Some(container) = ctx.world.container_mut(block.dimension, block.location) else {
            return Ok(());
        };
        let report = self.table.evaluate_container(container);
        if report.crafted_count() > 0 {
            debug!(
                location = %block.location,
                crafted = ?report.crafted().collect::<Vec<_>>(),
                "Crafter produced items"
            );
        }
        Ok(())
    }
}

/// Broadcasts [`READY_MESSAGE`] when the world initializes.
pub struct AnnounceReady;

impl Script for AnnounceReady {
    fn name(&self) -> &str {
        "announce_ready"
    }

    fn subscriptions(&self) -> &[EventKind] {
        &[EventKind::WorldInitialize]
    }

    fn on_event(&mut self, _event: &WorldEvent, ctx: &mut ScriptContext<'_>) -> Result<()> {
        ctx.world.broadcast(READY_MESSAGE);
        Ok(())
    }
}

/// Creaking heart reward for growing pale oaks.
pub struct PaleOakGrowth {
    settings: GrowthDropSettings,
}

impl PaleOakGrowth {
    /// Script using `settings`.
    pub fn new(settings: GrowthDropSettings) -> Self {
        Self { settings }
    }

    fn schedule_check(&self, ctx: &mut ScriptContext<'_>, location: BlockPos) {
        let settings = self.settings.clone();
        ctx.run_next_tick("pale_oak_sapling_check", move |world, rng| {
            growth::check_sapling_growth(world, rng, &settings, location)?;
            Ok(())
        });
    }
}

impl Script for PaleOakGrowth {
    fn name(&self) -> &str {
        "pale_oak_growth"
    }

    fn subscriptions(&self) -> &[EventKind] {
        &[
            EventKind::StructureGrow,
            EventKind::BlockPlace,
            EventKind::BlockChange,
        ]
    }

    fn on_event(&mut self, event: &WorldEvent, ctx: &mut ScriptContext<'_>) -> Result<()> {
        match event {
            WorldEvent::StructureGrow {
                dimension,
                location,
                structure_id,
            } => {
                growth::on_structure_grow(
                    ctx.world,
                    ctx.rng,
                    &self.settings,
                    *dimension,
                    *location,
                    structure_id,
                )?;
            }
            WorldEvent::BlockPlace {
                location,
                block_type,
                ..
            } if growth::should_check_after_place(block_type) => {
                self.schedule_check(ctx, *location);
            }
            WorldEvent::BlockChange {
                location,
                previous_type,
                current_type,
                ..
            } if growth::should_check_after_change(previous_type, current_type) => {
                self.schedule_check(ctx, *location);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Levitation arrows from shulkers killed by players.
pub struct ShulkerLoot;

impl Script for ShulkerLoot {
    fn name(&self) -> &str {
        "shulker_loot"
    }

    fn subscriptions(&self) -> &[EventKind] {
        &[EventKind::EntityDie]
    }

    fn on_event(&mut self, event: &WorldEvent, ctx: &mut ScriptContext<'_>) -> Result<()> {
        if let WorldEvent::EntityDie {
            dead_entity,
            damaging_entity,
        } = event
        {
            let dropped =
                shulker::on_entity_die(ctx.world, ctx.rng, dead_entity, damaging_entity.as_ref())?;
            if dropped > 0 {
                debug!(entity = %dead_entity.id, dropped, "Shulker dropped levitation arrows");
            }
        }
        Ok(())
    }
}

/// Periodic shulker respawning around players in the End.
pub struct ShulkerRespawn {
    settings: ShulkerSettings,
}

impl ShulkerRespawn {
    /// Script using `settings`.
    pub fn new(settings: ShulkerSettings) -> Self {
        Self { settings }
    }
}

impl Script for ShulkerRespawn {
    fn name(&self) -> &str {
        "shulker_respawn"
    }

    fn subscriptions(&self) -> &[EventKind] {
        &[EventKind::Tick]
    }

    fn on_event(&mut self, event: &WorldEvent, ctx: &mut ScriptContext<'_>) -> Result<()> {
        if let WorldEvent::Tick { current_tick } = event {
            shulker::run_respawn_checks(ctx.world, ctx.rng, &self.settings, *current_tick);
        }
        Ok(())
    }
}
