//! Script host: event routing, component ticks and deferred jobs.

use crate::component::{BlockComponentRegistry, RegistryError};
use crate::{QueuedJob, Script, ScriptContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::mem;
use tracing::{debug, info, trace, warn};
use voxelhooks_core::{scoped_rng, BlockPos, DimensionId, RandomSource, SimTick};
use voxelhooks_world::{BlockRef, WorldAccess, WorldEvent};

/// Broadcast after component registration succeeded.
pub const STARTUP_OK_MESSAGE: &str = "Scripting API first step initialized.";

/// Broadcast after component registration failed.
pub const STARTUP_FAILED_MESSAGE: &str = "Scripting API first step unsuccessful. Continuing...";

/// Host tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Ticks between block component ticks.
    pub component_tick_interval: u64,
    /// Seed of the host random source.
    pub seed: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            component_tick_interval: 1,
            seed: 0,
        }
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// A component asked to cancel the default interaction.
    pub cancelled: bool,
    /// Scripts and components invoked.
    pub handlers: usize,
    /// Handlers that returned an error.
    pub failures: usize,
}

/// Single-threaded host driving scripts and block components.
pub struct ScriptHost {
    settings: HostSettings,
    tick: SimTick,
    rng: Box<dyn RandomSource>,
    scripts: Vec<Box<dyn Script>>,
    components: BlockComponentRegistry,
    tracked: BTreeMap<(DimensionId, BlockPos), String>,
    deferred: Vec<QueuedJob>,
}

impl ScriptHost {
    /// Create a host seeded from `settings.seed`.
    pub fn new(settings: HostSettings) -> Self {
        let rng = scoped_rng(settings.seed, 0, SimTick::ZERO);
        Self::with_random_source(settings, Box::new(rng))
    }

    /// Create a host drawing rolls from `rng`.
    pub fn with_random_source(settings: HostSettings, rng: Box<dyn RandomSource>) -> Self {
        Self {
            settings,
            tick: SimTick::ZERO,
            rng,
            scripts: Vec::new(),
            components: BlockComponentRegistry::new(),
            tracked: BTreeMap::new(),
            deferred: Vec::new(),
        }
    }

    /// Current tick.
    pub fn tick(&self) -> SimTick {
        self.tick
    }

    /// Host settings.
    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// Component registry.
    pub fn components(&self) -> &BlockComponentRegistry {
        &self.components
    }

    /// Run component registration.
    ///
    /// The outcome is announced to the world; a failure is logged and the host
    /// keeps running with whatever was registered before the error.
    pub fn before_initialize<F>(&mut self, world: &mut dyn WorldAccess, installer: F) -> bool
    where
        F: FnOnce(&mut BlockComponentRegistry) -> Result<(), RegistryError>,
    {
        match installer(&mut self.components) {
            Ok(()) => {
                info!(components = self.components.len(), "Block components registered");
                world.broadcast(STARTUP_OK_MESSAGE);
                true
            }
            Err(err) => {
                warn!(%err, "Block component registration failed");
                world.broadcast(STARTUP_FAILED_MESSAGE);
                false
            }
        }
    }

    /// Add a script; it receives events after every script added before it.
    pub fn subscribe(&mut self, script: Box<dyn Script>) {
        debug!(script = script.name(), kinds = ?script.subscriptions(), "Script subscribed");
        self.scripts.push(script);
    }

    /// Number of subscribed scripts.
    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// Start ticking the component of the block at `pos`.
    ///
    /// Returns `false` when `block_type` has no component.
    pub fn track_block(&mut self, dimension: DimensionId, pos: BlockPos, block_type: &str) -> bool {
        if !self.components.is_bound(block_type) {
            return false;
        }
        self.tracked.insert((dimension, pos), block_type.to_string());
        true
    }

    /// Blocks whose components receive ticks.
    pub fn tracked_blocks(&self) -> impl Iterator<Item = (DimensionId, BlockPos, &str)> {
        self.tracked
            .iter()
            .map(|((dimension, pos), block_type)| (*dimension, *pos, block_type.as_str()))
    }

    /// Jobs waiting for the next step.
    pub fn pending_jobs(&self) -> usize {
        self.deferred.len()
    }

    /// Deliver `event` to components and subscribed scripts.
    pub fn dispatch(&mut self, world: &mut dyn WorldAccess, event: &WorldEvent) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        self.update_tracking(event);

        if let WorldEvent::BlockInteract {
            dimension,
            location,
            block_type,
            player,
        } = event
        {
            if let Some(component) = self.components.component_for(block_type) {
                let block = BlockRef {
                    dimension: *dimension,
                    location: *location,
                    type_id: block_type.clone(),
                };
                let mut ctx =
                    ScriptContext::new(self.tick, world, self.rng.as_mut(), &mut self.deferred);
                outcome.handlers += 1;
                match component.on_interact(&mut ctx, &block, *player) {
                    Ok(cancel) => outcome.cancelled = cancel,
                    Err(err) => {
                        outcome.failures += 1;
                        warn!(%block_type, %location, error = %err, "Component interaction failed");
                    }
                }
            }
        }

        let kind = event.kind();
        for script in self
            .scripts
            .iter_mut()
            .filter(|script| script.subscriptions().contains(&kind))
        {
            let mut ctx =
                ScriptContext::new(self.tick, world, self.rng.as_mut(), &mut self.deferred);
            outcome.handlers += 1;
            if let Err(err) = script.on_event(event, &mut ctx) {
                outcome.failures += 1;
                warn!(script = script.name(), event = %kind, error = %err, "Script handler failed");
            }
        }

        outcome
    }

    /// Advance one tick: deferred jobs, the `Tick` event, then component ticks.
    pub fn step(&mut self, world: &mut dyn WorldAccess) -> DispatchOutcome {
        self.tick = self.tick.advance(1);

        for QueuedJob { label, job } in mem::take(&mut self.deferred) {
            if let Err(err) = job(&mut *world, self.rng.as_mut()) {
                warn!(job = %label, tick = self.tick.0, error = %err, "Deferred job failed");
            }
        }

        let mut outcome = self.dispatch(
            world,
            &WorldEvent::Tick {
                current_tick: self.tick.0,
            },
        );

        if self.tick.is_every(self.settings.component_tick_interval) {
            let (handlers, failures) = self.tick_components(world);
            outcome.handlers += handlers;
            outcome.failures += failures;
        }
        outcome
    }

    fn tick_components(&mut self, world: &mut dyn WorldAccess) -> (usize, usize) {
        let mut handlers = 0;
        let mut failures = 0;
        let mut stale = Vec::new();

        for (&(dimension, location), block_type) in &self.tracked {
            let block = match world.block(dimension, location) {
                Ok(Some(block)) if block.is(block_type) => block,
                Ok(_) => {
                    stale.push((dimension, location));
                    continue;
                }
                Err(err) => {
                    trace!(%location, %err, "Skipping component tick");
                    continue;
                }
            };
            let Some(component) = self.components.component_for(block_type) else {
                continue;
            };

            let mut ctx = ScriptContext::new(self.tick, world, self.rng.as_mut(), &mut self.deferred);
            handlers += 1;
            if let Err(err) = component.on_tick(&mut ctx, &block) {
                failures += 1;
                warn!(%block_type, %location, error = %err, "Component tick failed");
            }
        }

        for key in stale {
            debug!(location = %key.1, "Block no longer carries its component; untracked");
            self.tracked.remove(&key);
        }
        (handlers, failures)
    }

    fn update_tracking(&mut self, event: &WorldEvent) {
        match event {
            WorldEvent::BlockPlace {
                dimension,
                location,
                block_type,
                ..
            } => {
                self.track_block(*dimension, *location, block_type);
            }
            WorldEvent::BlockChange {
                dimension,
                location,
                current_type,
                ..
            } => {
                if !self.track_block(*dimension, *location, current_type) {
                    self.tracked.remove(&(*dimension, *location));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockComponent;
    use anyhow::{bail, Result};
    use std::cell::RefCell;
    use std::rc::Rc;
    use voxelhooks_world::{EntityId, EventKind, SimWorld};

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        log: Log,
        kinds: Vec<EventKind>,
        fail: bool,
    }

    impl Script for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn subscriptions(&self) -> &[EventKind] {
            &self.kinds
        }

        fn on_event(&mut self, event: &WorldEvent, ctx: &mut ScriptContext<'_>) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("{}@{}", event.kind(), ctx.tick.0));
            if self.fail {
                bail!("boom");
            }
            Ok(())
        }
    }

    struct Counter {
        log: Log,
    }

    impl BlockComponent for Counter {
        fn on_interact(
            &mut self,
            _ctx: &mut ScriptContext<'_>,
            block: &BlockRef,
            player: EntityId,
        ) -> Result<bool> {
            self.log
                .borrow_mut()
                .push(format!("interact {} by {player}", block.location));
            Ok(true)
        }

        fn on_tick(&mut self, ctx: &mut ScriptContext<'_>, block: &BlockRef) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("tick {} @{}", block.location, ctx.tick.0));
            Ok(())
        }
    }

    fn host_with_counter(log: &Log, interval: u64) -> ScriptHost {
        let mut host = ScriptHost::new(HostSettings {
            component_tick_interval: interval,
            seed: 1,
        });
        let mut world = SimWorld::new();
        let component_log = log.clone();
        assert!(host.before_initialize(&mut world, move |registry| {
            registry.register("test:counter", Box::new(Counter { log: component_log }))?;
            registry.bind("test:counter_block", "test:counter")
        }));
        host
    }

    #[test]
    fn startup_result_is_broadcast() {
        let mut world = SimWorld::new();
        let mut host = ScriptHost::new(HostSettings::default());
        assert!(host.before_initialize(&mut world, |_| Ok(())));
        assert!(!host.before_initialize(&mut world, |registry| {
            registry.bind("test:block", "test:missing")
        }));
        assert_eq!(
            world.messages(),
            &[STARTUP_OK_MESSAGE.to_string(), STARTUP_FAILED_MESSAGE.to_string()]
        );
    }

    #[test]
    fn routes_only_subscribed_kinds_and_swallows_errors() {
        let log: Log = Rc::default();
        let mut world = SimWorld::new();
        let mut host = ScriptHost::new(HostSettings::default());
        host.subscribe(Box::new(Recorder {
            log: log.clone(),
            kinds: vec![EventKind::WorldInitialize],
            fail: true,
        }));
        host.subscribe(Box::new(Recorder {
            log: log.clone(),
            kinds: vec![EventKind::WorldInitialize, EventKind::Tick],
            fail: false,
        }));

        let outcome = host.dispatch(&mut world, &WorldEvent::WorldInitialize);
        assert_eq!(outcome.handlers, 2);
        assert_eq!(outcome.failures, 1);

        host.step(&mut world);
        assert_eq!(
            log.borrow().as_slice(),
            ["world_initialize@0", "world_initialize@0", "tick@1"]
        );
    }

    #[test]
    fn deferred_jobs_run_on_the_following_step() {
        struct Deferring;
        impl Script for Deferring {
            fn name(&self) -> &str {
                "deferring"
            }
            fn subscriptions(&self) -> &[EventKind] {
                &[EventKind::Tick]
            }
            fn on_event(&mut self, event: &WorldEvent, ctx: &mut ScriptContext<'_>) -> Result<()> {
                if let WorldEvent::Tick { current_tick } = event {
                    let tick = *current_tick;
                    ctx.run_next_tick("echo", move |world, _| {
                        world.broadcast(&format!("queued at {tick}"));
                        Ok(())
                    });
                }
                Ok(())
            }
        }

        let mut world = SimWorld::new();
        let mut host = ScriptHost::new(HostSettings::default());
        host.subscribe(Box::new(Deferring));

        host.step(&mut world);
        assert!(world.messages().is_empty());
        assert_eq!(host.pending_jobs(), 1);

        host.step(&mut world);
        assert_eq!(world.messages(), &["queued at 1".to_string()]);
        assert_eq!(host.pending_jobs(), 1);
    }

    #[test]
    fn placed_component_blocks_are_ticked_and_interactions_cancelled() {
        let log: Log = Rc::default();
        let mut host = host_with_counter(&log, 2);
        let mut world = SimWorld::new();
        let pos = BlockPos::new(4, 64, 4);
        world.set_block(DimensionId::Overworld, pos, "test:counter_block");

        host.dispatch(
            &mut world,
            &WorldEvent::BlockPlace {
                dimension: DimensionId::Overworld,
                location: pos,
                block_type: "test:counter_block".into(),
                player: EntityId(1),
            },
        );
        let outcome = host.dispatch(
            &mut world,
            &WorldEvent::BlockInteract {
                dimension: DimensionId::Overworld,
                location: pos,
                block_type: "test:counter_block".into(),
                player: EntityId(1),
            },
        );
        assert!(outcome.cancelled);

        for _ in 0..4 {
            host.step(&mut world);
        }
        assert_eq!(
            log.borrow().as_slice(),
            ["interact 4, 64, 4 by 1", "tick 4, 64, 4 @2", "tick 4, 64, 4 @4"]
        );
    }

    #[test]
    fn removed_blocks_stop_ticking() {
        let log: Log = Rc::default();
        let mut host = host_with_counter(&log, 1);
        let mut world = SimWorld::new();
        let pos = BlockPos::new(0, 64, 0);
        world.set_block(DimensionId::Overworld, pos, "test:counter_block");
        assert!(host.track_block(DimensionId::Overworld, pos, "test:counter_block"));
        assert!(!host.track_block(DimensionId::Overworld, pos, "minecraft:stone"));

        host.step(&mut world);
        world.set_block(DimensionId::Overworld, pos, "minecraft:stone");
        host.dispatch(
            &mut world,
            &WorldEvent::BlockChange {
                dimension: DimensionId::Overworld,
                location: pos,
                previous_type: "test:counter_block".into(),
                current_type: "minecraft:stone".into(),
            },
        );
        host.step(&mut world);

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(host.tracked_blocks().count(), 0);
    }

    #[test]
    fn unloaded_component_blocks_are_skipped_not_forgotten() {
        let log: Log = Rc::default();
        let mut host = host_with_counter(&log, 1);
        let mut world = SimWorld::new();
        let pos = BlockPos::new(0, 64, 0);
        world.set_block(DimensionId::Overworld, pos, "test:counter_block");
        host.track_block(DimensionId::Overworld, pos, "test:counter_block");

        world.unload_chunk_at(DimensionId::Overworld, pos);
        host.step(&mut world);
        assert!(log.borrow().is_empty());
        assert_eq!(host.tracked_blocks().count(), 1);

        world.load_chunk_at(DimensionId::Overworld, pos);
        host.step(&mut world);
        assert_eq!(log.borrow().len(), 1);
    }
}
