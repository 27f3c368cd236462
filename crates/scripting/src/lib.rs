#![warn(missing_docs)]
//! Event-driven script host for block add-ons.
//!
//! Scripts subscribe to [`EventKind`]s and receive a [`ScriptContext`] with
//! the world, the random source and a queue for work deferred to the next
//! tick. Custom block behaviour lives in [`BlockComponent`]s, bound to block
//! types through the [`BlockComponentRegistry`].

pub mod addons;
mod component;
mod host;

use anyhow::Result;
use voxelhooks_core::{RandomSource, SimTick};
use voxelhooks_world::{EventKind, WorldAccess, WorldEvent};

pub use component::*;
pub use host::*;

/// Job queued with [`ScriptContext::run_next_tick`].
pub type DeferredJob = Box<dyn FnOnce(&mut dyn WorldAccess, &mut dyn RandomSource) -> Result<()>>;

/// A deferred job plus the label it is logged under.
pub(crate) struct QueuedJob {
    pub(crate) label: String,
    pub(crate) job: DeferredJob,
}

/// Handle given to scripts and components for one callback.
pub struct ScriptContext<'a> {
    /// Tick the callback runs in.
    pub tick: SimTick,
    /// World the callback acts on.
    pub world: &'a mut dyn WorldAccess,
    /// Source of random rolls.
    pub rng: &'a mut dyn RandomSource,
    deferred: &'a mut Vec<QueuedJob>,
}

impl<'a> ScriptContext<'a> {
    pub(crate) fn new(
        tick: SimTick,
        world: &'a mut dyn WorldAccess,
        rng: &'a mut dyn RandomSource,
        deferred: &'a mut Vec<QueuedJob>,
    ) -> Self {
        Self {
            tick,
            world,
            rng,
            deferred,
        }
    }

    /// Run `job` at the start of the next host step.
    pub fn run_next_tick<F>(&mut self, label: impl Into<String>, job: F)
    where
        F: FnOnce(&mut dyn WorldAccess, &mut dyn RandomSource) -> Result<()> + 'static,
    {
        self.deferred.push(QueuedJob {
            label: label.into(),
            job: Box::new(job),
        });
    }

    /// Jobs queued so far in this step.
    pub fn pending_jobs(&self) -> usize {
        self.deferred.len()
    }
}

/// An event-driven gameplay script.
pub trait Script {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Event kinds this script wants to receive.
    fn subscriptions(&self) -> &[EventKind];

    /// Handle one event. Errors are logged by the host and never propagate.
    fn on_event(&mut self, event: &WorldEvent, ctx: &mut ScriptContext<'_>) -> Result<()>;
}
