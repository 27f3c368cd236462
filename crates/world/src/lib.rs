//! World-side gameplay rules for voxelhooks add-ons.
//!
//! Everything here works against the [`WorldAccess`] seam so the same code
//! drives the headless simulator and tests.

mod access;
mod container;
mod crafter;
mod event;
pub mod growth;
pub mod shulker;
mod sim;

pub use access::*;
pub use container::*;
pub use crafter::*;
pub use event::*;
pub use growth::GrowthDropSettings;
pub use shulker::{RespawnAttempt, ShulkerSettings};
pub use sim::*;
