use serde::Serialize;
use std::path::PathBuf;
use voxelhooks_core::ItemStack;
use voxelhooks_testkit::{run_micro_worldtest, MicroWorldtestConfig};
use voxelhooks_world::{BlockContainer, RecipeTable, NETHERITE_CRAFTER_SLOTS, NETHERITE_INGOT};

fn snapshot_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/snapshots")
        .join(name)
}

#[test]
fn micro_crafter_helmet_cycle_snapshot() {
    struct State {
        container: BlockContainer,
        taken: u32,
    }

    #[derive(Serialize)]
    struct Snap {
        ingots: u32,
        helmets: u32,
        taken: u32,
    }

    let mut container = BlockContainer::new(NETHERITE_CRAFTER_SLOTS);
    container.insert(0, ItemStack::new(NETHERITE_INGOT, 2));
    let table = RecipeTable::netherite_crafter();

    run_micro_worldtest(
        MicroWorldtestConfig {
            name: "micro_crafter_helmet_cycle".to_string(),
            ticks: 3,
            snapshot_path: snapshot_path("micro_crafter_helmet_cycle.json"),
        },
        State {
            container,
            taken: 0,
        },
        |tick, state| {
            // The player empties the output slot once, on tick 1.
            if tick.0 == 1 {
                if let Some(stack) = state.container.take(17, 1) {
                    state.taken += stack.count;
                }
            }
            table.evaluate_container(&mut state.container);
            Ok(())
        },
        |_, state| Snap {
            ingots: state.container.get(0).map_or(0, |s| s.count),
            helmets: state.container.get(17).map_or(0, |s| s.count),
            taken: state.taken,
        },
    )
    .expect("snapshot matches");
}
