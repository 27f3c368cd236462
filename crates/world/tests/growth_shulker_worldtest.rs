use voxelhooks_core::{BlockPos, DimensionId, Enchantment, EnchantmentType, ItemStack, Vec3};
use voxelhooks_testkit::FixedRolls;
use voxelhooks_world::growth::{
    check_sapling_growth, on_structure_grow, CREAKING_HEART, PALE_OAK_SAPLING, PALE_OAK_TREE,
};
use voxelhooks_world::shulker::{
    on_entity_die, run_respawn_checks, try_respawn_near, PURPUR_BLOCK, SHULKER,
};
use voxelhooks_world::{
    EntityId, EntityRef, GrowthDropSettings, QueryError, RespawnAttempt, ShulkerSettings,
    SimWorld, WorldAccess,
};

fn shulker_at(location: Vec3) -> EntityRef {
    EntityRef {
        id: EntityId(500),
        type_id: SHULKER.into(),
        dimension: DimensionId::End,
        location,
    }
}

#[test]
fn growth_roll_must_be_strictly_below_chance() {
    let settings = GrowthDropSettings::default();
    let mut world = SimWorld::new();
    let pos = BlockPos::new(0, 64, 0);

    let mut rolls = FixedRolls::new([settings.drop_chance, settings.drop_chance - 1e-9]);
    assert!(!on_structure_grow(
        &mut world,
        &mut rolls,
        &settings,
        DimensionId::Overworld,
        pos,
        PALE_OAK_TREE
    )
    .unwrap());
    assert!(on_structure_grow(
        &mut world,
        &mut rolls,
        &settings,
        DimensionId::Overworld,
        pos,
        PALE_OAK_TREE
    )
    .unwrap());
    assert_eq!(world.dropped_items().len(), 1);
    assert_eq!(world.dropped_items()[0].stack.item.as_str(), CREAKING_HEART);
}

#[test]
fn other_structures_consume_no_roll() {
    let mut world = SimWorld::new();
    let mut rolls = FixedRolls::new([0.0]);
    assert!(!on_structure_grow(
        &mut world,
        &mut rolls,
        &GrowthDropSettings::default(),
        DimensionId::Overworld,
        BlockPos::new(0, 64, 0),
        "minecraft:oak_tree"
    )
    .unwrap());
    assert_eq!(rolls.consumed(), 0);
}

#[test]
fn sapling_check_in_unloaded_chunk_is_abandoned() {
    let mut world = SimWorld::new();
    let pos = BlockPos::new(100, 64, 100);
    world.unload_chunk_at(DimensionId::Overworld, pos);
    let mut rolls = FixedRolls::new([0.0]);

    let err = check_sapling_growth(&mut world, &mut rolls, &GrowthDropSettings::default(), pos)
        .unwrap_err();
    assert!(matches!(err, QueryError::Unloaded { .. }));
    assert!(world.dropped_items().is_empty());
    assert_eq!(rolls.consumed(), 0);
}

#[test]
fn sapling_check_with_sapling_present_keeps_waiting() {
    let mut world = SimWorld::new();
    let pos = BlockPos::new(1, 64, 1);
    world.set_block(DimensionId::Overworld, pos, PALE_OAK_SAPLING);
    let mut rolls = FixedRolls::new([0.0]);

    assert!(!check_sapling_growth(&mut world, &mut rolls, &GrowthDropSettings::default(), pos).unwrap());
    assert!(world.messages().is_empty());
}

#[test]
fn loot_counts_respect_looting_caps() {
    for (level, cap) in [(0u8, 3u32), (1, 5), (2, 7), (3, 10)] {
        let mut world = SimWorld::new();
        let player = world.add_player("p", DimensionId::End, Vec3::new(0.0, 70.0, 0.0));
        let mut sword = ItemStack::new("minecraft:netherite_sword", 1);
        if level > 0 {
            sword = sword.with_enchantment(Enchantment::new(EnchantmentType::Looting, level));
        }
        world.set_held_item(player, Some(sword));
        let killer = world.entity(player).cloned().unwrap();

        let mut rolls = FixedRolls::new([0.9999]);
        let dropped = on_entity_die(
            &mut world,
            &mut rolls,
            &shulker_at(Vec3::new(1.0, 70.0, 1.0)),
            Some(&killer),
        )
        .unwrap();
        assert_eq!(dropped, cap, "looting {level}");
    }
}

#[test]
fn zero_arrow_roll_spawns_nothing() {
    let mut world = SimWorld::new();
    let player = world.add_player("p", DimensionId::End, Vec3::new(0.0, 70.0, 0.0));
    let killer = world.entity(player).cloned().unwrap();
    let mut rolls = FixedRolls::new([0.0]);

    let dropped = on_entity_die(
        &mut world,
        &mut rolls,
        &shulker_at(Vec3::new(1.0, 70.0, 1.0)),
        Some(&killer),
    )
    .unwrap();
    assert_eq!(dropped, 0);
    assert!(world.dropped_items().is_empty());
}

#[test]
fn unknown_killer_counts_as_no_looting() {
    let mut world = SimWorld::new();
    let ghost = EntityRef {
        id: EntityId(77),
        type_id: "minecraft:player".into(),
        dimension: DimensionId::End,
        location: Vec3::new(0.0, 70.0, 0.0),
    };
    let mut rolls = FixedRolls::new([0.9999]);
    let dropped = on_entity_die(
        &mut world,
        &mut rolls,
        &shulker_at(Vec3::new(1.0, 70.0, 1.0)),
        Some(&ghost),
    )
    .unwrap();
    assert_eq!(dropped, 3);
}

fn end_world_with_purpur(pos: BlockPos) -> (SimWorld, EntityId) {
    let mut world = SimWorld::new();
    let player = world.add_player("p", DimensionId::End, Vec3::new(0.0, 70.0, 0.0));
    world.set_block(DimensionId::End, pos, PURPUR_BLOCK);
    (world, player)
}

#[test]
fn respawn_proceeds_at_exact_chance_and_skips_above() {
    let settings = ShulkerSettings::default();
    let pos = BlockPos::new(0, 70, 0);

    let (mut world, _) = end_world_with_purpur(pos);
    let player = world.players().remove(0);
    let mut rolls = FixedRolls::new([settings.respawn_chance, 0.5, 0.5, 0.5]);
    assert!(matches!(
        try_respawn_near(&mut world, &mut rolls, &settings, &player).unwrap(),
        RespawnAttempt::Spawned { location, .. } if location == pos
    ));

    let (mut world, _) = end_world_with_purpur(pos);
    let player = world.players().remove(0);
    let mut rolls = FixedRolls::new([settings.respawn_chance + 1e-6, 0.5, 0.5, 0.5]);
    assert_eq!(
        try_respawn_near(&mut world, &mut rolls, &settings, &player).unwrap(),
        RespawnAttempt::SkippedRoll
    );
    assert_eq!(rolls.consumed(), 1);
}

#[test]
fn respawn_requires_air_above_and_no_nearby_shulker() {
    let settings = ShulkerSettings::default();
    let pos = BlockPos::new(0, 70, 0);

    let (mut world, _) = end_world_with_purpur(pos);
    world.set_block(DimensionId::End, pos.above(), "minecraft:end_stone");
    let player = world.players().remove(0);
    let mut rolls = FixedRolls::new([0.0, 0.5, 0.5, 0.5]);
    assert_eq!(
        try_respawn_near(&mut world, &mut rolls, &settings, &player).unwrap(),
        RespawnAttempt::Obstructed(pos)
    );

    let (mut world, _) = end_world_with_purpur(pos);
    world.insert_entity(DimensionId::End, SHULKER, Vec3::new(5.0, 70.0, 0.0));
    let player = world.players().remove(0);
    let mut rolls = FixedRolls::new([0.0, 0.5, 0.5, 0.5]);
    assert_eq!(
        try_respawn_near(&mut world, &mut rolls, &settings, &player).unwrap(),
        RespawnAttempt::Crowded(pos)
    );
}

#[test]
fn respawn_candidate_y_is_clamped_to_city_heights() {
    let settings = ShulkerSettings::default();
    let mut world = SimWorld::new();
    world.add_player("p", DimensionId::End, Vec3::new(0.0, 10.0, 0.0));
    let player = world.players().remove(0);

    let mut rolls = FixedRolls::new([0.0, 0.5, 0.0, 0.5]);
    assert_eq!(
        try_respawn_near(&mut world, &mut rolls, &settings, &player).unwrap(),
        RespawnAttempt::NoPurpur(BlockPos::new(0, 40, 0))
    );
}

#[test]
fn respawn_checks_skip_players_outside_the_end_and_off_interval() {
    let settings = ShulkerSettings::default();
    let mut world = SimWorld::new();
    world.add_player("nether", DimensionId::Nether, Vec3::new(0.0, 70.0, 0.0));
    let mut rolls = FixedRolls::always(0.0);

    assert!(run_respawn_checks(&mut world, &mut rolls, &settings, 19).is_empty());
    assert_eq!(
        run_respawn_checks(&mut world, &mut rolls, &settings, 20),
        vec![RespawnAttempt::NotInEnd]
    );
    assert_eq!(rolls.consumed(), 0);
}

#[test]
fn respawn_checks_swallow_unloaded_chunks() {
    let settings = ShulkerSettings::default();
    let (mut world, _) = end_world_with_purpur(BlockPos::new(0, 70, 0));
    world.unload_chunk_at(DimensionId::End, BlockPos::new(0, 70, 0));
    let mut rolls = FixedRolls::new([0.0, 0.5, 0.5, 0.5]);

    assert!(run_respawn_checks(&mut world, &mut rolls, &settings, 40).is_empty());
    assert_eq!(world.entities_of_type(DimensionId::End, SHULKER).count(), 0);
}
