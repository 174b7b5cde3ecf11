//! End-to-end hunts: trigger, marker, reading, redemption.

use trove::{
    ActivityEvent, Attacker, ConfigHandle, Controller, DeathEvent, GridWorld, ItemFactory,
    ItemSpec, Position, Rarity, Recipient, RedeemOutcome, Terrain, TreasureConfig,
    TreasureCoordinator, TreasureHooks, TroveResult,
};

fn coordinator(seed: u64) -> TreasureCoordinator<GridWorld> {
    TreasureCoordinator::new(
        GridWorld::flat(160, 20, seed),
        ConfigHandle::new(TreasureConfig::for_testing()),
        seed,
    )
}

#[test]
fn test_dig_read_and_redeem() -> TroveResult<()> {
    let mut coordinator = coordinator(11);
    let backpack = coordinator
        .world_mut()
        .instantiate_item(&ItemSpec::new(189, 50.0, Rarity::None))?;
    let start = Position::new(80, 80);

    let mut marker = coordinator
        .on_dig(&ActivityEvent {
            actor_position: start,
            knowledge: 75.0,
            tool: None,
            actor_rarity: Some(Rarity::Rare),
            inventory: Some(backpack),
        })
        .expect("digging with certain odds yields a marker");
    assert_eq!(marker.rarity, Rarity::Rare);
    assert!(coordinator.world().in_bounds(marker.location));

    let reading = coordinator.read_marker(&mut marker, start);
    assert_eq!(
        reading.distance,
        start.euclidean_distance(marker.location).floor() as u32
    );
    assert!(!reading.destroyed);

    let recipient = Recipient { kingdom: 2 };
    match coordinator.redeem(&marker, marker.location, &recipient) {
        RedeemOutcome::Redeemed { chest, guards } => {
            let chest = chest.expect("chest");
            assert_eq!(chest.quality, marker.chest_quality());
            assert_eq!(chest.rarity, Rarity::Rare);
            assert_eq!(chest.report.diagnostics.len(), 10);
            assert!(coordinator.world().creature_count() >= guards.len());
            for handle in &guards {
                let guard = coordinator.world().creature(*handle).expect("guard");
                assert!(guard.position.chebyshev_distance(marker.location) <= 2);
            }
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(coordinator.world().item(marker.handle).is_none());
    Ok(())
}

#[test]
fn test_kill_drops_marker_into_remains() -> TroveResult<()> {
    let mut coordinator = coordinator(5);
    let corpse = coordinator
        .world_mut()
        .instantiate_item(&ItemSpec::new(995, 10.0, Rarity::None))?;

    let marker = coordinator
        .on_creature_death(&DeathEvent {
            victim: 111,
            position: Position::new(50, 90),
            unique: false,
            champion: true,
            attackers: vec![
                Attacker {
                    controller: Controller::Player,
                    fighting_knowledge: 80.0,
                },
                Attacker {
                    controller: Controller::Wild,
                    fighting_knowledge: 10.0,
                },
            ],
            remains: Some(corpse),
        })
        .expect("marker");

    let stored = coordinator.world().item(marker.handle).expect("stored marker");
    assert_eq!(stored.container, Some(corpse));
    assert!(marker.skill_note.is_some());
    Ok(())
}

#[test]
fn test_wild_kill_yields_nothing() {
    let mut coordinator = coordinator(5);
    let marker = coordinator.on_creature_death(&DeathEvent {
        victim: 11,
        position: Position::new(50, 90),
        unique: false,
        champion: false,
        attackers: vec![Attacker {
            controller: Controller::Wild,
            fighting_knowledge: 50.0,
        }],
        remains: None,
    });
    assert!(marker.is_none());
}

#[test]
fn test_markers_avoid_villages_and_altars() {
    let mut world = GridWorld::flat(100, 5, 2);
    world.add_settlement(Position::new(0, 0), Position::new(99, 49));
    for x in 0..100 {
        world.add_obstacle(Position::new(x, 70));
    }
    let mut coordinator =
        TreasureCoordinator::new(world, ConfigHandle::new(TreasureConfig::for_testing()), 8);

    for _ in 0..20 {
        let marker = coordinator
            .create_marker(
                &trove::Trigger::Staff {
                    position: Position::new(50, 80),
                    destination: None,
                },
                true,
            )
            .expect("marker");
        let world = coordinator.world();
        assert!(!world.is_inside_settlement(marker.location.x, marker.location.y));
        assert!(!world.is_obstacle_blocking(marker.location.x, marker.location.y));
    }
}

#[test]
fn test_same_seed_same_hunt() {
    let run = |seed| {
        let mut coordinator = coordinator(seed);
        let marker = coordinator
            .create_marker_at(Position::new(30, 30), Some(64.0), None)
            .expect("marker");
        match coordinator.redeem(&marker, marker.location, &Recipient::default()) {
            RedeemOutcome::Redeemed { chest, .. } => chest.map(|chest| chest.report),
            RedeemOutcome::WrongTile { .. } => None,
        }
    };
    assert_eq!(run(21), run(21));
}
