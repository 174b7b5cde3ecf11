//! Property tests for the generators.

use proptest::prelude::*;
use trove::utils::{create_rng, tier_for_quality};
use trove::{
    coin_value, decompose_money, quality_and_damage, ConfigHandle, GridWorld,
    GuardSpawnAllocator, Position, Rarity, RarityRoller, Recipient, RewardEngine, SpawnGroup,
    TierSpawn, TreasureConfig, TreasureCoordinator,
};

proptest! {
    #[test]
    fn test_money_decomposition_is_exact(total in 0u64..100_000_000) {
        let coins = decompose_money(total);
        let sum: u64 = coins
            .iter()
            .map(|(template, count)| coin_value(*template).unwrap() * count)
            .sum();
        prop_assert_eq!(sum, total);
    }

    #[test]
    fn test_quality_stays_in_marker_range(result in -500.0f64..500.0) {
        let (quality, damage) = quality_and_damage(result);
        prop_assert!((1.0..=99.0).contains(&quality));
        prop_assert!(damage >= 0.0);
    }

    #[test]
    fn test_rarity_never_below_guarantee(seed in any::<u64>(), level in 0u8..4) {
        let roller = RarityRoller::new(&TreasureConfig::new());
        let guaranteed = Rarity::from_level(level);
        let mut rng = create_rng(seed);
        for _ in 0..20 {
            prop_assert!(roller.roll(&mut rng, guaranteed) >= guaranteed);
        }
    }

    #[test]
    fn test_guard_allocation_terminates_within_budget(
        seed in any::<u64>(),
        weights in prop::collection::vec(-3i32..12, 0..6),
        budget in -5i32..60,
        ceiling in -5i32..15,
    ) {
        let config = TreasureConfig {
            spawn_groups: weights
                .iter()
                .map(|&weight| SpawnGroup { weight, creatures: vec![83] })
                .collect(),
            tier_spawns: vec![TierSpawn { budget, ceiling }; 10],
            ..TreasureConfig::new()
        };
        let world = GridWorld::flat(16, 0, seed);
        let mut rng = create_rng(seed);
        let requests = GuardSpawnAllocator::new(&config).allocate(5, Position::new(8, 8), &world, &mut rng);
        prop_assert!(requests.len() as i64 <= budget.max(0) as i64);
    }

    #[test]
    fn test_reward_quality_never_exceeds_chest(seed in any::<u64>(), quality in 1.0f64..=100.0) {
        let config = TreasureConfig::for_testing();
        let world = GridWorld::flat(16, 0, seed);
        let mut rng = create_rng(seed);
        let report = RewardEngine::new(&config, &world).generate(quality, &Recipient::default(), &mut rng);
        prop_assert_eq!(report.diagnostics.len(), 10);
        for entry in &report.entries {
            prop_assert!(entry.item.quality >= 0.0 && entry.item.quality <= 100.0);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_chest_quality_matches_marker(seed in any::<u64>(), quality in 1.0f64..=99.0) {
        let mut coordinator = TreasureCoordinator::new(
            GridWorld::flat(64, 10, seed),
            ConfigHandle::new(TreasureConfig::for_testing()),
            seed,
        );
        let marker = coordinator
            .create_marker_at(Position::new(20, 20), Some(quality), None)
            .unwrap();
        let chest = coordinator.create_chest(&marker, &Recipient::default()).unwrap();
        prop_assert_eq!(chest.quality, marker.chest_quality());
        prop_assert_eq!(chest.tier(), tier_for_quality(chest.quality));
    }
}
