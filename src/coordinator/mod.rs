//! # Coordinator
//!
//! The engine's front door. A [`TreasureCoordinator`] owns the host world,
//! a configuration handle and the random source, and strings the generators
//! together: triggers become markers, markers become chests and guardians.
//!
//! Each operation takes one configuration snapshot at its start, so a reload
//! in the middle of a call never mixes two configurations.

pub mod entities;
pub mod triggers;

pub use entities::*;
pub use triggers::*;

use crate::utils::{clamp_quality, create_rng, percent_chance};
use crate::{
    ConfigHandle, CreatureHandle, Direction, Evaluation, EvaluationContext, GuardSpawnAllocator,
    ItemHandle, ItemSpec, LocationFinder, Position, QualityEvaluator, Rarity, RarityRoller,
    Recipient, RewardEngine, SearchRequest, SpawnRequest, TreasureConfig, TroveResult,
    WorldServices,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::path::Path;

/// Runs treasure hunts against a host world.
pub struct TreasureCoordinator<W: WorldServices> {
    world: W,
    config: ConfigHandle,
    rng: StdRng,
}

impl<W: WorldServices> TreasureCoordinator<W> {
    /// Creates a coordinator with a seeded random source.
    pub fn new(world: W, config: ConfigHandle, seed: u64) -> Self {
        Self::with_rng(world, config, create_rng(seed))
    }

    pub fn with_rng(world: W, config: ConfigHandle, rng: StdRng) -> Self {
        Self { world, config, rng }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Reloads configuration from a JSON file; on error the old one stays.
    pub fn reload_config(&self, path: impl AsRef<Path>) -> TroveResult<Vec<String>> {
        self.config.reload_from_path(path)
    }

    /// Turns a trigger into a marker, if the dice and the terrain allow it.
    ///
    /// Privileged callers skip the eligibility roll. Unprivileged markers
    /// with nowhere to go are destroyed.
    pub fn create_marker(&mut self, trigger: &Trigger, privileged: bool) -> Option<TreasureMarker> {
        let config = self.config.snapshot();
        if !privileged && !is_eligible(&config, trigger, &mut self.rng) {
            return None;
        }

        let request = SearchRequest::from_config(trigger.origin(), &config);
        let location = match LocationFinder::new(&config).find(&self.world, &request, &mut self.rng) {
            Ok(location) => location,
            Err(e) => {
                info!("No treasure for trigger at {}: {}", trigger.origin(), e);
                return None;
            }
        };

        let evaluation = QualityEvaluator::new(&config).evaluate(
            &mut self.world,
            &trigger.evaluation_context(),
            &mut self.rng,
        );
        self.issue_marker(
            &config,
            location,
            evaluation,
            trigger.marker_origin(),
            trigger.destination(),
            privileged,
        )
    }

    /// Staff tool: a marker for a chosen tile.
    ///
    /// `quality` outside 1 to 100 is replaced by a random one.
    pub fn create_marker_at(
        &mut self,
        location: Position,
        quality: Option<f64>,
        destination: Option<ItemHandle>,
    ) -> Option<TreasureMarker> {
        let config = self.config.snapshot();
        let quality = self.staff_quality(quality);
        let evaluation = Evaluation {
            quality,
            damage: 0.0,
            rarity: RarityRoller::new(&config).roll(&mut self.rng, Rarity::None),
            skill_note: None,
        };
        self.issue_marker(&config, location, evaluation, MarkerOrigin::Staff, destination, true)
    }

    fn issue_marker(
        &mut self,
        config: &TreasureConfig,
        location: Position,
        evaluation: Evaluation,
        origin: MarkerOrigin,
        destination: Option<ItemHandle>,
        privileged: bool,
    ) -> Option<TreasureMarker> {
        let spec = ItemSpec::new(config.marker_template, evaluation.quality, evaluation.rarity);
        let handle = match self.world.instantiate_item(&spec) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not create treasure marker: {}", e);
                return None;
            }
        };

        match destination {
            Some(container) => {
                if let Err(e) = self.world.insert_into(container, handle) {
                    warn!("Could not deliver treasure marker to {}: {}", container, e);
                    self.world.destroy(handle);
                    return None;
                }
            }
            None if !privileged => {
                debug!("Treasure marker has nowhere to go, destroying it");
                self.world.destroy(handle);
                return None;
            }
            None => {}
        }

        info!(
            "Treasure marker of quality {:.2} ({:?}) points at {}",
            evaluation.quality, evaluation.rarity, location
        );
        Some(TreasureMarker {
            handle,
            location,
            quality: evaluation.quality,
            damage: evaluation.damage,
            rarity: evaluation.rarity,
            origin,
            skill_note: evaluation.skill_note,
        })
    }

    /// Builds and fills the chest a marker leads to. The chest is not
    /// placed anywhere.
    pub fn create_chest(&mut self, marker: &TreasureMarker, recipient: &Recipient) -> Option<TreasureChest> {
        self.build_chest(marker.chest_quality(), marker.rarity, recipient)
    }

    fn build_chest(&mut self, quality: f64, rarity: Rarity, recipient: &Recipient) -> Option<TreasureChest> {
        let config = self.config.snapshot();
        let quality = clamp_quality(quality);

        let handle = match self
            .world
            .instantiate_item(&ItemSpec::new(config.chest_template, quality, rarity))
        {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not create treasure chest: {}", e);
                return None;
            }
        };

        let report = RewardEngine::new(&config, &self.world).generate(quality, recipient, &mut self.rng);
        let mut contents = Vec::with_capacity(report.entries.len());
        for entry in &report.entries {
            let item = match self.world.instantiate_item(&entry.item) {
                Ok(item) => item,
                Err(e) => {
                    warn!("Skipping reward {}: {}", entry.item.template, e);
                    continue;
                }
            };
            for inner in &entry.contents {
                let inner_item = match self.world.instantiate_item(inner) {
                    Ok(inner_item) => inner_item,
                    Err(e) => {
                        warn!("Could not fill reward {} with {}: {}", entry.item.template, inner.template, e);
                        continue;
                    }
                };
                if let Err(e) = self.world.insert_into(item, inner_item) {
                    warn!("Could not fill reward {} with {}: {}", entry.item.template, inner.template, e);
                    self.world.destroy(inner_item);
                }
            }
            if let Err(e) = self.world.insert_into(handle, item) {
                warn!("Could not put reward {} in the chest: {}", entry.item.template, e);
                self.world.destroy(item);
                continue;
            }
            contents.push(item);
        }

        let lock = if percent_chance(&mut self.rng, config.lock_chance) {
            self.lock_chest(&config, handle, quality)
        } else {
            None
        };

        info!(
            "Treasure chest of quality {:.2} holds {} items{}",
            quality,
            contents.len(),
            if lock.is_some() { ", locked" } else { "" }
        );
        Some(TreasureChest {
            handle,
            quality,
            rarity,
            contents,
            lock,
            report,
        })
    }

    fn lock_chest(&mut self, config: &TreasureConfig, chest: ItemHandle, quality: f64) -> Option<LockInfo> {
        let lock_quality = clamp_quality(quality * config.lock_multiplier);
        let spec = ItemSpec::new(config.lock_template, lock_quality, Rarity::None);
        let lock = match self.world.instantiate_item(&spec) {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Could not create chest lock: {}", e);
                return None;
            }
        };
        if let Err(e) = self.world.lock_with(chest, lock) {
            warn!("Could not lock the chest: {}", e);
            self.world.destroy(lock);
            return None;
        }
        Some(LockInfo {
            handle: lock,
            quality: lock_quality,
        })
    }

    /// Guardian requests for a chest of `tier` at `chest`.
    pub fn allocate_guards(&mut self, tier: usize, chest: Position) -> Vec<SpawnRequest> {
        let config = self.config.snapshot();
        GuardSpawnAllocator::new(&config).allocate(tier, chest, &self.world, &mut self.rng)
    }

    /// Guardian requests for the chest a marker leads to.
    pub fn allocate_guards_for(&mut self, marker: &TreasureMarker) -> Vec<SpawnRequest> {
        self.allocate_guards(marker.tier(), marker.location)
    }

    /// Spawns guardians, skipping any the world refuses.
    pub fn spawn_guards(&mut self, requests: &[SpawnRequest]) -> Vec<CreatureHandle> {
        requests
            .iter()
            .filter_map(|request| match self.world.instantiate_creature(request) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Could not spawn guardian {} at {}: {}", request.kind, request.position, e);
                    None
                }
            })
            .collect()
    }

    /// Digs up the treasure a marker points at.
    ///
    /// The digger must stand on the treasure tile. Once digging starts the
    /// marker is used up, even if the chest cannot be built or placed. A
    /// chest the world will not place is destroyed along with its contents,
    /// and no guardians spawn.
    pub fn redeem(&mut self, marker: &TreasureMarker, digger: Position, recipient: &Recipient) -> RedeemOutcome {
        if digger != marker.location {
            return RedeemOutcome::WrongTile {
                distance: digger.chebyshev_distance(marker.location),
            };
        }

        let chest = self.create_chest(marker, recipient).and_then(|chest| {
            match self.world.place_at(chest.handle, marker.location) {
                Ok(()) => Some(chest),
                Err(e) => {
                    warn!("Could not place chest at {}: {}", marker.location, e);
                    self.world.destroy(chest.handle);
                    None
                }
            }
        });
        let guards = match &chest {
            Some(chest) => {
                let requests = self.allocate_guards(chest.tier(), marker.location);
                self.spawn_guards(&requests)
            }
            None => Vec::new(),
        };

        self.world.destroy(marker.handle);
        info!(
            "Treasure at {} dug up with {} guardians",
            marker.location,
            guards.len()
        );
        RedeemOutcome::Redeemed { chest, guards }
    }

    /// Reads a marker from `reader`, wearing it down when wear is enabled.
    pub fn read_marker(&mut self, marker: &mut TreasureMarker, reader: Position) -> MarkerReading {
        let config = self.config.snapshot();
        let distance = reader.euclidean_distance(marker.location).floor() as u32;
        let direction = Direction::towards(reader, marker.location);

        let mut damage_taken = 0.0;
        if config.wear_markers {
            let wear = (self.rng.gen::<f64>() * 0.0015 * config.wear_multiplier).clamp(0.0015, 100.0);
            damage_taken = wear * (1.0 - marker.rarity.level() as f64 / 10.0);
            marker.damage += damage_taken;
        }

        let destroyed = marker.is_destroyed();
        if destroyed {
            info!("Treasure marker {} fell apart", marker.handle);
            self.world.destroy(marker.handle);
        }
        MarkerReading {
            distance,
            direction,
            damage_taken,
            destroyed,
        }
    }

    /// Staff tool: a chest on the spot, guardians included.
    ///
    /// `quality` outside 1 to 100 is replaced by a random one.
    pub fn spawn_chest_at(
        &mut self,
        position: Position,
        quality: Option<f64>,
        recipient: &Recipient,
    ) -> Option<(TreasureChest, Vec<CreatureHandle>)> {
        let quality = self.staff_quality(quality);
        let chest = self.build_chest(quality, Rarity::None, recipient)?;
        if let Err(e) = self.world.place_at(chest.handle, position) {
            warn!("Could not place chest at {}: {}", position, e);
            self.world.destroy(chest.handle);
            return None;
        }
        let requests = self.allocate_guards(chest.tier(), position);
        let guards = self.spawn_guards(&requests);
        Some((chest, guards))
    }

    fn staff_quality(&mut self, quality: Option<f64>) -> f64 {
        match quality {
            Some(quality) if (1.0..=100.0).contains(&quality) => quality,
            _ => clamp_quality(self.rng.gen_range(1.0..=100.0)),
        }
    }

    /// Evaluates a context without creating anything, for previews.
    pub fn evaluate(&mut self, context: &EvaluationContext) -> Evaluation {
        let config = self.config.snapshot();
        QualityEvaluator::new(&config).evaluate(&mut self.world, context, &mut self.rng)
    }
}

impl<W: WorldServices> TreasureHooks for TreasureCoordinator<W> {
    fn on_dig(&mut self, event: &ActivityEvent) -> Option<TreasureMarker> {
        self.create_marker(&Trigger::Activity(Activity::Digging, event.clone()), false)
    }

    fn on_mine(&mut self, event: &ActivityEvent) -> Option<TreasureMarker> {
        self.create_marker(&Trigger::Activity(Activity::Mining, event.clone()), false)
    }

    fn on_surface_mine(&mut self, event: &ActivityEvent) -> Option<TreasureMarker> {
        self.create_marker(&Trigger::Activity(Activity::SurfaceMining, event.clone()), false)
    }

    fn on_fish(&mut self, event: &ActivityEvent) -> Option<TreasureMarker> {
        self.create_marker(&Trigger::Activity(Activity::Fishing, event.clone()), false)
    }

    fn on_creature_death(&mut self, event: &DeathEvent) -> Option<TreasureMarker> {
        self.create_marker(&Trigger::Death(event.clone()), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridWorld, ItemFactory};

    fn coordinator(config: TreasureConfig) -> TreasureCoordinator<GridWorld> {
        TreasureCoordinator::new(GridWorld::flat(128, 10, 3), ConfigHandle::new(config), 3)
    }

    fn backpack(coordinator: &mut TreasureCoordinator<GridWorld>) -> ItemHandle {
        coordinator
            .world_mut()
            .instantiate_item(&ItemSpec::new(189, 50.0, Rarity::None))
            .unwrap()
    }

    fn dig_event(inventory: Option<ItemHandle>) -> ActivityEvent {
        ActivityEvent {
            actor_position: Position::new(64, 64),
            knowledge: 60.0,
            tool: None,
            actor_rarity: None,
            inventory,
        }
    }

    #[test]
    fn test_dig_creates_marker_in_inventory() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let pack = backpack(&mut coordinator);
        let marker = coordinator.on_dig(&dig_event(Some(pack))).expect("marker");

        assert!((1.0..=99.0).contains(&marker.quality));
        assert_eq!(marker.origin, MarkerOrigin::Activity(Activity::Digging));
        let stored = coordinator.world().item(marker.handle).unwrap();
        assert_eq!(stored.container, Some(pack));
        assert_eq!(stored.spec.template, 4200);
    }

    #[test]
    fn test_marker_without_destination_is_destroyed() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let before = coordinator.world().item_count();
        assert!(coordinator.on_dig(&dig_event(None)).is_none());
        assert_eq!(coordinator.world().item_count(), before);
    }

    #[test]
    fn test_privileged_marker_may_stay_undelivered() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let trigger = Trigger::Staff {
            position: Position::new(64, 64),
            destination: None,
        };
        let marker = coordinator.create_marker(&trigger, true).expect("marker");
        assert!(coordinator.world().item(marker.handle).is_some());
        assert!(coordinator.create_marker(&trigger, false).is_none());
    }

    #[test]
    fn test_no_marker_on_a_drowned_world() {
        let mut coordinator = TreasureCoordinator::new(
            GridWorld::flat(64, -5, 1),
            ConfigHandle::new(TreasureConfig::for_testing()),
            1,
        );
        let pack = backpack(&mut coordinator);
        assert!(coordinator.on_dig(&dig_event(Some(pack))).is_none());
    }

    #[test]
    fn test_redeem_requires_the_right_tile() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let marker = coordinator
            .create_marker_at(Position::new(30, 30), Some(50.0), None)
            .unwrap();
        let outcome = coordinator.redeem(&marker, Position::new(33, 30), &Recipient::default());
        assert_eq!(outcome, RedeemOutcome::WrongTile { distance: 3 });
        assert!(coordinator.world().item(marker.handle).is_some());
    }

    #[test]
    fn test_redeem_places_chest_and_guards() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let spot = Position::new(40, 40);
        let marker = coordinator.create_marker_at(spot, Some(70.0), None).unwrap();

        let RedeemOutcome::Redeemed { chest, guards } =
            coordinator.redeem(&marker, spot, &Recipient::default())
        else {
            panic!("expected redemption");
        };
        let chest = chest.expect("chest");
        let world = coordinator.world();

        assert!(world.item(marker.handle).is_none());
        assert_eq!(world.item(chest.handle).unwrap().position, Some(spot));
        assert!(!guards.is_empty());
        for handle in &chest.contents {
            assert_eq!(world.item(*handle).unwrap().container, Some(chest.handle));
        }
        let lock = chest.lock.expect("lock");
        assert_eq!(world.item(chest.handle).unwrap().lock, Some(lock.handle));
        assert_eq!(lock.quality, clamp_quality(chest.quality * 0.25));
    }

    #[test]
    fn test_marker_is_used_up_when_chest_fails() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let spot = Position::new(40, 40);
        let marker = coordinator.create_marker_at(spot, Some(70.0), None).unwrap();
        coordinator.world_mut().refuse_template(995);

        let outcome = coordinator.redeem(&marker, spot, &Recipient::default());
        assert_eq!(
            outcome,
            RedeemOutcome::Redeemed {
                chest: None,
                guards: Vec::new()
            }
        );
        assert!(coordinator.world().item(marker.handle).is_none());
    }

    #[test]
    fn test_unplaceable_chest_is_destroyed_without_guards() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let items_before = coordinator.world().item_count();
        let off_map = Position::new(-5, -5);
        let marker = coordinator.create_marker_at(off_map, Some(70.0), None).unwrap();

        let outcome = coordinator.redeem(&marker, off_map, &Recipient::default());
        assert_eq!(
            outcome,
            RedeemOutcome::Redeemed {
                chest: None,
                guards: Vec::new()
            }
        );
        let world = coordinator.world();
        assert!(world.item(marker.handle).is_none());
        assert_eq!(world.item_count(), items_before);
        assert_eq!(world.creature_count(), 0);
    }

    #[test]
    fn test_read_marker_wears_it_down() {
        let mut coordinator = coordinator(TreasureConfig {
            wear_multiplier: 66_667.0,
            ..TreasureConfig::for_testing()
        });
        let mut marker = coordinator
            .create_marker_at(Position::new(10, 10), Some(50.0), None)
            .unwrap();
        marker.rarity = Rarity::None;

        let reading = coordinator.read_marker(&mut marker, Position::new(13, 14));
        assert_eq!(reading.distance, 5);
        assert_eq!(reading.direction, Some(Direction::Northwest));
        assert!(reading.damage_taken >= 0.0015);

        let mut readings = 1;
        while !marker.is_destroyed() && readings < 10_000 {
            coordinator.read_marker(&mut marker, Position::new(10, 10));
            readings += 1;
        }
        assert!(marker.is_destroyed());
        assert!(coordinator.world().item(marker.handle).is_none());
    }

    #[test]
    fn test_read_marker_without_wear() {
        let mut coordinator = coordinator(TreasureConfig {
            wear_markers: false,
            ..TreasureConfig::for_testing()
        });
        let mut marker = coordinator
            .create_marker_at(Position::new(10, 10), Some(50.0), None)
            .unwrap();
        let reading = coordinator.read_marker(&mut marker, Position::new(10, 10));
        assert_eq!(reading.direction, None);
        assert_eq!(reading.damage_taken, 0.0);
        assert_eq!(marker.damage, 0.0);
    }

    #[test]
    fn test_spawn_chest_at_rejects_off_map() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        let before = coordinator.world().item_count();
        assert!(coordinator
            .spawn_chest_at(Position::new(-4, 9), Some(30.0), &Recipient::default())
            .is_none());
        assert_eq!(coordinator.world().item_count(), before);

        let (chest, _) = coordinator
            .spawn_chest_at(Position::new(4, 9), Some(30.0), &Recipient::default())
            .unwrap();
        assert_eq!(chest.quality, 30.0);
        assert_eq!(chest.tier(), 3);
    }

    #[test]
    fn test_staff_quality_out_of_range_is_random() {
        let mut coordinator = coordinator(TreasureConfig::for_testing());
        for wanted in [Some(0.0), Some(250.0), None] {
            let marker = coordinator
                .create_marker_at(Position::new(5, 5), wanted, None)
                .unwrap();
            assert!((1.0..=100.0).contains(&marker.quality));
        }
    }
}
