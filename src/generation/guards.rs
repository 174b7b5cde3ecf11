//! Chest guardians.
//!
//! A tier grants a weight budget. Spawn groups are bought from it, heaviest
//! affordable group first, until the budget is spent or nothing fits.

use crate::constants::MAX_GUARD_AGE;
use crate::{CreatureFactory, CreatureKind, Position, SpawnGroup, TreasureConfig};
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How far from the chest a guardian may appear, per axis.
pub const GUARD_SCATTER: i32 = 2;

/// One guardian to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub kind: CreatureKind,
    pub position: Position,
    pub age: u32,
    pub female: bool,
    /// Facing in degrees, 0 to 360
    pub rotation: f32,
}

/// Splits a tier's guardian budget into spawn requests.
#[derive(Debug, Clone, Copy)]
pub struct GuardSpawnAllocator<'a> {
    config: &'a TreasureConfig,
}

impl<'a> GuardSpawnAllocator<'a> {
    pub fn new(config: &'a TreasureConfig) -> Self {
        Self { config }
    }

    /// Spawn requests for a chest of `tier` standing at `chest`.
    ///
    /// Always terminates: every iteration spends at least one unit of budget,
    /// and the loop stops as soon as no group fits.
    pub fn allocate<C, R>(&self, tier: usize, chest: Position, creatures: &C, rng: &mut R) -> Vec<SpawnRequest>
    where
        C: CreatureFactory + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(limits) = self.config.tier_spawn(tier) else {
            warn!("No guardian budget for tier {}", tier);
            return Vec::new();
        };

        let mut groups: Vec<&SpawnGroup> = self
            .config
            .spawn_groups
            .iter()
            .filter(|group| group.weight > 0 && !group.creatures.is_empty())
            .collect();
        // Stable, so equal weights keep their configured order.
        groups.sort_by(|a, b| b.weight.cmp(&a.weight));

        let mut budget = limits.budget;
        let mut requests = Vec::new();
        while budget > 0 {
            let mut affordable = groups
                .iter()
                .filter(|group| group.weight <= budget && group.weight <= limits.ceiling);
            let Some(high) = affordable.next() else {
                break;
            };
            let low = affordable.next().unwrap_or(high);

            let total = high.weight as i64 + low.weight as i64;
            let chosen = if rng.gen_range(0..total) < high.weight as i64 {
                high
            } else {
                low
            };
            let Some(&kind) = chosen.creatures.choose(rng) else {
                break;
            };

            budget -= chosen.weight;
            let request = self.request(kind, chest, creatures, rng);
            debug!(
                "Guardian {} of weight {} at {}, {} budget left",
                kind, chosen.weight, request.position, budget
            );
            requests.push(request);
        }
        requests
    }

    fn request<C, R>(&self, kind: CreatureKind, chest: Position, creatures: &C, rng: &mut R) -> SpawnRequest
    where
        C: CreatureFactory + ?Sized,
        R: Rng + ?Sized,
    {
        let max_age = creatures.max_age(kind).unwrap_or(0).min(MAX_GUARD_AGE);
        SpawnRequest {
            kind,
            position: Position::new(
                chest.x.saturating_add(rng.gen_range(-GUARD_SCATTER..=GUARD_SCATTER)),
                chest.y.saturating_add(rng.gen_range(-GUARD_SCATTER..=GUARD_SCATTER)),
            ),
            age: (rng.gen::<f64>() * max_age as f64) as u32,
            female: rng.gen(),
            rotation: rng.gen_range(0.0..360.0),
        }
    }
}
