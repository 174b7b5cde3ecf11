//! # Configuration Module
//!
//! The immutable option snapshot every component reads from.
//!
//! A [`TreasureConfig`] is built once (from defaults or from a JSON document
//! via [`loader`]), normalized into its valid ranges, and then only ever read.
//! Reloading builds a new snapshot and swaps it into the [`ConfigHandle`];
//! operations already running keep the snapshot they started with.

pub mod loader;

pub use loader::*;

use crate::constants::TIER_COUNT;
use crate::{CreatureKind, KingdomId, MaterialId, TemplateId};
use log::warn;
use serde::{Deserialize, Serialize};

/// Item rewards for one quality tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierReward {
    /// Picks that always happen
    pub guaranteed: u32,
    /// Extra picks, each gated by `optional_chance`
    pub optional: u32,
    /// "1 in N" chance for every optional pick; zero or less disables them
    pub optional_chance: i32,
    /// Indices into [`TreasureConfig::reward_groups`]; duplicates weigh a group up
    pub groups: Vec<usize>,
}

/// A weighted bracket of guardian species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Budget consumed by one spawn from this group
    pub weight: i32,
    /// Candidate species, chosen uniformly
    pub creatures: Vec<CreatureKind>,
}

/// Guardian budget for one quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpawn {
    /// Total weight to spawn
    pub budget: i32,
    /// Heaviest single group allowed
    pub ceiling: i32,
}

/// All tunable options of the treasure engine.
///
/// Field names double as the keys of the JSON configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasureConfig {
    /// Template of the treasure marker item
    pub marker_template: TemplateId,
    /// Location search attempts before giving up
    pub creation_tries: u32,
    /// World size is divided by this to get the unused border width
    pub border_padding_divisor: u32,
    /// Minimum Chebyshev distance between finder and treasure
    pub min_treasure_distance: u32,
    /// Maximum Chebyshev distance between finder and treasure
    pub max_treasure_distance: u32,
    /// Largest height spread tolerated in the 3x3 area around a treasure
    pub max_height_diff: i32,

    /// Skill check difficulty before any reductions
    pub base_difficulty: f64,
    /// Difficulty never drops below this
    pub min_difficulty: f64,

    /// "1 in N" marker chance per digging action
    pub digging_chance: i32,
    /// "1 in N" marker chance per mining action
    pub mining_chance: i32,
    /// "1 in N" marker chance per surface mining action
    pub surface_mining_chance: i32,
    /// "1 in N" marker chance per caught fish
    pub fishing_chance: i32,
    /// "1 in N" marker chance per qualifying kill
    pub hunting_chance: i32,
    /// "1 in N" marker chance per unique creature kill
    pub unique_chance: i32,
    /// Extra "1 in N" chance champions get on top of `hunting_chance`
    pub champion_bonus_chance: i32,
    /// Species that can carry a marker
    pub map_drops: Vec<CreatureKind>,

    /// Whether reading a marker wears it down
    pub wear_markers: bool,
    /// Scales the damage a single reading does
    pub wear_multiplier: f64,

    /// "1 in N" chance the rarity window is open at all
    pub rare_window: i32,
    /// "1 in N" chance for fantastic inside an open window
    pub fantastic_odds: i32,
    /// "1 in N" chance for supreme inside an open window
    pub supreme_odds: i32,
    /// "1 in N" chance for rare inside an open window
    pub rare_odds: i32,

    pub chest_template: TemplateId,
    pub lock_template: TemplateId,
    /// Percent chance a chest comes locked
    pub lock_chance: f64,
    /// Lock quality as a fraction of chest quality
    pub lock_multiplier: f64,

    pub base_money: u64,
    pub money_multiplier: f64,

    /// Liquid karma in grams before quality bonus
    pub base_karma: u32,
    pub karma_multiplier: f64,
    pub karma_container_template: TemplateId,
    pub karma_liquid_template: TemplateId,

    /// Precious metal in grams before quality bonus
    pub base_metal_weight: u32,
    pub metal_multiplier: f64,
    /// Weight multiplier for `discounted_metals`
    pub discount_multiplier: f64,
    pub metals: Vec<TemplateId>,
    pub discounted_metals: Vec<TemplateId>,

    pub base_sleep_powder: u32,
    pub sleep_powder_multiplier: f64,
    pub sleep_powder_template: TemplateId,

    /// Percent chance for a statue before quality bonus
    pub statue_chance: f64,
    pub statue_multiplier: f64,
    pub statue_template: TemplateId,
    pub statue_variants: Vec<u8>,

    /// Percent chance for a rare item before quality bonus
    pub rare_chance: f64,
    pub rare_multiplier: f64,
    pub rare_items: Vec<TemplateId>,
    pub unfinished_rares: Vec<TemplateId>,

    /// "1 in N" chance for a very rare item before quality reduction
    pub very_rare_chance: i32,
    pub very_rare_multiplier: i32,
    pub very_rares: Vec<TemplateId>,

    /// "1 in N" chance for an extremely rare item before quality reduction
    pub extremely_rare_chance: i32,
    pub extremely_rare_multiplier: i32,
    pub extremely_rares: Vec<TemplateId>,

    /// "1 in N" chance for an unfinished or kingdom item before quality reduction
    pub unfinished_chance: i32,
    pub unfinished_multiplier: i32,
    pub unfinished_items: Vec<TemplateId>,
    pub kingdom_items: Vec<TemplateId>,
    /// Kingdoms unfinished items may belong to; empty means the recipient's
    pub unfinished_kingdoms: Vec<KingdomId>,
    /// Generic placeholder template standing in for unfinished items
    pub unfinished_template: TemplateId,
    /// Weight in grams of an unfinished placeholder
    pub unfinished_weight: u32,
    /// Rare templates that carry a kingdom affiliation
    pub kingdom_affiliated_rares: Vec<TemplateId>,
    /// Templates that are always at least rare, wherever they come from
    pub min_rare_templates: Vec<TemplateId>,

    pub tier_rewards: Vec<TierReward>,
    pub reward_groups: Vec<Vec<TemplateId>>,

    pub spawn_groups: Vec<SpawnGroup>,
    pub tier_spawns: Vec<TierSpawn>,

    /// Materials considered wood; wooden rewards get a random one of these
    pub wood_materials: Vec<MaterialId>,
}

impl TreasureConfig {
    /// Creates a configuration with the stock option values.
    ///
    /// # Examples
    ///
    /// ```
    /// use trove::TreasureConfig;
    ///
    /// let config = TreasureConfig::new();
    /// assert_eq!(config.creation_tries, 1000);
    /// assert_eq!(config.tier_rewards.len(), 10);
    /// ```
    pub fn new() -> Self {
        Self {
            marker_template: 4200,
            creation_tries: 1000,
            border_padding_divisor: 20,
            min_treasure_distance: 0,
            max_treasure_distance: u32::MAX,
            max_height_diff: 72,

            base_difficulty: 30.0,
            min_difficulty: 4.0,

            digging_chance: 10000,
            mining_chance: 3500,
            surface_mining_chance: 10000,
            fishing_chance: 10000,
            hunting_chance: 100,
            unique_chance: 10000,
            champion_bonus_chance: 3,
            map_drops: vec![11, 23, 111],

            wear_markers: true,
            wear_multiplier: 100.0,

            rare_window: 180,
            fantastic_odds: 10000,
            supreme_odds: 100,
            rare_odds: 2,

            chest_template: 995,
            lock_template: 194,
            lock_chance: 100.0,
            lock_multiplier: 0.25,

            base_money: 10000,
            money_multiplier: 1.0,

            base_karma: 100,
            karma_multiplier: 9.0,
            karma_container_template: 189,
            karma_liquid_template: 763,

            base_metal_weight: 250,
            metal_multiplier: 1.0,
            discount_multiplier: 0.25,
            metals: vec![45, 44, 694, 698, 371, 372],
            discounted_metals: vec![371, 372],

            base_sleep_powder: 1,
            sleep_powder_multiplier: 1.0,
            sleep_powder_template: 666,

            statue_chance: 10.0,
            statue_multiplier: 9.0,
            statue_template: 742,
            statue_variants: (0..10).collect(),

            rare_chance: 10.0,
            rare_multiplier: 9.0,
            rare_items: vec![
                7, 25, 27, 24, 215, 62, 63, 64, 185, 77, 82, 83, 84, 85, 86, 3, 90, 87, 80, 21, 81,
                711, 710, 705, 707, 706, 97, 103, 104, 105, 107, 108, 106, 109, 110, 111, 112, 113,
                120, 114, 118, 116, 117, 119, 115, 276, 275, 274, 277, 278, 279, 282, 281, 280, 283,
                284, 285, 286, 287, 20, 139, 143, 93, 8, 135, 94, 152, 202, 296, 257, 259, 258, 267,
                268, 290, 292, 291, 314, 463, 75, 350, 351, 374, 376, 378, 380, 382, 388, 397, 390,
                392, 394, 396, 413, 749, 797, 447, 448, 449, 480, 581, 65, 621, 702, 703, 704, 624,
                623, 640, 642, 641, 643, 647, 774, 922,
            ],
            unfinished_rares: vec![
                384, 430, 528, 638, 850, 853, 539, 540, 541, 542, 543, 491, 490, 180, 178, 1023,
                1028, 226, 922,
            ],

            very_rare_chance: 10000,
            very_rare_multiplier: 1000,
            very_rares: vec![843, 299, 300, 654, 868, 781, 668, 664, 665, 655, 738, 967],

            extremely_rare_chance: 100000,
            extremely_rare_multiplier: 1000,
            extremely_rares: vec![
                806, 794, 795, 796, 797, 798, 809, 808, 807, 810, 799, 800, 801, 802, 803,
            ],

            unfinished_chance: 100,
            unfinished_multiplier: 5,
            unfinished_items: vec![384, 430, 528, 638, 850],
            kingdom_items: vec![579, 578, 831, 999],
            unfinished_kingdoms: vec![1, 2, 3, 4],
            unfinished_template: 179,
            unfinished_weight: 10000,
            kingdom_affiliated_rares: vec![384],
            min_rare_templates: vec![867],

            tier_rewards: default_tier_rewards(),
            reward_groups: vec![
                vec![7, 24, 25, 27, 20, 62],
                vec![97, 103, 104, 105, 106, 107],
                vec![274, 275, 276, 277, 278, 279],
                vec![80, 81, 82, 83, 84, 85, 86, 90],
                vec![867, 843, 654],
            ],

            spawn_groups: vec![
                SpawnGroup { weight: 1, creatures: vec![83, 84, 85] },
                SpawnGroup { weight: 3, creatures: vec![11, 23] },
                SpawnGroup { weight: 5, creatures: vec![111, 27] },
                SpawnGroup { weight: 10, creatures: vec![16, 59] },
            ],
            tier_spawns: (0..TIER_COUNT as i32)
                .map(|tier| TierSpawn { budget: 2 + tier * 2, ceiling: 1 + tier })
                .collect(),

            wood_materials: vec![
                14, 37, 38, 39, 40, 41, 42, 43, 44, 45, 63, 64, 65, 66, 46, 47, 48, 49, 50, 51,
            ],
        }
    }

    /// A configuration where every chance that can be certain is certain and
    /// no category depends on long candidate lists. Handy in tests.
    pub fn for_testing() -> Self {
        Self {
            creation_tries: 200,
            border_padding_divisor: 20,
            max_height_diff: 20,
            digging_chance: 1,
            mining_chance: 1,
            surface_mining_chance: 1,
            fishing_chance: 1,
            hunting_chance: 1,
            unique_chance: 1,
            rare_window: 1,
            lock_chance: 100.0,
            ..Self::new()
        }
    }

    /// Clamps every option into its valid range, logging each correction.
    pub fn normalized(mut self) -> Self {
        self.creation_tries = clamp_logged("creation_tries", self.creation_tries, 1, 1000);
        self.border_padding_divisor =
            clamp_logged("border_padding_divisor", self.border_padding_divisor, 3, 10_000);
        self.max_height_diff = clamp_logged("max_height_diff", self.max_height_diff, 20, i32::MAX);
        self.base_difficulty = clamp_logged("base_difficulty", self.base_difficulty, 4.0, 100.0);
        self.min_difficulty = clamp_logged("min_difficulty", self.min_difficulty, 0.0, 100.0);
        if self.min_treasure_distance > self.max_treasure_distance {
            warn!(
                "min_treasure_distance {} exceeds max_treasure_distance {}, swapping them",
                self.min_treasure_distance, self.max_treasure_distance
            );
            std::mem::swap(&mut self.min_treasure_distance, &mut self.max_treasure_distance);
        }

        for (name, value) in [
            ("digging_chance", &mut self.digging_chance),
            ("mining_chance", &mut self.mining_chance),
            ("surface_mining_chance", &mut self.surface_mining_chance),
            ("fishing_chance", &mut self.fishing_chance),
            ("hunting_chance", &mut self.hunting_chance),
            ("unique_chance", &mut self.unique_chance),
            ("champion_bonus_chance", &mut self.champion_bonus_chance),
            ("very_rare_chance", &mut self.very_rare_chance),
            ("extremely_rare_chance", &mut self.extremely_rare_chance),
            ("unfinished_chance", &mut self.unfinished_chance),
        ] {
            *value = clamp_logged(name, *value, 0, i32::MAX);
        }
        for (name, value) in [
            ("very_rare_multiplier", &mut self.very_rare_multiplier),
            ("extremely_rare_multiplier", &mut self.extremely_rare_multiplier),
            ("unfinished_multiplier", &mut self.unfinished_multiplier),
        ] {
            *value = clamp_logged(name, *value, 0, 238_609_294);
        }
        for (name, value) in [
            ("rare_window", &mut self.rare_window),
            ("fantastic_odds", &mut self.fantastic_odds),
            ("supreme_odds", &mut self.supreme_odds),
            ("rare_odds", &mut self.rare_odds),
        ] {
            *value = clamp_logged(name, *value, 1, i32::MAX);
        }

        self.wear_multiplier = clamp_logged("wear_multiplier", self.wear_multiplier, 1.0, 66_667.0);
        self.lock_chance = clamp_logged("lock_chance", self.lock_chance, 0.0, 100.0);
        self.lock_multiplier = clamp_logged("lock_multiplier", self.lock_multiplier, 0.01, 100.0);
        self.base_money = clamp_logged("base_money", self.base_money, 0, 1_000_000);
        self.money_multiplier = clamp_logged("money_multiplier", self.money_multiplier, 0.0, 100.0);
        self.base_karma = clamp_logged("base_karma", self.base_karma, 0, 45_000);
        self.karma_multiplier =
            clamp_logged("karma_multiplier", self.karma_multiplier, 0.0, 45_000.0);
        self.base_metal_weight =
            clamp_logged("base_metal_weight", self.base_metal_weight, 0, 1_000_000);
        self.metal_multiplier =
            clamp_logged("metal_multiplier", self.metal_multiplier, 0.0, 64_000.0);
        self.discount_multiplier =
            clamp_logged("discount_multiplier", self.discount_multiplier, 0.01, 100.0);
        self.base_sleep_powder = clamp_logged("base_sleep_powder", self.base_sleep_powder, 0, 100);
        self.sleep_powder_multiplier =
            clamp_logged("sleep_powder_multiplier", self.sleep_powder_multiplier, 0.0, 100.0);
        self.statue_chance = clamp_logged("statue_chance", self.statue_chance, 0.0, 100.0);
        self.statue_multiplier =
            clamp_logged("statue_multiplier", self.statue_multiplier, 0.0, 10_000.0);
        self.rare_chance = clamp_logged("rare_chance", self.rare_chance, 0.0, 100.0);
        self.rare_multiplier = clamp_logged("rare_multiplier", self.rare_multiplier, 0.0, 10_000.0);

        self
    }

    /// Reward table for a tier, if the configuration has one.
    pub fn tier_reward(&self, tier: usize) -> Option<&TierReward> {
        self.tier_rewards.get(tier)
    }

    /// Guardian budget for a tier, if the configuration has one.
    pub fn tier_spawn(&self, tier: usize) -> Option<&TierSpawn> {
        self.tier_spawns.get(tier)
    }

    /// Whether a material counts as wood.
    pub fn is_wood_material(&self, material: MaterialId) -> bool {
        self.wood_materials.contains(&material)
    }
}

impl Default for TreasureConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tier_rewards() -> Vec<TierReward> {
    (0..TIER_COUNT)
        .map(|tier| TierReward {
            guaranteed: 1 + tier as u32 / 3,
            optional: 2,
            optional_chance: (10 - tier as i32).max(2),
            groups: match tier {
                0..=2 => vec![0, 0, 1],
                3..=5 => vec![0, 1, 2],
                6..=8 => vec![1, 2, 3],
                _ => vec![2, 3, 3, 4],
            },
        })
        .collect()
}

fn clamp_logged<T>(name: &str, value: T, min: T, max: T) -> T
where
    T: PartialOrd + Copy + std::fmt::Debug,
{
    let clamped = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped != value {
        warn!("Option {} = {:?} is out of range, using {:?}", name, value, clamped);
    }
    clamped
}
