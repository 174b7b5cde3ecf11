//! # Reward Engine
//!
//! Fills a treasure chest. Every reward category is an independent trial run
//! against the chest quality; a category that breaks is recorded in the
//! report's diagnostics and the others carry on.

pub mod bulk;
pub mod money;
pub mod rare;
pub mod tiers;

pub use money::*;

use crate::generation::materials::select_material;
use crate::utils::clamp_quality;
use crate::{
    Catalog, ItemSpec, KingdomId, Rarity, RarityRoller, RecipeBook, TemplateId, TreasureConfig,
    TroveError, TroveResult,
};
use log::{debug, error, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One item to put in the chest, possibly a container with items of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub item: ItemSpec,
    pub contents: Vec<ItemSpec>,
}

impl RewardEntry {
    pub fn single(item: ItemSpec) -> Self {
        Self {
            item,
            contents: Vec::new(),
        }
    }
}

/// The player a chest is generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub kingdom: KingdomId,
}

/// Reward categories, in the order a chest is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardCategory {
    Money,
    SleepPowder,
    PreciousMetal,
    Statue,
    Rare,
    VeryRare,
    ExtremelyRare,
    Unfinished,
    Tiered,
    Karma,
}

impl RewardCategory {
    pub const ALL: [RewardCategory; 10] = [
        RewardCategory::Money,
        RewardCategory::SleepPowder,
        RewardCategory::PreciousMetal,
        RewardCategory::Statue,
        RewardCategory::Rare,
        RewardCategory::VeryRare,
        RewardCategory::ExtremelyRare,
        RewardCategory::Unfinished,
        RewardCategory::Tiered,
        RewardCategory::Karma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RewardCategory::Money => "money",
            RewardCategory::SleepPowder => "sleep powder",
            RewardCategory::PreciousMetal => "precious metal",
            RewardCategory::Statue => "statue",
            RewardCategory::Rare => "rare item",
            RewardCategory::VeryRare => "very rare item",
            RewardCategory::ExtremelyRare => "extremely rare item",
            RewardCategory::Unfinished => "unfinished item",
            RewardCategory::Tiered => "tier items",
            RewardCategory::Karma => "liquid karma",
        }
    }
}

impl fmt::Display for RewardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one category trial produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CategoryOutcome {
    Granted(Vec<RewardEntry>),
    /// The trial ran and lost
    NotAwarded,
    /// Configuration turns the category off
    Disabled,
    Failed(String),
}

/// Per-category summary kept in a [`RewardReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryStatus {
    Granted(usize),
    NotAwarded,
    Disabled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDiagnostic {
    pub category: RewardCategory,
    pub status: CategoryStatus,
}

/// Everything a chest gets, plus how each category went.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardReport {
    pub entries: Vec<RewardEntry>,
    pub diagnostics: Vec<CategoryDiagnostic>,
}

impl RewardReport {
    pub fn status(&self, category: RewardCategory) -> Option<&CategoryStatus> {
        self.diagnostics
            .iter()
            .find(|diagnostic| diagnostic.category == category)
            .map(|diagnostic| &diagnostic.status)
    }

    /// Categories that failed, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (RewardCategory, &str)> {
        self.diagnostics.iter().filter_map(|diagnostic| match &diagnostic.status {
            CategoryStatus::Failed(reason) => Some((diagnostic.category, reason.as_str())),
            _ => None,
        })
    }

    /// Total value of the coins among the entries.
    pub fn money_total(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|entry| coin_value(entry.item.template))
            .sum()
    }
}

/// Runs reward category trials against one configuration snapshot.
pub struct RewardEngine<'a, W: ?Sized> {
    config: &'a TreasureConfig,
    world: &'a W,
    rarity: RarityRoller,
}

impl<'a, W> RewardEngine<'a, W>
where
    W: Catalog + RecipeBook + ?Sized,
{
    pub fn new(config: &'a TreasureConfig, world: &'a W) -> Self {
        Self {
            config,
            world,
            rarity: RarityRoller::new(config),
        }
    }

    /// Rolls every category for a chest of `quality`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        quality: f64,
        recipient: &Recipient,
        rng: &mut R,
    ) -> RewardReport {
        let quality = clamp_quality(quality);
        let mut report = RewardReport::default();

        for category in RewardCategory::ALL {
            let outcome = self.run_category(category, quality, recipient, rng);
            let status = match outcome {
                CategoryOutcome::Granted(entries) => {
                    debug!("{} granted {} entries", category, entries.len());
                    let count = entries.len();
                    report.entries.extend(entries);
                    CategoryStatus::Granted(count)
                }
                CategoryOutcome::NotAwarded => CategoryStatus::NotAwarded,
                CategoryOutcome::Disabled => CategoryStatus::Disabled,
                CategoryOutcome::Failed(reason) => CategoryStatus::Failed(reason),
            };
            report.diagnostics.push(CategoryDiagnostic { category, status });
        }

        info!(
            "Generated {} reward entries for quality {:.2}",
            report.entries.len(),
            quality
        );
        report
    }

    /// Runs a single category trial.
    pub fn run_category<R: Rng + ?Sized>(
        &self,
        category: RewardCategory,
        quality: f64,
        recipient: &Recipient,
        rng: &mut R,
    ) -> CategoryOutcome {
        let result = match category {
            RewardCategory::Money => self.money(quality, rng),
            RewardCategory::SleepPowder => self.sleep_powder(quality, rng),
            RewardCategory::PreciousMetal => self.precious_metal(quality, rng),
            RewardCategory::Statue => self.statue(quality, rng),
            RewardCategory::Rare => self.rare_item(quality, recipient, rng),
            RewardCategory::VeryRare => self.very_rare_item(quality, rng),
            RewardCategory::ExtremelyRare => self.extremely_rare_item(quality, rng),
            RewardCategory::Unfinished => self.unfinished_item(quality, recipient, rng),
            RewardCategory::Tiered => self.tier_items(quality, rng),
            RewardCategory::Karma => self.karma(quality, rng),
        };

        result.unwrap_or_else(|e| {
            error!("Could not generate {} reward: {}", category, e);
            CategoryOutcome::Failed(e.to_string())
        })
    }

    /// Builds an item spec for a catalog template, choosing its material.
    ///
    /// `source_list` names the option the id came from, for error messages.
    fn make_item<R: Rng + ?Sized>(
        &self,
        template: TemplateId,
        quality: f64,
        rarity: Rarity,
        source_list: &'static str,
        rng: &mut R,
    ) -> TroveResult<ItemSpec> {
        if template <= 0 {
            return Err(TroveError::InvalidTemplate {
                id: template,
                source_list,
            });
        }
        if self.world.template(template).is_none() {
            return Err(TroveError::UnknownTemplate(template));
        }

        let rarity = if self.config.min_rare_templates.contains(&template) {
            rarity.max(Rarity::Rare)
        } else {
            rarity
        };
        let material = select_material(self.world, self.config, template, rng);
        Ok(ItemSpec::new(template, quality, rarity).with_material(material))
    }

    fn roll_rarity<R: Rng + ?Sized>(&self, rng: &mut R, guaranteed: Rarity) -> Rarity {
        self.rarity.roll(rng, guaranteed)
    }
}

/// Amount for quantity-style rewards: `base` plus a random share of the
/// quality bonus, or a quality fraction of `base` when there is no bonus.
pub(crate) fn scaled_amount<R: Rng + ?Sized>(rng: &mut R, base: i64, bonus: i64, quality: f64) -> i64 {
    if bonus > 0 {
        base + rng.gen_range(0..bonus)
    } else {
        (quality / 10.0 * base as f64).ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::create_rng;
    use crate::GridWorld;

    #[test]
    fn test_every_category_reports_once_in_order() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig::new();
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(4);

        let report = engine.generate(50.0, &Recipient::default(), &mut rng);
        let categories: Vec<RewardCategory> =
            report.diagnostics.iter().map(|diagnostic| diagnostic.category).collect();
        assert_eq!(categories, RewardCategory::ALL.to_vec());
    }

    #[test]
    fn test_disabled_categories() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig {
            base_money: 0,
            base_karma: 0,
            metals: Vec::new(),
            base_sleep_powder: 0,
            statue_chance: 0.0,
            rare_chance: 0.0,
            very_rare_chance: 0,
            extremely_rares: Vec::new(),
            unfinished_chance: 0,
            ..TreasureConfig::new()
        };
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(4);

        let report = engine.generate(80.0, &Recipient::default(), &mut rng);
        for category in RewardCategory::ALL {
            if category != RewardCategory::Tiered {
                assert_eq!(report.status(category), Some(&CategoryStatus::Disabled), "{}", category);
            }
        }
    }

    #[test]
    fn test_broken_category_does_not_stop_the_rest() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig {
            statue_chance: 100.0,
            statue_template: 31337,
            ..TreasureConfig::new()
        };
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(4);

        let report = engine.generate(60.0, &Recipient::default(), &mut rng);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, RewardCategory::Statue);
        assert!(matches!(report.status(RewardCategory::Money), Some(CategoryStatus::Granted(_))));
        assert!(report.money_total() >= 10000);
    }

    #[test]
    fn test_min_rare_templates_are_at_least_rare() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig::new();
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(4);
        let bone = engine.make_item(867, 50.0, Rarity::None, "test", &mut rng).unwrap();
        assert_eq!(bone.rarity, Rarity::Rare);
        assert!(matches!(
            engine.make_item(0, 50.0, Rarity::None, "test", &mut rng),
            Err(TroveError::InvalidTemplate { id: 0, .. })
        ));
    }

    #[test]
    fn test_scaled_amount() {
        let mut rng = create_rng(4);
        for _ in 0..100 {
            let amount = scaled_amount(&mut rng, 250, 1000, 50.0);
            assert!((250..1250).contains(&amount));
        }
        assert_eq!(scaled_amount(&mut rng, 250, 0, 5.0), 125);
        assert_eq!(scaled_amount(&mut rng, 250, -10, 0.0), 0);
    }
}
