//! Rewards measured by weight or count: liquid karma, precious metal and
//! sleep powder.

use super::{scaled_amount, CategoryOutcome, RewardEngine, RewardEntry};
use crate::{Catalog, Rarity, RecipeBook, TroveError, TroveResult};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

/// A metal lump never weighs more than this many of its unit weight.
pub const METAL_STACK_LIMIT: i64 = 64;

/// Quality of every sleep powder and of the karma liquid.
pub const REAGENT_QUALITY: f64 = 99.0;

impl<'a, W> RewardEngine<'a, W>
where
    W: Catalog + RecipeBook + ?Sized,
{
    /// A barrel of liquid karma, capped by the barrel's volume.
    pub(super) fn karma<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let base = self.config.base_karma as i64;
        if base < 1 {
            return Ok(CategoryOutcome::Disabled);
        }

        let bonus = (quality * self.config.karma_multiplier).floor() as i64;
        let weight = scaled_amount(rng, base, bonus, quality);
        if weight <= 0 {
            info!("Liquid karma reward of {} grams is not worth a barrel", weight);
            return Ok(CategoryOutcome::NotAwarded);
        }

        let container = self.config.karma_container_template;
        let capacity = self
            .world
            .template(container)
            .ok_or(TroveError::UnknownTemplate(container))?
            .container_volume as i64;
        let weight = weight.min(capacity);
        if weight <= 0 {
            return Ok(CategoryOutcome::NotAwarded);
        }

        let barrel_rarity = self.roll_rarity(rng, Rarity::None);
        let barrel = self.make_item(container, quality, barrel_rarity, "karma_container_template", rng)?;
        let liquid = self
            .make_item(
                self.config.karma_liquid_template,
                REAGENT_QUALITY,
                Rarity::None,
                "karma_liquid_template",
                rng,
            )?
            .with_weight(weight as u32);
        debug!("Creating barrel with {} grams of liquid karma", weight);

        Ok(CategoryOutcome::Granted(vec![RewardEntry {
            item: barrel,
            contents: vec![liquid],
        }]))
    }

    /// One lump of a random precious metal.
    pub(super) fn precious_metal<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let base = self.config.base_metal_weight as i64;
        if base <= 0 {
            return Ok(CategoryOutcome::Disabled);
        }
        let Some(&template) = self.config.metals.choose(rng) else {
            return Ok(CategoryOutcome::Disabled);
        };

        let base_f = base as f64;
        let bonus = (quality / 10.0 * self.config.metal_multiplier * base_f - base_f).ceil() as i64;
        let mut weight = scaled_amount(rng, base, bonus, quality);
        if self.config.discounted_metals.contains(&template) {
            weight = (weight as f64 * self.config.discount_multiplier).ceil() as i64;
        }

        let unit = self
            .world
            .template(template)
            .ok_or(TroveError::UnknownTemplate(template))?
            .weight_grams as i64;
        let weight = weight.min(unit * METAL_STACK_LIMIT).clamp(0, u32::MAX as i64);
        if weight == 0 {
            return Ok(CategoryOutcome::NotAwarded);
        }

        let rarity = self.roll_rarity(rng, Rarity::None);
        let metal = self
            .make_item(template, quality, rarity, "metals", rng)?
            .with_weight(weight as u32);
        debug!("Creating {} grams of metal {}", weight, template);
        Ok(CategoryOutcome::Granted(vec![RewardEntry::single(metal)]))
    }

    /// A handful of sleep powders, one entry each.
    pub(super) fn sleep_powder<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let base = self.config.base_sleep_powder as i64;
        if base <= 0 {
            return Ok(CategoryOutcome::Disabled);
        }

        let base_f = base as f64;
        let bonus = (quality / 10.0 * self.config.sleep_powder_multiplier * base_f - base_f).ceil() as i64;
        let count = scaled_amount(rng, base, bonus, quality);
        if count <= 0 {
            return Ok(CategoryOutcome::NotAwarded);
        }

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let rarity = self.roll_rarity(rng, Rarity::None);
            let powder = self.make_item(
                self.config.sleep_powder_template,
                REAGENT_QUALITY,
                rarity,
                "sleep_powder_template",
                rng,
            )?;
            entries.push(RewardEntry::single(powder));
        }
        Ok(CategoryOutcome::Granted(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::create_rng;
    use crate::{GridWorld, TreasureConfig};

    fn granted(outcome: CategoryOutcome) -> Vec<RewardEntry> {
        match outcome {
            CategoryOutcome::Granted(entries) => entries,
            other => panic!("expected a grant, got {:?}", other),
        }
    }

    #[test]
    fn test_karma_barrel_holds_liquid() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig::new();
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(8);

        let entries = granted(engine.karma(50.0, &mut rng).unwrap());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item.template, 189);
        assert_eq!(entries[0].item.quality, 50.0);
        let liquid = &entries[0].contents[0];
        assert_eq!(liquid.template, 763);
        assert_eq!(liquid.quality, 99.0);
        // base 100 plus up to floor(50 * 9) - 1
        let weight = liquid.weight.unwrap();
        assert!((100..550).contains(&weight), "weight {}", weight);
    }

    #[test]
    fn test_karma_capped_by_barrel_volume() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig {
            base_karma: 45_000,
            ..TreasureConfig::new()
        };
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(8);
        let entries = granted(engine.karma(90.0, &mut rng).unwrap());
        assert_eq!(entries[0].contents[0].weight, Some(24_000));
    }

    #[test]
    fn test_dragon_scale_is_discounted_and_capped() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig {
            metals: vec![371],
            base_metal_weight: 30_000,
            ..TreasureConfig::new()
        };
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(8);
        let entries = granted(engine.precious_metal(100.0, &mut rng).unwrap());
        // Unit weight 100 grams, at most 64 of them.
        assert_eq!(entries[0].item.weight, Some(6_400));
    }

    #[test]
    fn test_metal_weight_in_range() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig {
            metals: vec![44],
            ..TreasureConfig::new()
        };
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(8);
        for _ in 0..50 {
            let entries = granted(engine.precious_metal(40.0, &mut rng).unwrap());
            // bonus = ceil(4 * 250 - 250) = 750
            let weight = entries[0].item.weight.unwrap();
            assert!((250..1000).contains(&weight), "weight {}", weight);
        }
        // Low quality falls back to a fraction of the base weight.
        let entries = granted(engine.precious_metal(5.0, &mut rng).unwrap());
        assert_eq!(entries[0].item.weight, Some(125));
    }

    #[test]
    fn test_sleep_powder_count() {
        let world = GridWorld::flat(8, 0, 1);
        let config = TreasureConfig {
            base_sleep_powder: 2,
            ..TreasureConfig::new()
        };
        let engine = RewardEngine::new(&config, &world);
        let mut rng = create_rng(8);
        // bonus = ceil(3 * 2 - 2) = 4, so 2 to 5 powders
        let entries = granted(engine.sleep_powder(30.0, &mut rng).unwrap());
        assert!((2..=5).contains(&entries.len()));
        assert!(entries.iter().all(|entry| entry.item.template == 666 && entry.item.quality == 99.0));
    }
}
