//! Chance-gated single item rewards: statues, rare, very rare and extremely
//! rare items, and unfinished or kingdom items.

use super::{CategoryOutcome, Recipient, RewardEngine, RewardEntry};
use crate::generation::materials::select_material;
use crate::utils::{one_in, percent_chance};
use crate::{
    Catalog, ItemSpec, KingdomId, Rarity, RecipeBook, TemplateId, TroveError, TroveResult,
};
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

/// Percent chance with a quality bonus; a non-positive multiplier adds nothing.
fn boosted_percent(chance: f64, multiplier: f64, quality: f64) -> f64 {
    if multiplier > 0.0 {
        chance + quality / 10.0 * multiplier
    } else {
        chance
    }
}

impl<'a, W> RewardEngine<'a, W>
where
    W: Catalog + RecipeBook + ?Sized,
{
    pub(super) fn statue<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let config = self.config;
        if config.statue_chance <= 0.0 {
            return Ok(CategoryOutcome::Disabled);
        }
        let chance = boosted_percent(config.statue_chance, config.statue_multiplier, quality);
        if !percent_chance(rng, chance) {
            return Ok(CategoryOutcome::NotAwarded);
        }

        let variant = config.statue_variants.choose(rng).copied().unwrap_or(0);
        let rarity = self.roll_rarity(rng, Rarity::None);
        let statue = self
            .make_item(config.statue_template, quality, rarity, "statue_template", rng)?
            .with_aux(variant);
        Ok(CategoryOutcome::Granted(vec![RewardEntry::single(statue)]))
    }

    /// A guaranteed-rare item; one index spans unfinished rares, then rares.
    pub(super) fn rare_item<R: Rng + ?Sized>(
        &self,
        quality: f64,
        recipient: &Recipient,
        rng: &mut R,
    ) -> TroveResult<CategoryOutcome> {
        let config = self.config;
        let (unfinished, finished) = (&config.unfinished_rares, &config.rare_items);
        if (unfinished.is_empty() && finished.is_empty()) || config.rare_chance <= 0.0 {
            return Ok(CategoryOutcome::Disabled);
        }
        let chance = boosted_percent(config.rare_chance, config.rare_multiplier, quality);
        if !percent_chance(rng, chance) {
            return Ok(CategoryOutcome::NotAwarded);
        }

        let index = rng.gen_range(0..unfinished.len() + finished.len());
        let rarity = self.roll_rarity(rng, Rarity::Rare);
        let item = match unfinished.get(index) {
            Some(&real) => {
                let mut placeholder =
                    self.unfinished_placeholder(real, quality, rarity, "unfinished_rares", rng)?;
                if config.kingdom_affiliated_rares.contains(&real) {
                    let kingdom = self.kingdom_for(recipient, rng);
                    info!("Rare item {} belongs to kingdom {}", real, kingdom);
                    placeholder = placeholder.with_aux(kingdom);
                }
                placeholder
            }
            None => {
                let template = finished
                    .get(index - unfinished.len())
                    .copied()
                    .ok_or_else(|| TroveError::GenerationFailed(format!("rare index {} out of range", index)))?;
                self.make_item(template, quality, rarity, "rare_items", rng)?
            }
        };
        Ok(CategoryOutcome::Granted(vec![RewardEntry::single(item)]))
    }

    pub(super) fn very_rare_item<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let config = self.config;
        self.long_odds_item(
            &config.very_rares,
            config.very_rare_chance,
            config.very_rare_multiplier,
            "very_rares",
            quality,
            rng,
        )
    }

    pub(super) fn extremely_rare_item<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let config = self.config;
        self.long_odds_item(
            &config.extremely_rares,
            config.extremely_rare_chance,
            config.extremely_rare_multiplier,
            "extremely_rares",
            quality,
            rng,
        )
    }

    fn long_odds_item<R: Rng + ?Sized>(
        &self,
        candidates: &[TemplateId],
        chance: i32,
        multiplier: i32,
        source_list: &'static str,
        quality: f64,
        rng: &mut R,
    ) -> TroveResult<CategoryOutcome> {
        if candidates.is_empty() || chance <= 0 {
            return Ok(CategoryOutcome::Disabled);
        }
        let reduction = (quality / 10.0 * multiplier as f64).round() as i64;
        let odds = (chance as i64 - reduction).max(1) as i32;
        if !one_in(rng, odds) {
            return Ok(CategoryOutcome::NotAwarded);
        }

        let Some(&template) = candidates.choose(rng) else {
            return Ok(CategoryOutcome::NotAwarded);
        };
        let rarity = self.roll_rarity(rng, Rarity::Rare);
        let item = self.make_item(template, quality, rarity, source_list, rng)?;
        info!("Awarding {} item {} at 1 in {} odds", source_list, template, odds);
        Ok(CategoryOutcome::Granted(vec![RewardEntry::single(item)]))
    }

    /// An unfinished structure or a kingdom item, tagged with a kingdom.
    pub(super) fn unfinished_item<R: Rng + ?Sized>(
        &self,
        quality: f64,
        recipient: &Recipient,
        rng: &mut R,
    ) -> TroveResult<CategoryOutcome> {
        let config = self.config;
        let (unfinished, kingdom_items) = (&config.unfinished_items, &config.kingdom_items);
        if config.unfinished_chance < 1 || (unfinished.is_empty() && kingdom_items.is_empty()) {
            return Ok(CategoryOutcome::Disabled);
        }
        let reduction = (quality / 10.0 * config.unfinished_multiplier as f64).floor() as i64;
        let odds = (config.unfinished_chance as i64 - reduction).max(1) as i32;
        if !one_in(rng, odds) {
            return Ok(CategoryOutcome::NotAwarded);
        }

        let index = rng.gen_range(0..unfinished.len() + kingdom_items.len());
        let rarity = self.roll_rarity(rng, Rarity::None);
        let item = match unfinished.get(index) {
            Some(&real) => self.unfinished_placeholder(real, quality, rarity, "unfinished_items", rng)?,
            None => {
                let template = kingdom_items
                    .get(index - unfinished.len())
                    .copied()
                    .ok_or_else(|| TroveError::GenerationFailed(format!("kingdom item index {} out of range", index)))?;
                self.make_item(template, quality, rarity, "kingdom_items", rng)?
            }
        };
        let kingdom = self.kingdom_for(recipient, rng);
        info!("Unfinished reward {} gets kingdom {}", item.real_template.unwrap_or(item.template), kingdom);
        Ok(CategoryOutcome::Granted(vec![RewardEntry::single(item.with_aux(kingdom))]))
    }

    /// The generic unfinished item standing in for `real`.
    fn unfinished_placeholder<R: Rng + ?Sized>(
        &self,
        real: TemplateId,
        quality: f64,
        rarity: Rarity,
        source_list: &'static str,
        rng: &mut R,
    ) -> TroveResult<ItemSpec> {
        if real <= 0 {
            return Err(TroveError::InvalidTemplate { id: real, source_list });
        }
        let info = self.world.template(real).ok_or(TroveError::UnknownTemplate(real))?;
        let mut placeholder =
            self.make_item(self.config.unfinished_template, quality, rarity, "unfinished_template", rng)?;

        placeholder.material = Some(select_material(self.world, self.config, real, rng));
        placeholder.weight = Some(self.config.unfinished_weight);
        placeholder.real_template = Some(real);
        placeholder.name = Some(if info.size_prefix.is_empty() {
            format!("unfinished {}", info.name)
        } else {
            format!("unfinished {} {}", info.size_prefix, info.name)
        });
        Ok(placeholder)
    }

    /// A configured kingdom, or the recipient's when none is configured.
    fn kingdom_for<R: Rng + ?Sized>(&self, recipient: &Recipient, rng: &mut R) -> KingdomId {
        match self.config.unfinished_kingdoms.choose(rng) {
            Some(&kingdom) if kingdom != 0 => kingdom,
            _ => recipient.kingdom,
        }
    }
}
