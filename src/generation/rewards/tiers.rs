//! Tiered item tables.

use super::{CategoryOutcome, RewardEngine, RewardEntry};
use crate::utils::{one_in, tier_for_quality};
use crate::{Catalog, ItemSpec, Rarity, RecipeBook, TroveResult};
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

impl<'a, W> RewardEngine<'a, W>
where
    W: Catalog + RecipeBook + ?Sized,
{
    /// Guaranteed picks plus chance-gated optional picks for the chest's tier.
    ///
    /// A pick that cannot be made is logged and skipped.
    pub(super) fn tier_items<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let tier = tier_for_quality(quality);
        let Some(table) = self.config.tier_reward(tier) else {
            warn!("No reward table for tier {}, is the configuration malformed?", tier);
            return Ok(CategoryOutcome::Disabled);
        };

        let mut entries = Vec::new();
        for _ in 0..table.guaranteed {
            match self.tier_pick(tier, quality, rng) {
                Some(item) => entries.push(RewardEntry::single(item)),
                None => warn!("Could not pick a guaranteed item for tier {}", tier),
            }
        }

        if table.optional > 0 && table.optional_chance <= 0 {
            warn!(
                "Optional item chance for tier {} is {}, expected more than zero",
                tier, table.optional_chance
            );
        } else {
            for _ in 0..table.optional {
                if !one_in(rng, table.optional_chance) {
                    continue;
                }
                match self.tier_pick(tier, quality, rng) {
                    Some(item) => entries.push(RewardEntry::single(item)),
                    None => warn!("Could not pick an optional item for tier {}", tier),
                }
            }
        }

        if entries.is_empty() {
            Ok(CategoryOutcome::NotAwarded)
        } else {
            Ok(CategoryOutcome::Granted(entries))
        }
    }

    /// One item from a random reward group of the tier.
    fn tier_pick<R: Rng + ?Sized>(&self, tier: usize, quality: f64, rng: &mut R) -> Option<ItemSpec> {
        let table = self.config.tier_reward(tier)?;
        let Some(&group_index) = table.groups.choose(rng) else {
            warn!("Tier {} has no reward groups", tier);
            return None;
        };
        let Some(group) = self.config.reward_groups.get(group_index) else {
            warn!("Tier {} names reward group {} which does not exist", tier, group_index);
            return None;
        };
        let Some(&template) = group.choose(rng) else {
            warn!("Reward group {} has no items", group_index);
            return None;
        };

        debug!("Picking {} from reward group {} for tier {}", template, group_index, tier);
        let rarity = self.roll_rarity(rng, Rarity::None);
        match self.make_item(template, quality, rarity, "reward_groups", rng) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping reward {} from group {}: {}", template, group_index, e);
                None
            }
        }
    }
}
