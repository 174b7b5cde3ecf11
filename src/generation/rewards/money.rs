//! Coin rewards.

use super::{CategoryOutcome, RewardEngine, RewardEntry};
use crate::{Catalog, Rarity, RecipeBook, TemplateId, TroveResult};
use log::info;
use rand::Rng;

/// Coin values and their templates, largest first.
pub const DENOMINATIONS: [(u64, TemplateId); 13] = [
    (20_000_000, 61),
    (5_000_000, 57),
    (1_000_000, 53),
    (200_000, 60),
    (50_000, 56),
    (10_000, 52),
    (2_000, 58),
    (500, 54),
    (100, 50),
    (50, 49),
    (20, 59),
    (5, 55),
    (1, 51),
];

/// Value of one coin of `template`, if it is a coin.
pub fn coin_value(template: TemplateId) -> Option<u64> {
    DENOMINATIONS
        .iter()
        .find(|(_, coin)| *coin == template)
        .map(|(value, _)| *value)
}

/// Splits an amount greedily into coins, largest first.
///
/// Returns `(template, count)` pairs for every denomination used; the values
/// always add up to `total` exactly.
///
/// # Examples
///
/// ```
/// use trove::decompose_money;
///
/// // One 20 coin, one 5 coin and two 1 coins.
/// assert_eq!(decompose_money(27), vec![(59, 1), (55, 1), (51, 2)]);
/// ```
pub fn decompose_money(total: u64) -> Vec<(TemplateId, u64)> {
    let mut remaining = total;
    let mut coins = Vec::new();
    for (value, template) in DENOMINATIONS {
        let count = remaining / value;
        if count > 0 {
            coins.push((template, count));
        }
        remaining %= value;
    }
    coins
}

impl<'a, W> RewardEngine<'a, W>
where
    W: Catalog + RecipeBook + ?Sized,
{
    pub(super) fn money<R: Rng + ?Sized>(&self, quality: f64, rng: &mut R) -> TroveResult<CategoryOutcome> {
        let base = self.config.base_money as f64;
        if base < 1.0 {
            return Ok(CategoryOutcome::Disabled);
        }

        let bonus = (base * (quality / 10.0 * self.config.money_multiplier)).round() - base;
        let total = base + (rng.gen::<f64>() * bonus).round();
        if total < 1.0 {
            info!("Money reward of {} including {:.2} bonus is below one coin", total, bonus);
            return Ok(CategoryOutcome::NotAwarded);
        }
        let total = total as u64;
        info!("Creating {} money as reward", total);

        let mut entries = Vec::new();
        for (template, count) in decompose_money(total) {
            for _ in 0..count {
                let coin_quality = rng.gen_range(0.0..100.0);
                let rarity = self.roll_rarity(rng, Rarity::None);
                let coin = self.make_item(template, coin_quality, rarity, "coins", rng)?;
                entries.push(RewardEntry::single(coin));
            }
        }
        Ok(CategoryOutcome::Granted(entries))
    }
}
