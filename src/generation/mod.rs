//! # Generation Module
//!
//! The randomized core of the treasure engine: where a treasure goes, how
//! good its marker is, what its chest holds and what guards it.
//!
//! Every generator borrows the configuration snapshot it runs against and
//! takes the random source as `&mut impl Rng`, so callers decide whether a
//! run is seeded and reproducible.

pub mod guards;
pub mod location;
pub mod materials;
pub mod quality;
pub mod rewards;

pub use guards::*;
pub use location::*;
pub use materials::*;
pub use quality::*;
pub use rewards::*;

use crate::constants::{MAX_QUALITY, MAX_TIER, MIN_QUALITY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Utility functions shared by the generators.
pub mod utils {
    use super::*;

    /// Creates a seeded random number generator.
    pub fn create_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Clamps a quality into the storable range.
    ///
    /// Non-finite input ends up at the lowest quality.
    pub fn clamp_quality(quality: f64) -> f64 {
        if quality.is_nan() {
            MIN_QUALITY
        } else {
            quality.clamp(MIN_QUALITY, MAX_QUALITY)
        }
    }

    /// Reward and spawn tier for a quality.
    ///
    /// # Examples
    ///
    /// ```
    /// use trove::utils::tier_for_quality;
    ///
    /// assert_eq!(tier_for_quality(0.0), 0);
    /// assert_eq!(tier_for_quality(55.0), 5);
    /// assert_eq!(tier_for_quality(100.0), 9);
    /// ```
    pub fn tier_for_quality(quality: f64) -> usize {
        if !(quality > 0.0) {
            return 0;
        }
        ((quality / 10.0).floor() as usize).min(MAX_TIER)
    }

    /// A "1 in N" draw. `N <= 0` never succeeds, `N == 1` always does.
    pub fn one_in<R: Rng + ?Sized>(rng: &mut R, n: i32) -> bool {
        n > 0 && rng.gen_range(0..n) == 0
    }

    /// A percent chance, where 100 or more always succeeds.
    pub fn percent_chance<R: Rng + ?Sized>(rng: &mut R, percent: f64) -> bool {
        percent > 0.0 && rng.gen::<f64>() * 100.0 < percent
    }
}
