//! Treasure site search.
//!
//! Draws random tiles and rejects them until one is dry, flat enough and
//! unclaimed. The number of attempts is capped, so the search always ends.

use crate::{Position, Terrain, TreasureConfig};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Where the finder stands
    pub origin: Position,
    pub min_distance: u32,
    pub max_distance: u32,
    /// Attempts shared by every rejection reason, at least 1
    pub max_tries: u32,
    /// World size is divided by this to get the border padding
    pub padding_divisor: u32,
}

impl SearchRequest {
    /// A search around `origin` using the configured limits.
    pub fn from_config(origin: Position, config: &TreasureConfig) -> Self {
        Self {
            origin,
            min_distance: config.min_treasure_distance,
            max_distance: config.max_treasure_distance,
            max_tries: config.creation_tries,
            padding_divisor: config.border_padding_divisor,
        }
    }
}

/// Why candidates were thrown away, per reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionTally {
    pub distance: u32,
    pub water: u32,
    pub height: u32,
    pub altar: u32,
    pub village: u32,
    /// Total attempts made
    pub tries: u32,
}

impl fmt::Display for RejectionTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Distance={}, Water={}, Height={}, Altar={}, Village={}",
            self.distance, self.water, self.height, self.altar, self.village
        )
    }
}

/// A search that ran out of attempts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no suitable treasure site after {} tries ({})", .tally.tries, .tally)]
pub struct SearchFailure {
    pub tally: RejectionTally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Water,
    Height,
    Altar,
    Village,
}

/// Rejection-sampling site finder.
#[derive(Debug, Clone, Copy)]
pub struct LocationFinder {
    max_height_diff: i32,
}

impl LocationFinder {
    pub fn new(config: &TreasureConfig) -> Self {
        Self {
            max_height_diff: config.max_height_diff,
        }
    }

    /// Finds a treasure site, or reports why every attempt failed.
    pub fn find<T, R>(
        &self,
        terrain: &T,
        request: &SearchRequest,
        rng: &mut R,
    ) -> Result<Position, SearchFailure>
    where
        T: Terrain + ?Sized,
        R: Rng + ?Sized,
    {
        let mut tally = RejectionTally::default();
        let max_tries = request.max_tries.max(1);
        let (width, height) = terrain.world_size();
        let divisor = request.padding_divisor.max(1);
        let (x_range, y_range) = match (
            padded_range(width, divisor),
            padded_range(height, divisor),
        ) {
            (Some(x_range), Some(y_range)) => (x_range, y_range),
            _ => {
                debug!("World {}x{} has no room for a treasure after padding", width, height);
                return Err(SearchFailure { tally });
            }
        };

        while tally.tries < max_tries {
            tally.tries += 1;
            let candidate = Position::new(
                rng.gen_range(x_range.0..x_range.1),
                rng.gen_range(y_range.0..y_range.1),
            );

            let distance = request.origin.chebyshev_distance(candidate);
            if distance < request.min_distance || distance > request.max_distance {
                tally.distance += 1;
                continue;
            }

            match self.inspect(terrain, candidate) {
                Some(Rejection::Water) => tally.water += 1,
                Some(Rejection::Height) => tally.height += 1,
                Some(Rejection::Altar) => tally.altar += 1,
                Some(Rejection::Village) => tally.village += 1,
                None => {
                    debug!("Treasure site {} found after {} tries", candidate, tally.tries);
                    return Ok(candidate);
                }
            }
        }

        info!("No suitable treasure site after {} tries. Failing at {}.", tally.tries, tally);
        Err(SearchFailure { tally })
    }

    /// Whether a tile could hold a treasure, checking its 3x3 block.
    pub fn is_suitable<T: Terrain + ?Sized>(&self, terrain: &T, position: Position) -> bool {
        self.inspect(terrain, position).is_none()
    }

    fn inspect<T: Terrain + ?Sized>(&self, terrain: &T, position: Position) -> Option<Rejection> {
        let mut lowest = i32::MAX;
        let mut highest = i32::MIN;
        for tile in position.neighborhood() {
            let (height, kind) = terrain.height_and_type(tile.x, tile.y);
            if kind.is_liquid() || height < 0 {
                return Some(Rejection::Water);
            }
            lowest = lowest.min(height);
            highest = highest.max(height);
        }

        if highest.saturating_sub(lowest) > self.max_height_diff {
            Some(Rejection::Height)
        } else if terrain.is_obstacle_blocking(position.x, position.y) {
            Some(Rejection::Altar)
        } else if terrain.is_inside_settlement(position.x, position.y) {
            Some(Rejection::Village)
        } else {
            None
        }
    }
}

fn padded_range(size: u32, divisor: u32) -> Option<(i32, i32)> {
    let size = size.min(i32::MAX as u32) as i32;
    let padding = size / divisor as i32;
    let (low, high) = (padding, size - padding);
    (low < high).then_some((low, high))
}
