//! Markers, chests and the results handed back to callers.

use super::MarkerOrigin;
use crate::constants::MAX_DAMAGE;
use crate::quality::SkillNote;
use crate::utils::{clamp_quality, tier_for_quality};
use crate::{CreatureHandle, Direction, ItemHandle, Position, Rarity, RewardReport};
use serde::{Deserialize, Serialize};

/// A marker pointing at a hidden treasure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasureMarker {
    pub handle: ItemHandle,
    /// Tile the treasure is buried under
    pub location: Position,
    pub quality: f64,
    pub damage: f64,
    pub rarity: Rarity,
    pub origin: MarkerOrigin,
    pub skill_note: Option<SkillNote>,
}

impl TreasureMarker {
    /// Quality of the chest this marker leads to: each rarity level adds ten.
    ///
    /// # Examples
    ///
    /// ```
    /// use trove::{ItemHandle, MarkerOrigin, Position, Rarity, TreasureMarker};
    ///
    /// let marker = TreasureMarker {
    ///     handle: ItemHandle::new(),
    ///     location: Position::new(5, 5),
    ///     quality: 95.0,
    ///     damage: 0.0,
    ///     rarity: Rarity::Supreme,
    ///     origin: MarkerOrigin::Staff,
    ///     skill_note: None,
    /// };
    /// assert_eq!(marker.chest_quality(), 100.0);
    /// assert_eq!(marker.tier(), 9);
    /// ```
    pub fn chest_quality(&self) -> f64 {
        clamp_quality(self.quality + self.rarity.level() as f64 * 10.0)
    }

    pub fn tier(&self) -> usize {
        tier_for_quality(self.chest_quality())
    }

    pub fn is_destroyed(&self) -> bool {
        self.damage >= MAX_DAMAGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub handle: ItemHandle,
    pub quality: f64,
}

/// A materialized reward chest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasureChest {
    pub handle: ItemHandle,
    pub quality: f64,
    pub rarity: Rarity,
    /// Items actually created inside the chest
    pub contents: Vec<ItemHandle>,
    pub lock: Option<LockInfo>,
    pub report: RewardReport,
}

impl TreasureChest {
    pub fn tier(&self) -> usize {
        tier_for_quality(self.quality)
    }
}

/// What reading a marker tells the reader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerReading {
    /// Whole tiles to the treasure, rounded down
    pub distance: u32,
    /// `None` when the reader already stands on the spot
    pub direction: Option<Direction>,
    pub damage_taken: f64,
    /// The marker wore out and is gone
    pub destroyed: bool,
}

impl MarkerReading {
    /// A short sentence for the reader.
    pub fn describe(&self) -> String {
        match self.direction {
            None => "The treasure is right here.".to_string(),
            Some(direction) => format!(
                "The treasure is about {} tiles to the {}.",
                self.distance,
                direction.name()
            ),
        }
    }
}

/// Result of digging where a marker points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RedeemOutcome {
    /// The digger is not standing on the treasure tile
    WrongTile { distance: u32 },
    /// The marker is used up; `chest` is `None` when it could not be built
    Redeemed {
        chest: Option<TreasureChest>,
        guards: Vec<CreatureHandle>,
    },
}
