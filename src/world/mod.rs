//! # World Module
//!
//! Everything Trove knows about the host world.
//!
//! Trove never owns terrain, items or creatures. The host hands the engine a
//! value implementing the collaborator traits below, and the engine calls back
//! into it for terrain queries, skill checks, template lookups and object
//! creation. [`GridWorld`] is an in-memory implementation used by the demo
//! binary and the tests.

pub mod grid;

pub use grid::*;

use crate::{SpawnRequest, TroveResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Numeric id of an item template in the host's template registry.
pub type TemplateId = i32;

/// Numeric id of a creature template in the host's creature registry.
pub type CreatureKind = i32;

/// Numeric id of an item material.
pub type MaterialId = u8;

/// Numeric id of a kingdom.
pub type KingdomId = u8;

/// Numeric id of a skill.
pub type SkillId = u16;

/// Unique identifier for host objects.
pub type EntityId = Uuid;

/// Creates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}

/// Represents a tile coordinate in the world.
///
/// # Examples
///
/// ```
/// use trove::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// assert_eq!(pos.neighborhood().len(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Chebyshev distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use trove::Position;
    ///
    /// let origin = Position::new(100, 100);
    /// assert_eq!(origin.chebyshev_distance(Position::new(100, 110)), 10);
    /// assert_eq!(origin.chebyshev_distance(Position::new(97, 102)), 3);
    /// ```
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        let (dx, dy) = self.offset_to(other);
        // Any two i32 coordinates differ by at most u32::MAX.
        dx.unsigned_abs().max(dy.unsigned_abs()) as u32
    }

    /// Calculates the Euclidean distance to another position.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let (dx, dy) = self.offset_to(other);
        (dx as f64).hypot(dy as f64)
    }

    /// Per-axis offset from this position to `other`, widened so that
    /// opposite ends of the coordinate range cannot overflow.
    pub fn offset_to(self, other: Position) -> (i64, i64) {
        (
            i64::from(other.x) - i64::from(self.x),
            i64::from(other.y) - i64::from(self.y),
        )
    }

    /// Returns the 3x3 block of tiles centred on this position, row by row.
    pub fn neighborhood(self) -> Vec<Position> {
        let mut tiles = Vec::with_capacity(9);
        for dy in -1..=1 {
            for dx in -1..=1 {
                tiles.push(Position::new(self.x.saturating_add(dx), self.y.saturating_add(dy)));
            }
        }
        tiles
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// Compass directions, with north towards decreasing `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use trove::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
            Direction::Northeast => Position::new(1, -1),
            Direction::Northwest => Position::new(-1, -1),
            Direction::Southeast => Position::new(1, 1),
            Direction::Southwest => Position::new(-1, 1),
        }
    }

    /// The eight-way compass direction from one tile towards another.
    ///
    /// Returns `None` when both positions are the same tile.
    pub fn towards(from: Position, to: Position) -> Option<Direction> {
        let (dx, dy) = from.offset_to(to);
        if dx == 0 && dy == 0 {
            return None;
        }

        // Screen coordinates: y grows southwards, so flip it for the angle.
        let angle = (-(dy as f64)).atan2(dx as f64).to_degrees();
        let sector = (((angle + 360.0 + 22.5) % 360.0) / 45.0) as u32;

        Some(match sector {
            0 => Direction::East,
            1 => Direction::Northeast,
            2 => Direction::North,
            3 => Direction::Northwest,
            4 => Direction::West,
            5 => Direction::Southwest,
            6 => Direction::South,
            _ => Direction::Southeast,
        })
    }

    /// Lower-case compass name, e.g. "north east".
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Northeast => "north east",
            Direction::Northwest => "north west",
            Direction::Southeast => "south east",
            Direction::Southwest => "south west",
        }
    }
}

/// Distinguishing mark on an item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rarity {
    #[default]
    None,
    Rare,
    Supreme,
    Fantastic,
}

impl Rarity {
    /// Numeric level, 0 (none) through 3 (fantastic).
    pub fn level(self) -> u8 {
        match self {
            Rarity::None => 0,
            Rarity::Rare => 1,
            Rarity::Supreme => 2,
            Rarity::Fantastic => 3,
        }
    }

    /// Rarity for a numeric level; levels above 3 saturate at fantastic.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Rarity::None,
            1 => Rarity::Rare,
            2 => Rarity::Supreme,
            _ => Rarity::Fantastic,
        }
    }
}

/// Surface type of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Grass,
    Dirt,
    Sand,
    Rock,
    Cliff,
    Water,
    Lava,
}

impl TileKind {
    /// Tiles nobody can dig a treasure out of.
    pub fn is_liquid(self) -> bool {
        matches!(self, TileKind::Water | TileKind::Lava)
    }
}

/// Handle to an item owned by the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemHandle(pub EntityId);

impl ItemHandle {
    /// Creates a fresh, unique handle.
    pub fn new() -> Self {
        Self(new_entity_id())
    }
}

impl Default for ItemHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item:{}", self.0)
    }
}

/// Handle to a creature owned by the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureHandle(pub EntityId);

impl CreatureHandle {
    /// Creates a fresh, unique handle.
    pub fn new() -> Self {
        Self(new_entity_id())
    }
}

impl Default for CreatureHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything needed to instantiate one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Template to instantiate
    pub template: TemplateId,
    /// Quality level, 0 to 100
    pub quality: f64,
    /// Distinguishing mark
    pub rarity: Rarity,
    /// Material, `None` keeps the template default
    pub material: Option<MaterialId>,
    /// Weight in grams, `None` keeps the template default
    pub weight: Option<u32>,
    /// Auxiliary byte (statue variant, kingdom affiliation)
    pub aux: Option<u8>,
    /// Display name override
    pub name: Option<String>,
    /// Item an unfinished placeholder stands for
    pub real_template: Option<TemplateId>,
}

impl ItemSpec {
    /// A plain item of the given template, quality and rarity.
    pub fn new(template: TemplateId, quality: f64, rarity: Rarity) -> Self {
        Self {
            template,
            quality,
            rarity,
            material: None,
            weight: None,
            aux: None,
            name: None,
            real_template: None,
        }
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_aux(mut self, aux: u8) -> Self {
        self.aux = Some(aux);
        self
    }
}

/// Static information about an item template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub name: String,
    /// Size word prefixed to the name, e.g. "large", may be empty
    pub size_prefix: String,
    /// Default material, 0 when unknown
    pub material: MaterialId,
    pub is_wood: bool,
    /// Weight of one unit in grams
    pub weight_grams: u32,
    /// Inner volume for containers, 0 otherwise
    pub container_volume: u32,
}

/// A crafting recipe as seen by material selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Template the recipe creates
    pub created: TemplateId,
    /// Primary input (the item used)
    pub source: TemplateId,
    /// Secondary input (the item worked on)
    pub target: TemplateId,
    /// Number of input items, including both primary inputs
    pub total_items: u32,
    /// Material the finished item ends up with, if the recipe fixes one
    pub final_material: Option<MaterialId>,
}

/// Terrain queries.
pub trait Terrain {
    /// World dimensions in tiles.
    fn world_size(&self) -> (u32, u32);

    /// Height and surface type of a tile.
    fn height_and_type(&self, x: i32, y: i32) -> (i32, TileKind);

    /// Whether a fixed structure (an altar, say) forbids digging here.
    fn is_obstacle_blocking(&self, x: i32, y: i32) -> bool;

    /// Whether the tile lies inside any settlement's perimeter.
    fn is_inside_settlement(&self, x: i32, y: i32) -> bool;
}

/// Item creation and ownership.
pub trait ItemFactory {
    /// Creates an item, returning the host's handle for it.
    fn instantiate_item(&mut self, spec: &ItemSpec) -> TroveResult<ItemHandle>;

    /// Moves an item into a container.
    fn insert_into(&mut self, container: ItemHandle, item: ItemHandle) -> TroveResult<()>;

    /// Removes an item (and anything inside it) from the world.
    fn destroy(&mut self, item: ItemHandle);

    /// Locks a container with a lock item.
    fn lock_with(&mut self, container: ItemHandle, lock: ItemHandle) -> TroveResult<()>;

    /// Puts an item on the ground at a tile.
    fn place_at(&mut self, item: ItemHandle, position: Position) -> TroveResult<()>;
}

/// Creature creation.
pub trait CreatureFactory {
    /// Spawns a creature, returning the host's handle for it.
    fn instantiate_creature(&mut self, request: &SpawnRequest) -> TroveResult<CreatureHandle>;

    /// Maximum age of a species, `None` if the species is unknown.
    fn max_age(&self, kind: CreatureKind) -> Option<u32>;
}

/// The host's skill check.
pub trait SkillCheck {
    /// Performance of a check against `difficulty` with `knowledge` skill,
    /// roughly -100 (abject failure) to 100.
    fn skill_check(&mut self, difficulty: f64, knowledge: f64) -> f64;
}

/// Item template registry.
pub trait Catalog {
    fn template(&self, id: TemplateId) -> Option<TemplateInfo>;
}

/// Crafting recipe graph.
pub trait RecipeBook {
    /// The recipe creating `id`, if any.
    fn recipe_for(&self, id: TemplateId) -> Option<Recipe>;

    /// Every simple recipe whose product is `id`.
    fn recipes_creating(&self, id: TemplateId) -> Vec<Recipe>;
}

/// Every collaborator the coordinator needs, bundled.
pub trait WorldServices:
    Terrain + ItemFactory + CreatureFactory + SkillCheck + Catalog + RecipeBook
{
}

impl<T> WorldServices for T where
    T: Terrain + ItemFactory + CreatureFactory + SkillCheck + Catalog + RecipeBook
{
}
