//! In-memory reference world.
//!
//! [`GridWorld`] implements every collaborator trait on top of plain vectors
//! and hash maps. It backs the demo binary and the test suite; real hosts
//! implement the traits against their own world.

use super::*;
use crate::{SpawnRequest, TreasureConfig, TroveError};
use log::debug;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

/// Stock material ids used by the built-in catalog.
pub mod stock {
    use crate::MaterialId;

    pub const IRON: MaterialId = 11;
    pub const GOLD: MaterialId = 7;
    pub const SILVER: MaterialId = 8;
    pub const STONE: MaterialId = 15;
    pub const WOOD: MaterialId = 14;
    pub const BIRCH: MaterialId = 37;
    pub const LEATHER: MaterialId = 16;
}

/// An item as the grid world stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub spec: ItemSpec,
    pub contents: Vec<ItemHandle>,
    pub lock: Option<ItemHandle>,
    pub container: Option<ItemHandle>,
    pub position: Option<Position>,
}

/// Axis-aligned settlement perimeter, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub top_left: Position,
    pub bottom_right: Position,
}

impl Settlement {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.top_left.x && x <= self.bottom_right.x && y >= self.top_left.y && y <= self.bottom_right.y
    }
}

/// Tile grid plus item, creature, template and recipe stores.
#[derive(Debug, Clone)]
pub struct GridWorld {
    width: u32,
    height: u32,
    heights: Vec<i32>,
    tiles: Vec<TileKind>,
    obstacles: HashSet<Position>,
    settlements: Vec<Settlement>,
    templates: HashMap<TemplateId, TemplateInfo>,
    recipes: Vec<Recipe>,
    max_ages: HashMap<CreatureKind, u32>,
    items: HashMap<ItemHandle, StoredItem>,
    creatures: HashMap<CreatureHandle, SpawnRequest>,
    refused_templates: HashSet<TemplateId>,
    skill_rng: StdRng,
    fixed_skill: Option<f64>,
}

impl GridWorld {
    /// A flat grass world where every tile has the same height.
    ///
    /// # Examples
    ///
    /// ```
    /// use trove::{GridWorld, Terrain, TileKind};
    ///
    /// let world = GridWorld::flat(64, 10, 7);
    /// assert_eq!(world.world_size(), (64, 64));
    /// assert_eq!(world.height_and_type(3, 3), (10, TileKind::Grass));
    /// ```
    pub fn flat(size: u32, height: i32, seed: u64) -> Self {
        let tile_count = (size as usize) * (size as usize);
        let mut world = Self {
            width: size,
            height: size,
            heights: vec![height; tile_count],
            tiles: vec![TileKind::Grass; tile_count],
            obstacles: HashSet::new(),
            settlements: Vec::new(),
            templates: HashMap::new(),
            recipes: Vec::new(),
            max_ages: HashMap::new(),
            items: HashMap::new(),
            creatures: HashMap::new(),
            refused_templates: HashSet::new(),
            skill_rng: StdRng::seed_from_u64(seed),
            fixed_skill: None,
        };
        world.install_stock_catalog();
        world
    }

    /// A world with Perlin-noise terrain, lakes, lava pockets, a few
    /// settlements and scattered altars.
    pub fn generate(seed: u64, size: u32) -> Self {
        let mut world = Self::flat(size, 0, seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let relief = Perlin::new(seed as u32);
        let magma = Perlin::new(seed.wrapping_add(1) as u32);

        for y in 0..size as i32 {
            for x in 0..size as i32 {
                let (nx, ny) = (x as f64 / 48.0, y as f64 / 48.0);
                let height = (relief.get([nx, ny]) * 400.0) as i32;
                let kind = if magma.get([nx * 2.0, ny * 2.0]) > 0.55 {
                    TileKind::Lava
                } else if height < 0 {
                    TileKind::Water
                } else if height < 15 {
                    TileKind::Sand
                } else if height < 180 {
                    TileKind::Grass
                } else if height < 300 {
                    TileKind::Rock
                } else {
                    TileKind::Cliff
                };
                world.set_height(Position::new(x, y), height);
                world.set_tile(Position::new(x, y), kind);
            }
        }

        let side = size as i32;
        if side > 16 {
            for _ in 0..(size / 64).max(1) {
                let x = rng.gen_range(0..side - 8);
                let y = rng.gen_range(0..side - 8);
                let extent = rng.gen_range(4..8);
                world.add_settlement(
                    Position::new(x, y),
                    Position::new((x + extent).min(side - 1), (y + extent).min(side - 1)),
                );
            }
            for _ in 0..(size / 16).max(1) {
                let altar = Position::new(rng.gen_range(0..side), rng.gen_range(0..side));
                world.add_obstacle(altar);
            }
        }

        debug!(
            "Generated {}x{} world with {} settlements and {} altars",
            size,
            size,
            world.settlements.len(),
            world.obstacles.len()
        );
        world
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        self.index(position.x, position.y).is_some()
    }

    pub fn set_tile(&mut self, position: Position, kind: TileKind) {
        if let Some(index) = self.index(position.x, position.y) {
            self.tiles[index] = kind;
        }
    }

    pub fn set_height(&mut self, position: Position, height: i32) {
        if let Some(index) = self.index(position.x, position.y) {
            self.heights[index] = height;
        }
    }

    pub fn add_obstacle(&mut self, position: Position) {
        self.obstacles.insert(position);
    }

    pub fn add_settlement(&mut self, top_left: Position, bottom_right: Position) {
        self.settlements.push(Settlement { top_left, bottom_right });
    }

    pub fn register_template(&mut self, info: TemplateInfo) {
        self.templates.insert(info.id, info);
    }

    pub fn add_recipe(&mut self, recipe: Recipe) {
        self.recipes.push(recipe);
    }

    pub fn set_max_age(&mut self, kind: CreatureKind, age: u32) {
        self.max_ages.insert(kind, age);
    }

    /// Makes every future `instantiate_item` for `template` fail.
    pub fn refuse_template(&mut self, template: TemplateId) {
        self.refused_templates.insert(template);
    }

    /// Pins every skill check to one result; `None` restores random checks.
    pub fn set_fixed_skill(&mut self, result: Option<f64>) {
        self.fixed_skill = result;
    }

    pub fn item(&self, handle: ItemHandle) -> Option<&StoredItem> {
        self.items.get(&handle)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items lying directly on a tile.
    pub fn items_at(&self, position: Position) -> Vec<ItemHandle> {
        self.items
            .iter()
            .filter(|(_, item)| item.position == Some(position))
            .map(|(handle, _)| *handle)
            .collect()
    }

    pub fn creature(&self, handle: CreatureHandle) -> Option<&SpawnRequest> {
        self.creatures.get(&handle)
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    pub fn creatures(&self) -> impl Iterator<Item = &SpawnRequest> {
        self.creatures.values()
    }

    fn install_stock_catalog(&mut self) {
        let defaults = TreasureConfig::new();
        let mut generic: Vec<TemplateId> = Vec::new();
        generic.extend(&defaults.rare_items);
        generic.extend(&defaults.unfinished_rares);
        generic.extend(&defaults.very_rares);
        generic.extend(&defaults.extremely_rares);
        generic.extend(&defaults.unfinished_items);
        generic.extend(&defaults.kingdom_items);
        generic.extend(defaults.reward_groups.iter().flatten());
        for id in generic {
            let material = if id % 3 == 0 { stock::WOOD } else { stock::IRON };
            self.register_template(template(id, &format!("relic {}", id), material, 1500, 0));
        }

        for (id, name) in [
            (49, "copper fifty coin"),
            (50, "copper coin"),
            (51, "iron coin"),
            (52, "silver coin"),
            (53, "gold coin"),
            (54, "copper five coin"),
            (55, "iron five coin"),
            (56, "silver five coin"),
            (57, "gold five coin"),
            (58, "copper twenty coin"),
            (59, "iron twenty coin"),
            (60, "silver twenty coin"),
            (61, "gold twenty coin"),
        ] {
            self.register_template(template(id, name, stock::SILVER, 10, 0));
        }

        self.register_template(template(4200, "treasure map", stock::LEATHER, 50, 0));
        self.register_template(template(995, "treasure chest", stock::WOOD, 8000, 1_000_000));
        self.register_template(template(194, "padlock", stock::IRON, 300, 0));
        self.register_template(template(189, "small barrel", stock::WOOD, 1000, 24_000));
        self.register_template(template(763, "liquid karma", 0, 1, 0));
        self.register_template(template(666, "sleep powder", 0, 50, 0));
        self.register_template(template(742, "statue of a hero", stock::STONE, 20_000, 0));
        self.register_template(template(179, "unfinished item", stock::WOOD, 10_000, 0));
        self.register_template(template(45, "silver lump", stock::SILVER, 1000, 0));
        self.register_template(template(44, "gold lump", stock::GOLD, 1000, 0));
        self.register_template(template(694, "adamantine lump", 0, 1000, 0));
        self.register_template(template(698, "glimmersteel lump", 0, 1000, 0));
        self.register_template(template(371, "dragon scale", 0, 100, 0));
        self.register_template(template(372, "drake hide", stock::LEATHER, 100, 0));
        self.register_template(template(20, "shaft", stock::WOOD, 500, 0));
        self.register_template(template(25, "pickaxe head", stock::IRON, 1500, 0));
        self.register_template(template(384, "guard tower", stock::STONE, 100_000, 0));
        self.register_template(template(867, "strange bone", 0, 200, 0));

        // A pickaxe: head (iron) worked onto a shaft.
        self.add_recipe(Recipe {
            created: 7,
            source: 20,
            target: 25,
            total_items: 2,
            final_material: None,
        });
        // A wooden chest built from many planks.
        self.add_recipe(Recipe {
            created: 62,
            source: 20,
            target: 20,
            total_items: 12,
            final_material: Some(stock::BIRCH),
        });

        for (kind, age) in [(83, 30), (84, 30), (85, 30), (11, 80), (23, 60), (111, 100), (27, 40), (16, 90), (59, 120)] {
            self.set_max_age(kind, age);
        }
    }
}

fn template(id: TemplateId, name: &str, material: MaterialId, weight: u32, volume: u32) -> TemplateInfo {
    TemplateInfo {
        id,
        name: name.to_string(),
        size_prefix: String::new(),
        material,
        is_wood: material == stock::WOOD || material == stock::BIRCH,
        weight_grams: weight,
        container_volume: volume,
    }
}

impl Terrain for GridWorld {
    fn world_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn height_and_type(&self, x: i32, y: i32) -> (i32, TileKind) {
        match self.index(x, y) {
            Some(index) => (self.heights[index], self.tiles[index]),
            // Off the map counts as open sea.
            None => (-100, TileKind::Water),
        }
    }

    fn is_obstacle_blocking(&self, x: i32, y: i32) -> bool {
        self.obstacles.contains(&Position::new(x, y))
    }

    fn is_inside_settlement(&self, x: i32, y: i32) -> bool {
        self.settlements.iter().any(|settlement| settlement.contains(x, y))
    }
}

impl ItemFactory for GridWorld {
    fn instantiate_item(&mut self, spec: &ItemSpec) -> TroveResult<ItemHandle> {
        if !self.templates.contains_key(&spec.template) {
            return Err(TroveError::UnknownTemplate(spec.template));
        }
        if self.refused_templates.contains(&spec.template) {
            return Err(TroveError::Collaborator(format!(
                "template {} cannot be created here",
                spec.template
            )));
        }

        let handle = ItemHandle::new();
        self.items.insert(
            handle,
            StoredItem {
                spec: spec.clone(),
                contents: Vec::new(),
                lock: None,
                container: None,
                position: None,
            },
        );
        Ok(handle)
    }

    fn insert_into(&mut self, container: ItemHandle, item: ItemHandle) -> TroveResult<()> {
        if container == item || !self.items.contains_key(&item) {
            return Err(TroveError::Collaborator(format!("cannot insert {}", item)));
        }
        let parent = self
            .items
            .get_mut(&container)
            .ok_or_else(|| TroveError::Collaborator(format!("no container {}", container)))?;
        parent.contents.push(item);

        if let Some(child) = self.items.get_mut(&item) {
            child.container = Some(container);
            child.position = None;
        }
        Ok(())
    }

    fn destroy(&mut self, item: ItemHandle) {
        let Some(stored) = self.items.remove(&item) else {
            return;
        };
        if let Some(parent) = stored.container.and_then(|parent| self.items.get_mut(&parent)) {
            parent.contents.retain(|&child| child != item);
        }
        for child in stored.contents {
            self.destroy(child);
        }
        if let Some(lock) = stored.lock {
            self.destroy(lock);
        }
    }

    fn lock_with(&mut self, container: ItemHandle, lock: ItemHandle) -> TroveResult<()> {
        if !self.items.contains_key(&lock) {
            return Err(TroveError::Collaborator(format!("no lock {}", lock)));
        }
        let chest = self
            .items
            .get_mut(&container)
            .ok_or_else(|| TroveError::Collaborator(format!("no container {}", container)))?;
        chest.lock = Some(lock);
        Ok(())
    }

    fn place_at(&mut self, item: ItemHandle, position: Position) -> TroveResult<()> {
        if !self.in_bounds(position) {
            return Err(TroveError::Collaborator(format!("{} is off the map", position)));
        }
        let stored = self
            .items
            .get_mut(&item)
            .ok_or_else(|| TroveError::Collaborator(format!("no item {}", item)))?;
        stored.position = Some(position);
        Ok(())
    }
}

impl CreatureFactory for GridWorld {
    fn instantiate_creature(&mut self, request: &SpawnRequest) -> TroveResult<CreatureHandle> {
        if !self.max_ages.contains_key(&request.kind) {
            return Err(TroveError::Collaborator(format!("unknown creature kind {}", request.kind)));
        }
        let handle = CreatureHandle::new();
        self.creatures.insert(handle, request.clone());
        Ok(handle)
    }

    fn max_age(&self, kind: CreatureKind) -> Option<u32> {
        self.max_ages.get(&kind).copied()
    }
}

impl SkillCheck for GridWorld {
    fn skill_check(&mut self, difficulty: f64, knowledge: f64) -> f64 {
        if let Some(result) = self.fixed_skill {
            return result;
        }

        let chance = (50.0 + knowledge - difficulty).clamp(5.0, 95.0);
        let roll = self.skill_rng.gen_range(0.0..100.0);
        if roll < chance {
            1.0 + (chance - roll) / chance * 99.0
        } else {
            -(roll - chance) / (100.0 - chance) * 100.0
        }
    }
}

impl Catalog for GridWorld {
    fn template(&self, id: TemplateId) -> Option<TemplateInfo> {
        self.templates.get(&id).cloned()
    }
}

impl RecipeBook for GridWorld {
    fn recipe_for(&self, id: TemplateId) -> Option<Recipe> {
        self.recipes.iter().find(|recipe| recipe.created == id).cloned()
    }

    fn recipes_creating(&self, id: TemplateId) -> Vec<Recipe> {
        self.recipes
            .iter()
            .filter(|recipe| recipe.created == id && recipe.total_items <= 2)
            .cloned()
            .collect()
    }
}
