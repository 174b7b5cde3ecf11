//! Material selection for generated rewards.
//!
//! Items are made of what their recipe makes them of. When the recipe graph
//! says nothing useful the template's own material is used, and anything
//! wooden gets a random wood so chests do not fill up with plain "wood".

use crate::{Catalog, MaterialId, RecipeBook, TemplateId, TreasureConfig};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Material id meaning "unknown".
pub const UNKNOWN_MATERIAL: MaterialId = 0;

/// Picks a material for an item of `template`, `0` when nothing is known.
pub fn select_material<W, R>(
    world: &W,
    config: &TreasureConfig,
    template: TemplateId,
    rng: &mut R,
) -> MaterialId
where
    W: Catalog + RecipeBook + ?Sized,
    R: Rng + ?Sized,
{
    let Some(info) = world.template(template) else {
        debug!("No template {} in the catalog, material unknown", template);
        return UNKNOWN_MATERIAL;
    };
    let material_of = |id: TemplateId| {
        world
            .template(id)
            .map(|info| info.material)
            .unwrap_or(UNKNOWN_MATERIAL)
    };

    if let Some(recipe) = world.recipe_for(template) {
        if recipe.total_items > 2 {
            let mut material = recipe
                .final_material
                .filter(|&material| material != UNKNOWN_MATERIAL)
                .unwrap_or_else(|| material_of(recipe.source));
            if config.is_wood_material(material) || info.is_wood {
                material = random_wood(config, rng, material);
            }
            if material != UNKNOWN_MATERIAL {
                debug!("Material {} for {} from a {}-part recipe", material, info.name, recipe.total_items);
                return material;
            }
        } else {
            let mut material = material_of(recipe.target);
            if config.is_wood_material(material) {
                material = random_wood(config, rng, material);
            }
            if material != UNKNOWN_MATERIAL {
                debug!("Material {} for {} from its recipe target", material, info.name);
                return material;
            }

            let candidates: Vec<MaterialId> = world
                .recipes_creating(recipe.target)
                .iter()
                .map(|deeper| material_of(deeper.target))
                .filter(|&material| material != UNKNOWN_MATERIAL)
                .collect();
            if let Some(&material) = candidates.choose(rng) {
                debug!("Material {} for {} picked from {} candidates", material, info.name, candidates.len());
                return material;
            }
        }
    }

    let material = info.material;
    if config.is_wood_material(material) {
        random_wood(config, rng, material)
    } else {
        material
    }
}

fn random_wood<R: Rng + ?Sized>(config: &TreasureConfig, rng: &mut R, fallback: MaterialId) -> MaterialId {
    config.wood_materials.choose(rng).copied().unwrap_or(fallback)
}
