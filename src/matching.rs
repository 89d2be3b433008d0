use crate::model::{Ingredient, IngredientRef, Recipe};
use crate::selection::SelectionSet;

/// Filter value that disables the type filter.
pub const ALL_TYPES: &str = "all";

/// Recipes whose every ingredient is selected, in catalog order.
pub fn find_available<'a>(selection: &SelectionSet, recipes: &'a [Recipe]) -> Vec<&'a Recipe> {
    recipes
        .iter()
        .filter(|recipe| recipe.ingredients.iter().all(|i| selection.contains(i.name.as_str())))
        .collect()
}

/// Ingredients of `recipe` that the selection lacks.
pub fn missing_ingredients<'a>(
    recipe: &'a Recipe,
    selection: &SelectionSet,
) -> Vec<&'a IngredientRef> {
    recipe
        .ingredients
        .iter()
        .filter(|i| !selection.contains(i.name.as_str()))
        .collect()
}

/// Alphabetical listing narrowed by a name substring and a type, both case-insensitive.
pub fn browse_ingredients<'a>(
    ingredients: &'a [Ingredient],
    search: &str,
    kind: &str,
) -> Vec<&'a Ingredient> {
    let needle = search.trim().to_lowercase();
    let mut listing: Vec<&Ingredient> = ingredients
        .iter()
        .filter(|i| needle.is_empty() || i.name.to_lowercase().contains(&needle))
        .filter(|i| kind.eq_ignore_ascii_case(ALL_TYPES) || i.kind.eq_ignore_ascii_case(kind))
        .collect();
    listing.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    listing
}

/// Distinct ingredient types in first-seen order.
pub fn ingredient_types(ingredients: &[Ingredient]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for ingredient in ingredients {
        if !types.iter().any(|t| t == &ingredient.kind) {
            types.push(ingredient.kind.clone());
        }
    }
    types
}

/// The ingredient catalog is append-only, so the next id follows the last entry.
pub fn next_ingredient_id(ingredients: &[Ingredient]) -> u32 {
    ingredients.last().map_or(0, |i| i.id).saturating_add(1)
}

pub fn next_recipe_id(recipes: &[Recipe]) -> u32 {
    recipes.iter().map(|r| r.id).max().unwrap_or(0).saturating_add(1)
}
