use crate::extractors::RecipeDraft;
use crate::model::{MacroNutrients, Recipe, RecipeMetadata, UNTITLED_RECIPE};
use crate::nutrition::Nutrition;
use chrono::{DateTime, Local};
use log::{debug, warn};
use url::Url;

/// Build the final recipe from a repaired draft and reconciled nutrition.
///
/// An unusable `source_url` is dropped with a warning; it never fails the recipe.
pub fn assemble(
    draft: RecipeDraft,
    nutrition: &Nutrition,
    source_url: Option<&str>,
    created: DateTime<Local>,
) -> Recipe {
    let url = source_url.and_then(parse_source_url);

    let metadata = RecipeMetadata {
        title: draft
            .title
            .unwrap_or_else(|| UNTITLED_RECIPE.to_string()),
        prep_time: draft.prep_time,
        cook_time: draft.cook_time,
        cuisine: draft.cuisine,
        url,
        main_ingredient: draft.main_ingredient,
        servings: draft.servings,
        // Zero calories means "unknown" and is left out of the frontmatter
        calories_per_serving: (nutrition.calories_per_serving > 0.0)
            .then_some(nutrition.calories_per_serving),
        macros: Some(MacroNutrients {
            carbs: nutrition.carbs_grams,
            protein: nutrition.protein_grams,
            fat: nutrition.fat_grams,
        }),
        created,
    };

    Recipe {
        metadata,
        ingredients: draft.ingredients,
        instructions: draft.instructions,
        notes: draft.notes,
    }
}

fn parse_source_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            debug!("Set source URL in metadata: {}", url);
            Some(url)
        }
        Ok(url) => {
            warn!("Ignoring source URL with unsupported scheme: {}", url);
            None
        }
        Err(e) => {
            warn!("Invalid source URL format: {}, error: {}", raw, e);
            None
        }
    }
}
