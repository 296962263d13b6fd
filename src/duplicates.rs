use crate::error::IngestError;
use crate::writer::RecipeStore;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;

/// What the duplicate check found for a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DuplicateStatus {
    pub is_duplicate: bool,
    /// Only meaningful when `is_duplicate` is set
    pub ingredients_match: bool,
}

/// What the pipeline should do with the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    /// No collision; create a new document
    Create,
    /// Collision with identical ingredients and overwrite requested; replace the document
    Replace,
    /// Preview mode; report only
    Skip,
}

/// Check whether `title` collides with a stored recipe and, if so, whether the stored
/// ingredient list matches `ingredients`.
///
/// An existing document that cannot be read counts as a mismatch.
pub fn check(store: &dyn RecipeStore, title: &str, ingredients: &[String]) -> DuplicateStatus {
    if !store.exists(title) {
        return DuplicateStatus::default();
    }

    info!("Duplicate recipe detected: {}", title);
    let ingredients_match = match store.read(title) {
        Ok(existing) => {
            let existing_ingredients = ingredients_from_markdown(&existing);
            let matched = ingredients_match(ingredients, &existing_ingredients);
            info!(
                "Ingredient comparison: match={}, new={} items, existing={} items",
                matched,
                ingredients.len(),
                existing_ingredients.len()
            );
            matched
        }
        Err(e) => {
            warn!("Could not read existing recipe for comparison: {}", e);
            false
        }
    };

    DuplicateStatus {
        is_duplicate: true,
        ingredients_match,
    }
}

/// Apply the overwrite rules to a duplicate check.
///
/// | collision | overwrite | preview | outcome |
/// |---|---|---|---|
/// | no | any | false | `Create` |
/// | yes | false | false | `DuplicateExists` |
/// | yes | true, ingredients match | false | `Replace` |
/// | yes | true, ingredients differ | false | `IngredientMismatch` |
/// | any | any | true | `Skip` |
pub fn decide(
    status: DuplicateStatus,
    overwrite: bool,
    preview_only: bool,
    title: &str,
    path: PathBuf,
) -> Result<WriteDecision, IngestError> {
    if preview_only {
        if status.is_duplicate {
            if status.ingredients_match {
                info!("Preview mode: Duplicate exists with matching ingredients. Overwrite would be allowed.");
            } else {
                info!("Preview mode: Duplicate exists with different ingredients. Overwrite would be refused.");
            }
        }
        return Ok(WriteDecision::Skip);
    }

    if !status.is_duplicate {
        return Ok(WriteDecision::Create);
    }

    match (overwrite, status.ingredients_match) {
        (false, _) => {
            warn!("Recipe '{}' already exists and overwrite=false", title);
            Err(IngestError::DuplicateExists {
                title: title.to_string(),
                path,
            })
        }
        (true, false) => {
            warn!(
                "Recipe '{}' already exists but ingredients don't match. Cannot overwrite.",
                title
            );
            Err(IngestError::IngredientMismatch {
                title: title.to_string(),
                path,
            })
        }
        (true, true) => {
            info!(
                "Ingredients match - will update directions, calories, and metadata for '{}'",
                title
            );
            Ok(WriteDecision::Replace)
        }
    }
}

/// Order-independent, multiplicity-aware comparison after lowercasing and trimming.
///
/// No unit or quantity normalization: "1 cup flour" and "1 cup flour, sifted" differ.
pub fn ingredients_match(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        debug!("Ingredient comparison: {} vs {} items", a.len(), b.len());
        return false;
    }

    let mut counts: HashMap<String, i64> = HashMap::new();
    for ingredient in a {
        *counts.entry(normalize(ingredient)).or_default() += 1;
    }
    for ingredient in b {
        *counts.entry(normalize(ingredient)).or_default() -= 1;
    }
    counts.values().all(|count| *count == 0)
}

fn normalize(ingredient: &str) -> String {
    ingredient.trim().to_lowercase()
}

/// Read the bullet list under the `## Ingredients` heading of a rendered recipe.
pub fn ingredients_from_markdown(markdown: &str) -> Vec<String> {
    let mut lines = markdown.lines().map(str::trim);

    let found_heading = lines
        .by_ref()
        .any(|line| line.eq_ignore_ascii_case("## ingredients"));
    if !found_heading {
        return Vec::new();
    }

    let ingredients: Vec<String> = lines
        .take_while(|line| !line.starts_with("##"))
        .filter_map(|line| line.strip_prefix('-'))
        .map(str::trim)
        .filter(|ingredient| !ingredient.is_empty())
        .map(String::from)
        .collect();

    debug!("Extracted {} ingredients from markdown", ingredients.len());
    ingredients
}
