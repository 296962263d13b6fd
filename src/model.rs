use chrono::{DateTime, Local};
use serde::Serialize;
use url::Url;

pub const UNTITLED_RECIPE: &str = "Untitled Recipe";

/// Macronutrient breakdown per serving, in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroNutrients {
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

/// Recipe metadata rendered into the frontmatter
#[derive(Debug, Clone, Serialize)]
pub struct RecipeMetadata {
    pub title: String,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub cuisine: Option<String>,
    pub url: Option<Url>,
    pub main_ingredient: Option<String>,
    pub servings: Option<u32>,
    pub calories_per_serving: Option<f64>,
    pub macros: Option<MacroNutrients>,
    pub created: DateTime<Local>,
}

/// A fully assembled recipe. Built once by the assembler and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub metadata: RecipeMetadata,
    /// Quantity and name together, in display order
    pub ingredients: Vec<String>,
    /// Steps in the order they are performed
    pub instructions: Vec<String>,
    pub notes: Option<String>,
}

impl Recipe {
    pub fn title(&self) -> &str {
        &self.metadata.title
    }
}
