pub mod draft;
pub mod fallback;

pub use self::draft::{is_schema_echo, DraftNutrition, RecipeDraft};
pub use self::fallback::{
    first_match, FallbackStrategy, INGREDIENT_STRATEGIES, INSTRUCTION_STRATEGIES,
    TITLE_STRATEGIES,
};

use crate::error::IngestError;
use crate::model::UNTITLED_RECIPE;
use crate::providers::prompt::{extraction_prompt, RECIPE_SCHEMA};
use crate::providers::LlmProvider;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Asks the LLM for a structured draft and repairs missing fields from the source text.
pub struct RecipeExtractor {
    provider: Arc<dyn LlmProvider>,
}

impl RecipeExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Extract a draft from preprocessed text.
    ///
    /// Connectivity failures and non-JSON output are returned as errors. Missing
    /// title, ingredients or instructions are never errors: they are filled by
    /// fallback heuristics, and left empty (or "Untitled Recipe") if those find nothing.
    pub async fn extract(&self, text: &str) -> Result<RecipeDraft, IngestError> {
        let prompt = extraction_prompt(text);
        debug!("Created extraction prompt (length: {} chars)", prompt.len());

        info!(
            "Calling {} for recipe extraction...",
            self.provider.provider_name()
        );
        let raw = self.provider.generate(&prompt, Some(&*RECIPE_SCHEMA)).await?;
        let value: Value = serde_json::from_str(raw.trim())?;

        let mut draft = RecipeDraft::from_value(&value)?;
        if is_schema_echo(&value) {
            warn!(
                "LLM returned JSON schema instead of recipe data. Extracting from input text as fallback."
            );
            draft.title = None;
            draft.ingredients.clear();
            draft.instructions.clear();
        }

        Ok(fill_missing(draft, text))
    }
}

/// Apply the fallback strategies to every required field the draft is missing.
pub fn fill_missing(mut draft: RecipeDraft, text: &str) -> RecipeDraft {
    if draft.title.is_none() {
        warn!("LLM response missing 'title'. Attempting fallback extraction from input text.");
        draft.title = Some(match first_match(TITLE_STRATEGIES, text) {
            Some((strategy, title)) => {
                info!("Using fallback title from {}: {}", strategy, title);
                title
            }
            None => {
                warn!("Using default title: '{}'", UNTITLED_RECIPE);
                UNTITLED_RECIPE.to_string()
            }
        });
    }

    if draft.ingredients.is_empty() {
        warn!("LLM response missing 'ingredients'. Attempting fallback extraction from input text.");
        match first_match(INGREDIENT_STRATEGIES, text) {
            Some((strategy, ingredients)) => {
                info!(
                    "Using fallback ingredients from {} ({} items)",
                    strategy,
                    ingredients.len()
                );
                draft.ingredients = ingredients;
            }
            None => warn!("Using empty ingredients list as fallback"),
        }
    }

    if draft.instructions.is_empty() {
        warn!("LLM response missing 'instructions'. Attempting fallback extraction from input text.");
        match first_match(INSTRUCTION_STRATEGIES, text) {
            Some((strategy, instructions)) => {
                info!(
                    "Using fallback instructions from {} ({} steps)",
                    strategy,
                    instructions.len()
                );
                draft.instructions = instructions;
            }
            None => warn!("Using empty instructions list as fallback"),
        }
    }

    draft
}
