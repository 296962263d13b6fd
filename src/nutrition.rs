use crate::error::IngestError;
use crate::extractors::draft::number_value;
use crate::extractors::DraftNutrition;
use crate::providers::prompt::{nutrition_prompt, NUTRITION_SCHEMA};
use crate::providers::LlmProvider;
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Where a set of nutrition values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutritionSource {
    /// Stated in the recipe text, all four values
    Extracted,
    /// Estimated by a second LLM call
    Calculated,
    /// The estimate failed; every value is zero
    Defaulted,
}

/// Per-serving nutrition. All four values always come from the same source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nutrition {
    pub calories_per_serving: f64,
    pub carbs_grams: f64,
    pub protein_grams: f64,
    pub fat_grams: f64,
    pub source: NutritionSource,
}

impl Nutrition {
    fn zero() -> Self {
        Nutrition {
            calories_per_serving: 0.0,
            carbs_grams: 0.0,
            protein_grams: 0.0,
            fat_grams: 0.0,
            source: NutritionSource::Defaulted,
        }
    }
}

/// Decides between nutrition stated in the text and a fresh estimate.
pub struct NutritionReconciler {
    provider: Arc<dyn LlmProvider>,
}

impl NutritionReconciler {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Reconcile the draft's nutrition values.
    ///
    /// A complete set from the text is used verbatim. Anything less is discarded and all
    /// four values are estimated again; partial values are never mixed with estimates.
    /// Estimation failures degrade to zeros and are not reported as errors.
    pub async fn reconcile(
        &self,
        extracted: &DraftNutrition,
        ingredients: &[String],
        servings: Option<u32>,
        source_text: &str,
    ) -> Nutrition {
        if let DraftNutrition {
            calories_per_serving: Some(calories),
            carbs_grams: Some(carbs),
            protein_grams: Some(protein),
            fat_grams: Some(fat),
        } = *extracted
        {
            info!(
                "Using nutrition information extracted from source text: {:.0} cal, {:.1}g carbs, {:.1}g protein, {:.1}g fat",
                calories, carbs, protein, fat
            );
            return Nutrition {
                calories_per_serving: calories,
                carbs_grams: carbs,
                protein_grams: protein,
                fat_grams: fat,
                source: NutritionSource::Extracted,
            };
        }

        let partial = extracted.present_count() > 0;
        if partial {
            warn!(
                "Partial nutrition data found in source ({} of 4 values). Calculating complete nutrition from ingredients.",
                extracted.present_count()
            );
        } else {
            info!("No nutrition info found in source text, calculating from ingredients");
        }

        let calculated = self
            .calculate(ingredients, servings.unwrap_or(1), source_text)
            .await;

        if partial {
            info!(
                "Nutrition comparison - Extracted (partial) vs Calculated: Calories: {:?} vs {:.0}, Carbs: {:?} vs {:.1}g, Protein: {:?} vs {:.1}g, Fat: {:?} vs {:.1}g",
                extracted.calories_per_serving,
                calculated.calories_per_serving,
                extracted.carbs_grams,
                calculated.carbs_grams,
                extracted.protein_grams,
                calculated.protein_grams,
                extracted.fat_grams,
                calculated.fat_grams
            );
        }
        calculated
    }

    /// Estimate nutrition with a second LLM call.
    pub async fn calculate(&self, ingredients: &[String], servings: u32, source_text: &str) -> Nutrition {
        info!(
            "Calculating nutrition for {} ingredients, {} servings",
            ingredients.len(),
            servings
        );

        let prompt = nutrition_prompt(ingredients, servings, Some(source_text));
        match self.request(&prompt).await {
            Ok(nutrition) => nutrition,
            Err(e) => {
                warn!("Nutrition calculation failed, using defaults: {}", e);
                Nutrition::zero()
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<Nutrition, IngestError> {
        let raw = self
            .provider
            .generate(prompt, Some(&*NUTRITION_SCHEMA))
            .await?;
        let value: Value = serde_json::from_str(raw.trim())?;

        let field = |key: &str| -> Result<f64, IngestError> {
            value
                .get(key)
                .and_then(number_value)
                .filter(|n| *n >= 0.0)
                .ok_or_else(|| {
                    IngestError::MalformedResponse(format!("missing or invalid '{key}'"))
                })
        };

        Ok(Nutrition {
            calories_per_serving: field("calories_per_serving")?,
            carbs_grams: field("carbs_grams")?,
            protein_grams: field("protein_grams")?,
            fat_grams: field("fat_grams")?,
            source: NutritionSource::Calculated,
        })
    }
}
