use serde_json::{json, Value};
use std::sync::LazyLock;

/// Number of source-text characters passed as context to the nutrition prompt
pub const NUTRITION_SOURCE_CHARS: usize = 300;

/// Schema attached to the extraction prompt as guidance for the model.
pub static RECIPE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "prep_time": {"type": ["string", "null"]},
            "cook_time": {"type": ["string", "null"]},
            "cuisine": {"type": ["string", "null"]},
            "main_ingredient": {"type": ["string", "null"]},
            "servings": {"type": ["integer", "null"]},
            "ingredients": {"type": "array", "items": {"type": "string"}},
            "instructions": {"type": "array", "items": {"type": "string"}},
            "notes": {"type": ["string", "null"]},
            "calories_per_serving": {"type": ["number", "null"]},
            "carbs_grams": {"type": ["number", "null"]},
            "protein_grams": {"type": ["number", "null"]},
            "fat_grams": {"type": ["number", "null"]}
        },
        "required": ["title", "ingredients", "instructions"]
    })
});

/// Schema for the follow-up nutrition estimate. All four numbers are required.
pub static NUTRITION_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "calories_per_serving": {"type": "number"},
            "carbs_grams": {"type": "number"},
            "protein_grams": {"type": "number"},
            "fat_grams": {"type": "number"}
        },
        "required": ["calories_per_serving", "carbs_grams", "protein_grams", "fat_grams"]
    })
});

const EXTRACTION_PROMPT: &str = "Extract recipe as JSON:
- title, prep_time, cook_time, cuisine, main_ingredient, servings (int)
- ingredients: array of strings with quantities
- instructions: array of step strings
- notes (optional)
- calories_per_serving, carbs_grams, protein_grams, fat_grams (numbers, optional if in text)

Extract nutrition values if explicitly stated (e.g., \"X cal\", \"Xg protein\").

Text:
{{RECIPE}}

Return JSON only.";

const NUTRITION_PROMPT: &str = "Estimate nutrition (JSON):
- calories_per_serving, carbs_grams, protein_grams, fat_grams (numbers)

Ingredients:
{{INGREDIENTS}}

Servings: {{SERVINGS}}{{SOURCE}}

Use source values if reasonable, else estimate from ingredients.";

/// Build the extraction prompt around already preprocessed text.
pub fn extraction_prompt(text: &str) -> String {
    EXTRACTION_PROMPT.replace("{{RECIPE}}", text)
}

/// Build the nutrition prompt. Ingredients go one per line without bullets;
/// at most [`NUTRITION_SOURCE_CHARS`] characters of `source_text` are included.
pub fn nutrition_prompt(ingredients: &[String], servings: u32, source_text: Option<&str>) -> String {
    let source = source_text
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let snippet: String = s.chars().take(NUTRITION_SOURCE_CHARS).collect();
            format!("\n\nSource: {snippet}")
        })
        .unwrap_or_default();

    NUTRITION_PROMPT
        .replace("{{INGREDIENTS}}", &ingredients.join("\n"))
        .replace("{{SERVINGS}}", &servings.to_string())
        .replace("{{SOURCE}}", &source)
}
