use crate::error::IngestError;
use serde_json::{Map, Value};

/// Nutrition values as stated in the source text, per serving
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DraftNutrition {
    pub calories_per_serving: Option<f64>,
    pub carbs_grams: Option<f64>,
    pub protein_grams: Option<f64>,
    pub fat_grams: Option<f64>,
}

impl DraftNutrition {
    /// How many of the four values are present
    pub fn present_count(&self) -> usize {
        [
            self.calories_per_serving,
            self.carbs_grams,
            self.protein_grams,
            self.fat_grams,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

/// Field set produced by the LLM before fallback and nutrition reconciliation.
///
/// Empty strings and empty lists are stored as absent so "missing" and "falsy" are the same thing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDraft {
    pub title: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub cuisine: Option<String>,
    pub main_ingredient: Option<String>,
    pub servings: Option<u32>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub notes: Option<String>,
    pub nutrition: DraftNutrition,
}

impl RecipeDraft {
    /// Parse the model's raw output.
    pub fn parse(raw: &str) -> Result<Self, IngestError> {
        let value: Value = serde_json::from_str(raw.trim())?;
        Self::from_value(&value)
    }

    /// Build a draft from a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: &Value) -> Result<Self, IngestError> {
        let object = value.as_object().ok_or_else(|| {
            IngestError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                kind_of(value)
            ))
        })?;

        Ok(RecipeDraft {
            title: string_field(object, "title"),
            prep_time: string_field(object, "prep_time"),
            cook_time: string_field(object, "cook_time"),
            cuisine: string_field(object, "cuisine"),
            main_ingredient: string_field(object, "main_ingredient"),
            servings: number_field(object, "servings")
                .filter(|n| *n >= 1.0 && *n <= u32::MAX as f64)
                .map(|n| n.round() as u32),
            ingredients: list_field(object, "ingredients"),
            instructions: list_field(object, "instructions"),
            notes: string_field(object, "notes"),
            nutrition: DraftNutrition {
                calories_per_serving: nutrient_field(object, "calories_per_serving"),
                carbs_grams: nutrient_field(object, "carbs_grams"),
                protein_grams: nutrient_field(object, "protein_grams"),
                fat_grams: nutrient_field(object, "fat_grams"),
            },
        })
    }
}

/// True when the model echoed the JSON schema back instead of filling it in.
pub fn is_schema_echo(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("object")
        && value.get("properties").map(Value::is_object).unwrap_or(false)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    number_value(object.get(key)?)
}

/// A finite number given either as a JSON number or as a string such as "350 kcal"
pub(crate) fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Nutrition values are never negative; a negative number is treated as not stated.
fn nutrient_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    number_field(object, key).filter(|n| *n >= 0.0)
}

/// Parse "350", "350 kcal" or "12.5g" as their leading number
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

fn list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(single_line(s)),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .lines()
            .map(single_line)
            .filter(|line| !line.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// List items are rendered one per line, so embedded line breaks and runs of
/// whitespace collapse to a single space.
fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
