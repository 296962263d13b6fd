use async_trait::async_trait;
use recipe_ingest::{
    IngestError, LlmProvider, NutritionSource, ProcessRequest, RecipePipeline, RecipeStore,
    VaultWriter,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Answers each `generate` call with the next scripted response and counts calls
struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
    healthy: bool,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
            healthy: true,
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
            healthy: false,
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str, _schema: Option<&Value>) -> Result<String, IngestError> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| IngestError::LlmUnavailable("script exhausted".to_string()))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

const PASTA_TEXT: &str = "Test Pasta\n\nIngredients:\n- 200g pasta\n- 1 cup tomato sauce\n\nInstructions:\n1. Boil pasta\n2. Add sauce\n\n350 calories, 45g carbs, 30g protein, 8g fat per serving";

const PASTA_RESPONSE: &str = r#"{
    "title": "Test Pasta",
    "servings": 2,
    "ingredients": ["200g pasta", "1 cup tomato sauce"],
    "instructions": ["Boil pasta", "Add sauce"],
    "calories_per_serving": 350,
    "carbs_grams": 45,
    "protein_grams": 30,
    "fat_grams": 8
}"#;

const ESTIMATE: &str =
    r#"{"calories_per_serving": 500, "carbs_grams": 60, "protein_grams": 20, "fat_grams": 15}"#;

fn dup_response(ingredients: &[&str]) -> String {
    serde_json::json!({
        "title": "Dup",
        "ingredients": ingredients,
        "instructions": ["Stir"],
        "calories_per_serving": 100,
        "carbs_grams": 10,
        "protein_grams": 5,
        "fat_grams": 2
    })
    .to_string()
}

fn pipeline(vault: &Path, provider: Arc<ScriptedProvider>) -> RecipePipeline {
    let writer = VaultWriter::new(vault, "personal/recipes").unwrap();
    RecipePipeline::new(provider, Some(Box::new(writer)))
}

fn recipes_dir(vault: &Path) -> std::path::PathBuf {
    vault.join("personal/recipes")
}

fn file_count(vault: &Path) -> usize {
    fs::read_dir(recipes_dir(vault))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_complete_nutrition_uses_one_llm_call() {
    let vault = TempDir::new().unwrap();
    let provider = ScriptedProvider::new(&[PASTA_RESPONSE]);
    let pipeline = pipeline(vault.path(), provider.clone());

    let result = pipeline.process(ProcessRequest::new(PASTA_TEXT)).await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(result.nutrition_source, NutritionSource::Extracted);
    let meta = &result.recipe.metadata;
    assert_eq!(meta.calories_per_serving, Some(350.0));
    let macros = meta.macros.unwrap();
    assert_eq!((macros.carbs, macros.protein, macros.fat), (45.0, 30.0, 8.0));

    let path = result.file_path.unwrap();
    assert_eq!(path, recipes_dir(vault.path()).join("Test Pasta.md"));
    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.starts_with("---\ntitle: Test Pasta\n"));
    assert_eq!(saved, result.markdown);
    assert!(!result.is_duplicate);
}

#[tokio::test]
async fn test_saved_ingredients_parse_back() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&[PASTA_RESPONSE]));

    let result = pipeline.process(ProcessRequest::new(PASTA_TEXT)).await.unwrap();
    let saved = fs::read_to_string(result.file_path.unwrap()).unwrap();

    assert_eq!(
        recipe_ingest::duplicates::ingredients_from_markdown(&saved),
        result.recipe.ingredients
    );
}

#[tokio::test]
async fn test_multiline_ingredient_reingests_with_overwrite() {
    let vault = TempDir::new().unwrap();
    let response = serde_json::json!({
        "title": "Omelette",
        "ingredients": ["2 eggs\nbeaten", "1 cup milk"],
        "instructions": ["Whisk\nthoroughly", "Fry"],
        "calories_per_serving": 250,
        "carbs_grams": 5,
        "protein_grams": 18,
        "fat_grams": 17
    })
    .to_string();
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&[&response, &response]));

    let first = pipeline.process(ProcessRequest::new("Omelette")).await.unwrap();
    let saved = fs::read_to_string(first.file_path.unwrap()).unwrap();
    assert_eq!(
        recipe_ingest::duplicates::ingredients_from_markdown(&saved),
        vec!["2 eggs beaten", "1 cup milk"]
    );

    let second = pipeline
        .process(ProcessRequest {
            overwrite: true,
            ..ProcessRequest::new("Omelette")
        })
        .await
        .unwrap();
    assert!(second.is_duplicate);
    assert!(second.duplicate_ingredients_match);
    assert!(second.file_path.is_some());
}

#[tokio::test]
async fn test_partial_nutrition_is_recalculated() {
    let vault = TempDir::new().unwrap();
    let response = r#"{"title": "Soup", "ingredients": ["1 onion"], "instructions": ["Cook"], "calories_per_serving": 900}"#;
    let provider = ScriptedProvider::new(&[response, ESTIMATE]);
    let pipeline = pipeline(vault.path(), provider.clone());

    let result = pipeline.process(ProcessRequest::new("Soup\n1 onion")).await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(result.nutrition_source, NutritionSource::Calculated);
    assert_eq!(result.recipe.metadata.calories_per_serving, Some(500.0));
    assert_eq!(result.recipe.metadata.macros.unwrap().fat, 15.0);
}

#[tokio::test]
async fn test_failed_nutrition_defaults_to_zero() {
    let vault = TempDir::new().unwrap();
    let response = r#"{"title": "Soup", "ingredients": ["1 onion"], "instructions": ["Cook"]}"#;
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&[response, "not json"]));

    let result = pipeline.process(ProcessRequest::new("Soup\n1 onion")).await.unwrap();

    assert_eq!(result.nutrition_source, NutritionSource::Defaulted);
    assert_eq!(result.recipe.metadata.calories_per_serving, None);
    assert!(!result.markdown.contains("calories_per_serving"));
    assert!(result.markdown.contains("macros:\n  carbs: 0.0\n"));
    assert!(result.file_path.is_some());
}

#[tokio::test]
async fn test_duplicate_without_overwrite_is_rejected() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(
        vault.path(),
        ScriptedProvider::new(&[&dup_response(&["a", "b"]), &dup_response(&["a", "b"])]),
    );

    let first = pipeline.process(ProcessRequest::new("Dup\na\nb")).await.unwrap();
    let original = fs::read_to_string(first.file_path.as_ref().unwrap()).unwrap();

    let err = pipeline
        .process(ProcessRequest::new("Dup\na\nb"))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::DuplicateExists { ref title, .. } if title == "Dup"));
    assert_eq!(fs::read_to_string(first.file_path.unwrap()).unwrap(), original);
    assert_eq!(file_count(vault.path()), 1);
}

#[tokio::test]
async fn test_overwrite_with_same_ingredients_in_any_order() {
    let vault = TempDir::new().unwrap();
    let second = dup_response(&["b", "a"]).replace("Stir", "Stir gently");
    let pipeline = pipeline(
        vault.path(),
        ScriptedProvider::new(&[&dup_response(&["a", "b"]), &second]),
    );

    pipeline.process(ProcessRequest::new("Dup\na\nb")).await.unwrap();
    let result = pipeline
        .process(ProcessRequest {
            overwrite: true,
            ..ProcessRequest::new("Dup\nb\na")
        })
        .await
        .unwrap();

    assert!(result.is_duplicate);
    assert!(result.duplicate_ingredients_match);
    let saved = fs::read_to_string(result.file_path.unwrap()).unwrap();
    assert!(saved.contains("1. Stir gently"));
    assert_eq!(file_count(vault.path()), 1);
}

#[tokio::test]
async fn test_overwrite_with_different_ingredients_is_refused() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(
        vault.path(),
        ScriptedProvider::new(&[&dup_response(&["a", "b"]), &dup_response(&["a", "b", "b"])]),
    );

    let first = pipeline.process(ProcessRequest::new("Dup\na\nb")).await.unwrap();
    let original = fs::read_to_string(first.file_path.as_ref().unwrap()).unwrap();

    let err = pipeline
        .process(ProcessRequest {
            overwrite: true,
            ..ProcessRequest::new("Dup\na\nb\nb")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::IngredientMismatch { .. }));
    assert_eq!(fs::read_to_string(first.file_path.unwrap()).unwrap(), original);
}

#[tokio::test]
async fn test_preview_reports_duplicate_without_writing() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(
        vault.path(),
        ScriptedProvider::new(&[
            &dup_response(&["a", "b"]),
            &dup_response(&["a", "b"]),
            &dup_response(&["a", "c"]),
        ]),
    );

    let first = pipeline.process(ProcessRequest::new("Dup\na\nb")).await.unwrap();
    let path = first.file_path.unwrap();
    let original = fs::read_to_string(&path).unwrap();

    let preview = ProcessRequest {
        preview_only: true,
        ..ProcessRequest::new("Dup\na\nb")
    };
    let matching = pipeline.process(preview.clone()).await.unwrap();
    assert!(matching.is_duplicate);
    assert!(matching.duplicate_ingredients_match);
    assert!(matching.file_path.is_none());

    let differing = pipeline.process(preview).await.unwrap();
    assert!(differing.is_duplicate);
    assert!(!differing.duplicate_ingredients_match);
    assert!(differing.file_path.is_none());

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert_eq!(file_count(vault.path()), 1);
}

#[tokio::test]
async fn test_preview_without_vault() {
    let provider = ScriptedProvider::new(&[PASTA_RESPONSE]);
    let pipeline = RecipePipeline::new(provider, None);

    let result = pipeline
        .process(ProcessRequest {
            preview_only: true,
            ..ProcessRequest::new(PASTA_TEXT)
        })
        .await
        .unwrap();

    assert!(result.file_path.is_none());
    assert!(result.markdown.contains("# Test Pasta"));
    assert!(!result.is_duplicate);
}

#[tokio::test]
async fn test_empty_input_makes_no_llm_call() {
    let vault = TempDir::new().unwrap();
    let provider = ScriptedProvider::new(&[PASTA_RESPONSE]);
    let pipeline = pipeline(vault.path(), provider.clone());

    let err = pipeline
        .process(ProcessRequest::new("  \n\t "))
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::EmptyInput));
    assert_eq!(provider.calls(), 0);
    assert_eq!(file_count(vault.path()), 0);
}

#[tokio::test]
async fn test_unhealthy_provider_is_unavailable() {
    let vault = TempDir::new().unwrap();
    let provider = ScriptedProvider::down();
    let pipeline = pipeline(vault.path(), provider.clone());

    let err = pipeline.process(ProcessRequest::new(PASTA_TEXT)).await.unwrap_err();

    assert!(matches!(err, IngestError::LlmUnavailable(_)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_non_json_response_is_malformed() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&["Sure! Here is your recipe."]));

    let err = pipeline.process(ProcessRequest::new(PASTA_TEXT)).await.unwrap_err();

    assert!(matches!(err, IngestError::MalformedResponse(_)));
    assert_eq!(file_count(vault.path()), 0);
}

#[tokio::test]
async fn test_missing_fields_recovered_from_text() {
    let vault = TempDir::new().unwrap();
    let response = r#"{"servings": 2, "calories_per_serving": 350, "carbs_grams": 45, "protein_grams": 30, "fat_grams": 8}"#;
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&[response]));

    let result = pipeline.process(ProcessRequest::new(PASTA_TEXT)).await.unwrap();

    assert_eq!(result.recipe.title(), "Test Pasta");
    assert_eq!(result.recipe.ingredients, vec!["200g pasta", "1 cup tomato sauce"]);
    assert_eq!(result.recipe.instructions, vec!["Boil pasta", "Add sauce"]);
}

#[tokio::test]
async fn test_schema_echo_falls_back_to_text() {
    let vault = TempDir::new().unwrap();
    let echo = r#"{"type": "object", "properties": {"title": {"type": "string"}, "ingredients": {"type": "array"}}, "required": ["title"]}"#;
    let provider = ScriptedProvider::new(&[echo, ESTIMATE]);
    let pipeline = pipeline(vault.path(), provider.clone());

    let result = pipeline.process(ProcessRequest::new(PASTA_TEXT)).await.unwrap();

    assert_eq!(result.recipe.title(), "Test Pasta");
    assert_eq!(result.recipe.ingredients.len(), 2);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_unrecoverable_title_uses_default() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&["{}", ESTIMATE]));

    let result = pipeline
        .process(ProcessRequest::new("- 2 eggs\n- 1 cup flour\n1. whisk everything"))
        .await
        .unwrap();

    assert_eq!(result.recipe.title(), "Untitled Recipe");
    assert_eq!(
        result.file_path.unwrap(),
        recipes_dir(vault.path()).join("Untitled Recipe.md")
    );
}

#[tokio::test]
async fn test_source_url_in_frontmatter() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&[PASTA_RESPONSE]));

    let result = pipeline
        .process(ProcessRequest {
            source_url: Some("https://www.instagram.com/p/abc123/".to_string()),
            ..ProcessRequest::new(PASTA_TEXT)
        })
        .await
        .unwrap();

    assert!(result
        .markdown
        .contains("url: https://www.instagram.com/p/abc123/\n"));
}

#[tokio::test]
async fn test_timings_are_reported() {
    let vault = TempDir::new().unwrap();
    let pipeline = pipeline(vault.path(), ScriptedProvider::new(&[PASTA_RESPONSE]));

    let result = pipeline.process(ProcessRequest::new(PASTA_TEXT)).await.unwrap();
    let timing = result.timing;

    assert!(timing.total >= timing.extraction);
    assert!(timing.total >= timing.formatting + timing.writing);
    assert!(timing.extraction >= 0.0);
}

#[tokio::test]
async fn test_store_sees_sanitized_path() {
    let vault = TempDir::new().unwrap();
    let writer = VaultWriter::new(vault.path(), "personal/recipes").unwrap();
    assert_eq!(
        writer.path_for("Mac & Cheese: Best?"),
        recipes_dir(vault.path()).join("Mac & Cheese Best.md")
    );
}
