use crate::assembler::assemble;
use crate::duplicates::{self, DuplicateStatus, WriteDecision};
use crate::error::IngestError;
use crate::extractors::RecipeExtractor;
use crate::formatter::MarkdownFormatter;
use crate::model::Recipe;
use crate::nutrition::{NutritionReconciler, NutritionSource};
use crate::preprocess::TextPreprocessor;
use crate::providers::LlmProvider;
use crate::writer::RecipeStore;
use chrono::Local;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// One ingestion request
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    pub text: String,
    pub source_url: Option<String>,
    /// Replace an existing recipe with the same title if its ingredients match exactly
    pub overwrite: bool,
    /// Run every stage except the write
    pub preview_only: bool,
}

impl ProcessRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Wall-clock duration of each stage, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    /// Preprocessing, LLM extraction, nutrition and assembly
    pub extraction: f64,
    pub formatting: f64,
    /// Duplicate resolution and the write itself
    pub writing: f64,
    pub total: f64,
}

/// Everything a caller needs to report on one ingestion
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub recipe: Recipe,
    pub markdown: String,
    /// Where the recipe was saved; `None` in preview mode
    pub file_path: Option<PathBuf>,
    pub timing: StageTimings,
    pub nutrition_source: NutritionSource,
    pub is_duplicate: bool,
    /// Only meaningful when `is_duplicate` is set
    pub duplicate_ingredients_match: bool,
}

/// Runs text through every stage: preprocess, extract, reconcile nutrition,
/// assemble, format, resolve duplicates and write.
pub struct RecipePipeline {
    provider: Arc<dyn LlmProvider>,
    preprocessor: TextPreprocessor,
    extractor: RecipeExtractor,
    reconciler: NutritionReconciler,
    formatter: MarkdownFormatter,
    store: Option<Box<dyn RecipeStore>>,
    health_check: bool,
}

impl RecipePipeline {
    pub fn new(provider: Arc<dyn LlmProvider>, store: Option<Box<dyn RecipeStore>>) -> Self {
        Self {
            extractor: RecipeExtractor::new(provider.clone()),
            reconciler: NutritionReconciler::new(provider.clone()),
            provider,
            preprocessor: TextPreprocessor::default(),
            formatter: MarkdownFormatter,
            store,
            health_check: true,
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: TextPreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Skip the reachability probe before extraction
    pub fn without_health_check(mut self) -> Self {
        self.health_check = false;
        self
    }

    pub async fn process(&self, request: ProcessRequest) -> Result<ProcessingResult, IngestError> {
        let started = Instant::now();
        info!(
            "Processing recipe text ({} chars, preview={}, overwrite={})",
            request.text.chars().count(),
            request.preview_only,
            request.overwrite
        );

        if self.store.is_none() && !request.preview_only {
            return Err(IngestError::BuilderError(
                "No vault configured. Set a vault path or use preview mode.".to_string(),
            ));
        }

        let text = self.preprocessor.process(&request.text)?;

        if self.health_check && !self.provider.health_check().await {
            return Err(IngestError::LlmUnavailable(format!(
                "{} is not reachable",
                self.provider.provider_name()
            )));
        }

        // Extraction
        let stage = Instant::now();
        let draft = self.extractor.extract(&text).await?;
        let nutrition = self
            .reconciler
            .reconcile(&draft.nutrition, &draft.ingredients, draft.servings, &text)
            .await;
        let recipe = assemble(draft, &nutrition, request.source_url.as_deref(), Local::now());
        let extraction = stage.elapsed().as_secs_f64();
        info!(
            "Extracted recipe '{}' ({} ingredients, {} steps) in {:.2}s",
            recipe.title(),
            recipe.ingredients.len(),
            recipe.instructions.len(),
            extraction
        );

        // Formatting
        let stage = Instant::now();
        let markdown = self.formatter.format(&recipe);
        let formatting = stage.elapsed().as_secs_f64();
        debug!("Rendered {} bytes of markdown", markdown.len());

        // Duplicates and writing
        let stage = Instant::now();
        let (status, file_path) = match self.store.as_deref() {
            Some(store) => self.save(store, &recipe, &markdown, &request)?,
            None => {
                info!("Preview mode without a vault: skipping duplicate check");
                (DuplicateStatus::default(), None)
            }
        };
        let writing = stage.elapsed().as_secs_f64();

        let timing = StageTimings {
            extraction,
            formatting,
            writing,
            total: started.elapsed().as_secs_f64(),
        };
        info!(
            "Recipe processing complete in {:.2}s (extraction {:.2}s, formatting {:.3}s, writing {:.3}s)",
            timing.total, timing.extraction, timing.formatting, timing.writing
        );

        Ok(ProcessingResult {
            recipe,
            markdown,
            file_path,
            timing,
            nutrition_source: nutrition.source,
            is_duplicate: status.is_duplicate,
            duplicate_ingredients_match: status.ingredients_match,
        })
    }

    fn save(
        &self,
        store: &dyn RecipeStore,
        recipe: &Recipe,
        markdown: &str,
        request: &ProcessRequest,
    ) -> Result<(DuplicateStatus, Option<PathBuf>), IngestError> {
        let title = recipe.title();
        let status = duplicates::check(store, title, &recipe.ingredients);
        let decision = duplicates::decide(
            status,
            request.overwrite,
            request.preview_only,
            title,
            store.path_for(title),
        )?;

        let path = match decision {
            WriteDecision::Create => Some(store.write(title, markdown, false)?),
            WriteDecision::Replace => Some(store.write(title, markdown, true)?),
            WriteDecision::Skip => {
                info!("Preview mode: skipping write for '{}'", title);
                None
            }
        };
        Ok((status, path))
    }
}
