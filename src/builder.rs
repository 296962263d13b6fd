use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::config::{normalize_endpoint, IngestConfig, LlmConfig, VaultConfig};
use crate::error::IngestError;
use crate::pipeline::{ProcessRequest, ProcessingResult, RecipePipeline};
use crate::preprocess::TextPreprocessor;
use crate::providers::{LlmProvider, OllamaProvider};
use crate::writer::{RecipeStore, VaultWriter};

/// Builder for configuring and running one recipe ingestion
#[derive(Default)]
pub struct RecipeIngestBuilder {
    config: Option<IngestConfig>,
    text: Option<String>,
    source_url: Option<String>,
    vault: Option<PathBuf>,
    recipes_dir: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    provider: Option<Arc<dyn LlmProvider>>,
    overwrite: bool,
    preview_only: bool,
    skip_health_check: bool,
}

impl RecipeIngestBuilder {
    /// Start from a loaded configuration instead of the defaults.
    ///
    /// Values set on the builder still take precedence.
    pub fn config(mut self, config: IngestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the recipe text (caption, pasted notes, transcript)
    ///
    /// # Example
    /// ```
    /// use recipe_ingest::RecipeIngest;
    ///
    /// let builder = RecipeIngest::builder()
    ///     .text("Pasta\n\nIngredients:\n- 200g pasta\n\nInstructions:\n1. Boil");
    /// ```
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Record where the recipe came from; rendered as `url` in the frontmatter
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Set the vault root directory
    ///
    /// # Example
    /// ```
    /// use recipe_ingest::RecipeIngest;
    ///
    /// let builder = RecipeIngest::builder()
    ///     .text("...")
    ///     .vault("/home/me/Obsidian")
    ///     .recipes_dir("cooking");
    /// ```
    pub fn vault(mut self, path: impl Into<PathBuf>) -> Self {
        self.vault = Some(path.into());
        self
    }

    /// Set the recipes directory, relative to the vault root
    pub fn recipes_dir(mut self, dir: impl Into<String>) -> Self {
        self.recipes_dir = Some(dir.into());
        self
    }

    /// Set the Ollama endpoint, e.g. `http://localhost:11434`
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the timeout for each LLM request
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Use a custom LLM provider instead of Ollama
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Allow replacing an existing recipe whose ingredients match exactly
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Run every stage but do not write anything
    pub fn preview_only(mut self) -> Self {
        self.preview_only = true;
        self
    }

    /// Do not probe the LLM endpoint before extraction
    pub fn skip_health_check(mut self) -> Self {
        self.skip_health_check = true;
        self
    }

    /// Build the pipeline and process the text
    ///
    /// # Errors
    /// Returns `IngestError` if:
    /// - No text was specified, or it is blank
    /// - No vault was configured and preview mode is off
    /// - The LLM endpoint is unreachable or answers with something unusable
    /// - A recipe with the same title exists and may not be overwritten
    /// - Writing the recipe fails
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_ingest::RecipeIngest;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let result = RecipeIngest::builder()
    ///     .text("Pancakes\n\n- 2 eggs\n- 1 cup flour\n\n1. Mix\n2. Fry")
    ///     .vault("/home/me/Obsidian")
    ///     .build()
    ///     .await?;
    /// println!("{:?}", result.file_path);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(mut self) -> Result<ProcessingResult, IngestError> {
        let text = self.text.take().ok_or_else(|| {
            IngestError::BuilderError("No recipe text specified. Use .text()".to_string())
        })?;

        let request = ProcessRequest {
            text,
            source_url: self.source_url.take(),
            overwrite: self.overwrite,
            preview_only: self.preview_only,
        };
        self.pipeline()?.process(request).await
    }

    /// Wire configuration, provider and vault into a reusable pipeline
    pub fn pipeline(self) -> Result<RecipePipeline, IngestError> {
        let mut config = self.config.clone().unwrap_or_default();
        config.llm = self.llm_config();

        if let Some(endpoint) = &self.endpoint {
            config.llm.endpoint = normalize_endpoint(endpoint)?;
        }
        if let Some(path) = self.vault {
            let recipes_dir = self
                .recipes_dir
                .clone()
                .or_else(|| config.vault.as_ref().map(|v| v.recipes_dir.clone()))
                .unwrap_or_else(crate::config::default_recipes_dir);
            config.vault = Some(VaultConfig { path, recipes_dir });
        } else if let (Some(dir), Some(vault)) = (self.recipes_dir, config.vault.as_mut()) {
            vault.recipes_dir = dir;
        }

        let provider: Arc<dyn LlmProvider> = match self.provider {
            Some(provider) => provider,
            None => {
                debug!(
                    "Using Ollama at {} with model {}",
                    config.llm.endpoint, config.llm.model
                );
                Arc::new(OllamaProvider::new(&config.llm)?)
            }
        };

        let store = match &config.vault {
            Some(vault) => {
                let writer = VaultWriter::new(&vault.path, &vault.recipes_dir)?;
                Some(Box::new(writer) as Box<dyn RecipeStore>)
            }
            None => None,
        };

        let pipeline = RecipePipeline::new(provider, store)
            .with_preprocessor(TextPreprocessor::new(config.max_input_length));
        Ok(if self.skip_health_check {
            pipeline.without_health_check()
        } else {
            pipeline
        })
    }

    /// LLM settings after model and timeout overrides; the endpoint is normalized separately
    fn llm_config(&self) -> LlmConfig {
        let mut llm = self
            .config
            .as_ref()
            .map(|c| c.llm.clone())
            .unwrap_or_default();
        if let Some(model) = &self.model {
            llm.model = model.clone();
        }
        if let Some(timeout) = self.timeout {
            llm.timeout = timeout.as_secs_f64();
        }
        llm
    }
}

/// Main entry point for the builder API
pub struct RecipeIngest;

impl RecipeIngest {
    /// Creates a new builder for ingesting a recipe
    ///
    /// # Example
    /// ```
    /// use recipe_ingest::RecipeIngest;
    ///
    /// let builder = RecipeIngest::builder();
    /// ```
    pub fn builder() -> RecipeIngestBuilder {
        RecipeIngestBuilder::default()
    }
}
