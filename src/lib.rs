pub mod assembler;
pub mod builder;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod extractors;
pub mod formatter;
pub mod model;
pub mod nutrition;
pub mod pipeline;
pub mod preprocess;
pub mod providers;
pub mod writer;

// Re-export commonly used types
pub use builder::{RecipeIngest, RecipeIngestBuilder};
pub use config::IngestConfig;
pub use error::IngestError;
pub use formatter::MarkdownFormatter;
pub use model::{MacroNutrients, Recipe, RecipeMetadata};
pub use nutrition::{Nutrition, NutritionSource};
pub use pipeline::{ProcessRequest, ProcessingResult, RecipePipeline, StageTimings};
pub use providers::{LlmProvider, OllamaProvider};
pub use writer::{RecipeStore, VaultWriter};

/// Ingest recipe text into the vault at `vault`, using configuration from file and environment.
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let result = recipe_ingest::ingest_text("Pancakes\n- 2 eggs\n1. Fry", "/home/me/Obsidian").await?;
/// println!("Saved to {:?}", result.file_path);
/// # Ok(())
/// # }
/// ```
pub async fn ingest_text(
    text: &str,
    vault: impl Into<std::path::PathBuf>,
) -> Result<ProcessingResult, IngestError> {
    RecipeIngest::builder()
        .config(IngestConfig::load()?)
        .text(text)
        .vault(vault)
        .build()
        .await
}

/// Run every stage except the write and return the rendered markdown.
pub async fn preview_text(text: &str) -> Result<ProcessingResult, IngestError> {
    RecipeIngest::builder()
        .config(IngestConfig::load()?)
        .text(text)
        .preview_only()
        .build()
        .await
}
