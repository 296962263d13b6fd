mod ollama;
pub mod prompt;

pub use ollama::OllamaProvider;

use crate::error::IngestError;
use async_trait::async_trait;
use serde_json::Value;

/// Inference endpoint used by extraction and nutrition estimation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "ollama")
    fn provider_name(&self) -> &str;

    /// Send `prompt` requesting JSON output and return the model's raw text.
    ///
    /// When `schema` is given it is appended to the prompt as compact JSON guidance.
    /// Parsing the returned text is left to the caller.
    async fn generate(&self, prompt: &str, schema: Option<&Value>)
        -> Result<String, IngestError>;

    /// Lightweight reachability probe
    async fn health_check(&self) -> bool;
}

/// Shorten long prompts and responses for log output
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
