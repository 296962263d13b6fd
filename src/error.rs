use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while ingesting a recipe
#[derive(Error, Debug)]
pub enum IngestError {
    /// Input text was empty or whitespace only
    #[error("Input text cannot be empty")]
    EmptyInput,

    /// The LLM endpoint could not be reached, timed out, or answered with an HTTP error
    #[error("LLM service unavailable: {0}")]
    LlmUnavailable(String),

    /// The LLM answered, but not with something we can use
    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    /// A recipe with the same file name already exists and overwrite was not requested
    #[error(
        "Recipe '{title}' already exists at {}. Use overwrite to update directions, calories, or metadata (only if ingredients match exactly).",
        .path.display()
    )]
    DuplicateExists { title: String, path: PathBuf },

    /// Overwrite was requested but the existing recipe lists different ingredients
    #[error(
        "Recipe '{title}' already exists at {} with different ingredients. Ingredients must match exactly to allow an overwrite.",
        .path.display()
    )]
    IngredientMismatch { title: String, path: PathBuf },

    /// Writing, syncing, or renaming the recipe file failed
    #[error("Failed to write recipe to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Vault root is missing or not a directory
    #[error("Vault path does not exist or is not a directory: {}", .0.display())]
    InvalidVault(PathBuf),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IngestError::LlmUnavailable(format!("request timed out: {err}"))
        } else if err.is_decode() {
            IngestError::MalformedResponse(err.to_string())
        } else {
            IngestError::LlmUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::MalformedResponse(format!("invalid JSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_maps_to_malformed() {
        let err: IngestError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, IngestError::MalformedResponse(_)));
    }

    #[test]
    fn test_duplicate_message_mentions_title_and_path() {
        let err = IngestError::DuplicateExists {
            title: "Dup".to_string(),
            path: PathBuf::from("/vault/recipes/Dup.md"),
        };
        let message = err.to_string();
        assert!(message.contains("'Dup'"));
        assert!(message.contains("/vault/recipes/Dup.md"));
    }
}
