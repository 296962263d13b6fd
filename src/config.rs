use config::{Config, ConfigError, Environment, File};
use log::{info, warn};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// LLM endpoint configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Vault configuration; required to save recipes, optional for preview
    #[serde(default)]
    pub vault: Option<VaultConfig>,
    /// Input longer than this many characters is truncated before extraction
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Configuration for the Ollama-compatible inference endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Base URL, e.g. "http://localhost:11434"
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier, e.g. "llama3.1:8b"
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds; fractions are allowed
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Reachability probe attempts before the service is declared unreachable
    #[serde(default = "default_health_retries")]
    pub health_retries: u32,
    /// Fixed delay between probe attempts in milliseconds
    #[serde(default = "default_health_retry_delay_ms")]
    pub health_retry_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout: default_timeout(),
            health_retries: default_health_retries(),
            health_retry_delay_ms: default_health_retry_delay_ms(),
        }
    }
}

impl LlmConfig {
    /// Zero, negative or unrepresentable values fall back to the default
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(default_timeout()))
    }

    pub fn health_retry_delay(&self) -> Duration {
        Duration::from_millis(self.health_retry_delay_ms)
    }
}

/// Location of the recipe collection
#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    /// Vault root directory
    pub path: PathBuf,
    /// Recipes directory, relative to the vault root
    #[serde(default = "default_recipes_dir")]
    pub recipes_dir: String,
}

// Default value functions
fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_timeout() -> f64 {
    120.0
}

fn default_health_retries() -> u32 {
    3
}

fn default_health_retry_delay_ms() -> u64 {
    2000
}

pub(crate) fn default_recipes_dir() -> String {
    "personal/recipes".to_string()
}

fn default_max_input_length() -> usize {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            vault: None,
            max_input_length: default_max_input_length(),
            log_level: default_log_level(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. `LLM_BASE_URL` for the endpoint
    /// 2. Environment variables with RECIPE_INGEST__ prefix
    /// 3. recipe-ingest.toml file in current directory
    /// 4. Default values
    ///
    /// Environment variable format: RECIPE_INGEST__LLM__MODEL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`IngestConfig::load`] for the precedence rules.
pub fn load_config() -> Result<IngestConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe-ingest").required(false))
        // Use double underscore for nested: RECIPE_INGEST__VAULT__PATH
        .add_source(
            Environment::with_prefix("RECIPE_INGEST")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config: IngestConfig = settings.try_deserialize()?;

    if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
        if !base_url.trim().is_empty() {
            info!("Using LLM_BASE_URL environment variable: {}", base_url);
            config.llm.endpoint = base_url.trim().to_string();
        }
    }

    let normalized = normalize_endpoint(&config.llm.endpoint)?;
    if normalized != config.llm.endpoint {
        warn!(
            "LLM endpoint had path components, normalizing: {} -> {}",
            config.llm.endpoint, normalized
        );
        config.llm.endpoint = normalized;
    }

    info!(
        "Settings loaded - LLM endpoint: {}, LLM model: {}, Vault: {}",
        config.llm.endpoint,
        config.llm.model,
        config
            .vault
            .as_ref()
            .map(|v| v.path.display().to_string())
            .unwrap_or_else(|| "not configured".to_string())
    );

    Ok(config)
}

/// Reduce an endpoint to `scheme://host[:port]`; request paths are appended by the provider.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ConfigError> {
    let url = Url::parse(endpoint.trim())
        .map_err(|e| ConfigError::Message(format!("Invalid LLM endpoint '{endpoint}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::Message(format!("LLM endpoint '{endpoint}' has no host")))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
