use super::{preview, LlmProvider};
use crate::config::LlmConfig;
use crate::error::IngestError;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::sleep;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    health_retries: u32,
    health_retry_delay: Duration,
}

impl OllamaProvider {
    /// Create a new Ollama provider from configuration
    pub fn new(config: &LlmConfig) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| IngestError::BuilderError(format!("Failed to build HTTP client: {e}")))?;

        Ok(OllamaProvider {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout(),
            health_retries: config.health_retries.max(1),
            health_retry_delay: config.health_retry_delay(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String, model: String) -> Self {
        OllamaProvider {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout: Duration::from_secs(120),
            health_retries: 3,
            health_retry_delay: Duration::from_secs(2),
        }
    }

    /// Override the reachability probe's retry policy
    pub fn with_health_policy(mut self, retries: u32, delay: Duration) -> Self {
        self.health_retries = retries.max(1);
        self.health_retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// List the model names installed on the endpoint
    pub async fn list_models(&self) -> Result<Vec<String>, IngestError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(body["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn probe(&self) -> Result<(), reqwest::Error> {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: &str,
        schema: Option<&Value>,
    ) -> Result<String, IngestError> {
        let prompt = match schema {
            // Compact JSON keeps the token count down
            Some(schema) => format!("{}\n\nSchema: {}", prompt, serde_json::to_string(schema)?),
            None => prompt.to_string(),
        };

        info!(
            "Sending request to Ollama model '{}' (prompt length: {} chars)",
            self.model,
            prompt.chars().count()
        );
        debug!("Prompt preview: {}", preview(&prompt, 500));

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "format": "json"
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Ollama request timed out after {:?}", self.timeout);
                    IngestError::LlmUnavailable(format!(
                        "Ollama request timed out after {:?}",
                        self.timeout
                    ))
                } else {
                    error!("Cannot connect to Ollama at {}", self.base_url);
                    IngestError::LlmUnavailable(format!(
                        "Failed to connect to Ollama at {}: {}",
                        self.base_url, e
                    ))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Ollama HTTP error: {}", status);
            return Err(IngestError::LlmUnavailable(format!(
                "Ollama HTTP error: {status}"
            )));
        }

        let response_body: Value = response.json().await?;
        debug!(
            "Ollama answered in {}ms",
            start.elapsed().as_millis()
        );

        // Check for API error response
        if let Some(error) = response_body.get("error") {
            let error_message = error.as_str().unwrap_or("Unknown error");
            return Err(IngestError::LlmUnavailable(format!(
                "Ollama API error: {error_message}"
            )));
        }

        let text = response_body["response"].as_str().unwrap_or_default();
        if text.trim().is_empty() {
            error!("Empty response from Ollama");
            return Err(IngestError::MalformedResponse(
                "Empty response from Ollama".to_string(),
            ));
        }

        debug!("Raw response preview: {}", preview(text, 500));
        Ok(text.to_string())
    }

    async fn health_check(&self) -> bool {
        for attempt in 1..=self.health_retries {
            match self.probe().await {
                Ok(()) => return true,
                Err(e) if attempt < self.health_retries => {
                    debug!(
                        "Ollama health check attempt {}/{} failed: {}, retrying in {:?}",
                        attempt, self.health_retries, e, self.health_retry_delay
                    );
                    sleep(self.health_retry_delay).await;
                }
                Err(e) => {
                    warn!(
                        "Ollama health check failed after {} attempts: {}",
                        self.health_retries, e
                    );
                }
            }
        }
        false
    }
}
