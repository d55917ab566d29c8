//! Ollama embedding provider.
//!
//! Talks to a local Ollama server through its batch endpoint (`POST /api/embed`),
//! e.g. with `nomic-embed-text` (768 dimensions) or `all-minilm` (384).

use crate::embeddings::provider::EmbeddingProvider;
use policylens_core::config::EmbeddingSettings;
use policylens_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Per-request HTTP timeout; the embedding service applies its own bound on top.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Connect to Ollama and verify the model answers with the configured dimension.
    ///
    /// Endpoint resolution: settings, then `OLLAMA_URL`, then localhost.
    pub async fn connect(settings: &EmbeddingSettings) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::ModelUnavailable(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = settings
            .endpoint
            .clone()
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let provider = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
        };

        provider.verify().await?;
        Ok(provider)
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn verify(&self) -> AppResult<()> {
        debug!("Verifying Ollama embedding model at {}", self.base_url);

        let probe = self.request(&["connection check"]).await.map_err(|e| {
            AppError::ModelUnavailable(format!(
                "Ollama not available at {} ({}). Ensure it is running and run: ollama pull {}",
                self.base_url, e, self.model
            ))
        })?;

        match probe.first() {
            Some(vector) if vector.len() == self.dimensions => Ok(()),
            Some(vector) => Err(AppError::ModelUnavailable(format!(
                "Ollama model '{}' returned {} dimensions, expected {}",
                self.model,
                vector.len(),
                self.dimensions
            ))),
            None => Err(AppError::ModelUnavailable(format!(
                "Ollama model '{}' returned no embedding",
                self.model
            ))),
        }
    }

    async fn request(&self, inputs: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let body = EmbedRequest {
            model: &self.model,
            input: inputs.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("Request to Ollama failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(AppError::ModelUnavailable(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(parsed.embeddings)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // Ollama rejects blank input; those slots get a zero vector instead.
        let non_blank: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.as_str()))
            .collect();

        let mut out = vec![vec![0.0; self.dimensions]; texts.len()];
        if non_blank.is_empty() {
            return Ok(out);
        }

        let inputs: Vec<&str> = non_blank.iter().map(|(_, t)| *t).collect();
        let vectors = self.request(&inputs).await?;

        if vectors.len() != inputs.len() {
            return Err(AppError::ModelUnavailable(format!(
                "Ollama returned {} embeddings for {} inputs",
                vectors.len(),
                inputs.len()
            )));
        }

        for ((slot, _), vector) in non_blank.into_iter().zip(vectors) {
            out[slot] = vector;
        }

        Ok(out)
    }
}
