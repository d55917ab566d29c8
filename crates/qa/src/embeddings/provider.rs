//! Embedding provider trait and factory.

use super::providers::{ollama::OllamaProvider, trigram::TrigramProvider};
use policylens_core::config::EmbeddingSettings;
use policylens_core::{AppError, AppResult};
use std::sync::Arc;

/// A loaded embedding model.
///
/// Implementations must return one vector per input, in input order, each of
/// length `dimensions()`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Vector dimension
    fn dimensions(&self) -> usize;

    /// Embed several texts in one call.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::ModelUnavailable("No embedding returned".to_string()))
    }
}

/// Build the provider named in the settings.
///
/// Remote providers check reachability here, so a failure means the model is
/// unusable for the session.
pub async fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(
            settings.model.clone(),
            settings.dimensions,
        ))),

        "ollama" => {
            let provider = OllamaProvider::connect(settings).await?;
            Ok(Arc::new(provider))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            other
        ))),
    }
}
