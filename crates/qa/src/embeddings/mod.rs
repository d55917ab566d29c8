//! Embedding service.
//!
//! Wraps a loaded [`EmbeddingProvider`] with the guarantees the ranker relies
//! on: one vector per input, input order kept, a fixed dimension, and bounded
//! inference time.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use policylens_core::config::{EmbeddingSettings, TimeoutSettings};
use policylens_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// A loaded embedding model, shared read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    inference_timeout: Duration,
}

impl EmbeddingService {
    /// Load the configured model once. Expiry of the load timeout, like any
    /// load failure, is `ModelUnavailable`.
    pub async fn load(settings: &EmbeddingSettings, timeouts: &TimeoutSettings) -> AppResult<Self> {
        let load_timeout = Duration::from_secs(timeouts.model_load_secs);

        tracing::info!(
            "Loading embedding model: provider={}, model={}, dimensions={}",
            settings.provider,
            settings.model,
            settings.dimensions
        );

        let provider = tokio::time::timeout(load_timeout, create_provider(settings))
            .await
            .map_err(|_| {
                AppError::ModelUnavailable(format!(
                    "Embedding model load timed out after {}s",
                    timeouts.model_load_secs
                ))
            })??;

        Ok(Self::from_provider(
            provider,
            Duration::from_secs(timeouts.inference_secs),
        ))
    }

    /// Wrap an already constructed provider.
    pub fn from_provider(provider: Arc<dyn EmbeddingProvider>, inference_timeout: Duration) -> Self {
        Self {
            provider,
            inference_timeout,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Encode texts into vectors, one per input, in input order.
    pub async fn encode(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Encoding {} texts with {}/{}",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let vectors = tokio::time::timeout(self.inference_timeout, self.provider.embed_batch(texts))
            .await
            .map_err(|_| {
                AppError::ModelUnavailable(format!(
                    "Embedding inference timed out after {:?}",
                    self.inference_timeout
                ))
            })??;

        if vectors.len() != texts.len() {
            return Err(AppError::InvalidEmbedding(format!(
                "Model returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        let expected = self.provider.dimensions();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(AppError::InvalidEmbedding(format!(
                "Model returned a {}-dimensional vector, expected {}",
                bad.len(),
                expected
            )));
        }

        Ok(vectors)
    }

    /// Encode a single text.
    pub async fn encode_one(&self, text: &str) -> AppResult<Vec<f32>> {
        self.encode(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::InvalidEmbedding("Model returned no vector".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::trigram::TrigramProvider;

    /// Provider that never finishes, for timeout tests.
    #[derive(Debug)]
    struct StalledProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for StalledProvider {
        fn provider_name(&self) -> &str {
            "stalled"
        }
        fn model_name(&self) -> &str {
            "stalled"
        }
        fn dimensions(&self) -> usize {
            4
        }
        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    /// Provider that returns vectors of the wrong size.
    #[derive(Debug)]
    struct ShortProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ShortProvider {
        fn provider_name(&self) -> &str {
            "short"
        }
        fn model_name(&self) -> &str {
            "short"
        }
        fn dimensions(&self) -> usize {
            8
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
        }
    }

    fn trigram_service() -> EmbeddingService {
        EmbeddingService::from_provider(
            Arc::new(TrigramProvider::new("trigram-v2", 64)),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_load_default_settings() {
        let service = EmbeddingService::load(&EmbeddingSettings::default(), &TimeoutSettings::default())
            .await
            .unwrap();
        assert_eq!(service.dimensions(), 384);
        assert_eq!(service.model_name(), "trigram-v2");
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty() {
        let vectors = trigram_service().encode(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn test_encode_one_vector_per_text() {
        let texts = vec![
            "retention period".to_string(),
            "opt out of marketing".to_string(),
            "children's privacy".to_string(),
        ];
        let vectors = trigram_service().encode(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inference_timeout_is_model_unavailable() {
        let service =
            EmbeddingService::from_provider(Arc::new(StalledProvider), Duration::from_secs(1));

        let err = service.encode_one("anything").await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let service =
            EmbeddingService::from_provider(Arc::new(ShortProvider), Duration::from_secs(5));

        let err = service.encode_one("anything").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidEmbedding(_)));
    }
}
