//! Extractive answer selection.
//!
//! An [`AnswerExtractor`] picks the substring of a context that best answers a
//! question. [`ExtractionService`] wraps one with the checks every caller
//! needs: non-empty context, bounded inference time, and a span that really is
//! a verbatim slice of the context.

pub mod http;
pub mod lexical;

use crate::types::{Extraction, RankedPassage};
use policylens_core::config::{ExtractorSettings, TimeoutSettings};
use policylens_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// A loaded extractive QA model.
#[async_trait::async_trait]
pub trait AnswerExtractor: Send + Sync + std::fmt::Debug {
    /// Extractor name (e.g., "lexical", "http")
    fn name(&self) -> &str;

    /// Return the span of `context` most likely to answer `question`.
    async fn extract(&self, question: &str, context: &str) -> AppResult<Extraction>;
}

/// Build the extractor named in the settings.
pub fn create_extractor(
    settings: &ExtractorSettings,
    api_key: Option<String>,
) -> AppResult<Arc<dyn AnswerExtractor>> {
    match settings.provider.as_str() {
        "lexical" => Ok(Arc::new(lexical::LexicalExtractor::new())),

        "http" => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config("The http extractor requires extractor.endpoint".to_string())
            })?;
            let extractor = http::HttpExtractor::new(endpoint, api_key)?;
            Ok(Arc::new(extractor))
        }

        other => Err(AppError::Config(format!(
            "Unknown extractor provider: '{}'. Supported providers: lexical, http",
            other
        ))),
    }
}

/// Join ranked passages into one context, verbatim, in ranked (best-first) order.
pub fn merge_context(ranked: &[RankedPassage]) -> String {
    ranked
        .iter()
        .map(|r| r.passage.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extractor plus the invariants the query engine relies on.
#[derive(Debug, Clone)]
pub struct ExtractionService {
    extractor: Arc<dyn AnswerExtractor>,
    inference_timeout: Duration,
}

impl ExtractionService {
    /// Build the configured extractor once for the session.
    pub fn load(
        settings: &ExtractorSettings,
        timeouts: &TimeoutSettings,
        api_key: Option<String>,
    ) -> AppResult<Self> {
        tracing::info!(
            "Loading answer extractor: provider={}, model={}",
            settings.provider,
            settings.model
        );

        let extractor = create_extractor(settings, api_key)?;
        Ok(Self::from_extractor(
            extractor,
            Duration::from_secs(timeouts.inference_secs),
        ))
    }

    pub fn from_extractor(extractor: Arc<dyn AnswerExtractor>, inference_timeout: Duration) -> Self {
        Self {
            extractor,
            inference_timeout,
        }
    }

    pub fn name(&self) -> &str {
        self.extractor.name()
    }

    /// Extract an answer span from `context`.
    ///
    /// Empty context, timeouts, model errors and spans that do not slice the
    /// context all come back as `ExtractionFailed`.
    pub async fn extract(&self, question: &str, context: &str) -> AppResult<Extraction> {
        if context.trim().is_empty() {
            return Err(AppError::ExtractionFailed("Context is empty".to_string()));
        }

        let extraction =
            tokio::time::timeout(self.inference_timeout, self.extractor.extract(question, context))
                .await
                .map_err(|_| {
                    AppError::ExtractionFailed(format!(
                        "Answer extraction timed out after {:?}",
                        self.inference_timeout
                    ))
                })?
                .map_err(|e| match e {
                    AppError::ExtractionFailed(_) => e,
                    other => AppError::ExtractionFailed(other.to_string()),
                })?;

        if context.get(extraction.start..extraction.end) != Some(extraction.answer.as_str()) {
            return Err(AppError::ExtractionFailed(format!(
                "Extractor '{}' returned a span that is not part of the context",
                self.extractor.name()
            )));
        }

        tracing::debug!(
            "Extracted {}-byte answer at {}..{} (score: {:?})",
            extraction.answer.len(),
            extraction.start,
            extraction.end,
            extraction.score
        );

        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Passage;

    /// Extractor that answers with text the context does not contain.
    #[derive(Debug)]
    struct InventingExtractor;

    #[async_trait::async_trait]
    impl AnswerExtractor for InventingExtractor {
        fn name(&self) -> &str {
            "inventing"
        }
        async fn extract(&self, _question: &str, _context: &str) -> AppResult<Extraction> {
            Ok(Extraction {
                answer: "made up".to_string(),
                score: Some(0.99),
                start: 0,
                end: 7,
            })
        }
    }

    #[derive(Debug)]
    struct SlowExtractor;

    #[async_trait::async_trait]
    impl AnswerExtractor for SlowExtractor {
        fn name(&self) -> &str {
            "slow"
        }
        async fn extract(&self, _question: &str, _context: &str) -> AppResult<Extraction> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(AppError::Other("unreachable".to_string()))
        }
    }

    fn ranked(index: usize, text: &str, score: f32) -> RankedPassage {
        RankedPassage {
            passage: Passage {
                index,
                text: text.to_string(),
                byte_range: (0, text.len()),
            },
            score,
        }
    }

    #[test]
    fn test_merge_context_keeps_ranked_order() {
        let context = merge_context(&[
            ranked(4, "Best passage.", 0.9),
            ranked(1, "Second passage.", 0.5),
        ]);
        assert_eq!(context, "Best passage.\nSecond passage.");
    }

    #[test]
    fn test_create_unknown_extractor() {
        let settings = ExtractorSettings {
            provider: "generative".to_string(),
            ..Default::default()
        };
        assert!(create_extractor(&settings, None).is_err());
    }

    #[tokio::test]
    async fn test_empty_context_fails() {
        let service = ExtractionService::load(
            &ExtractorSettings::default(),
            &TimeoutSettings::default(),
            None,
        )
        .unwrap();

        let err = service.extract("Is data sold?", "  \n ").await.unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_span_outside_context_is_rejected() {
        let service =
            ExtractionService::from_extractor(Arc::new(InventingExtractor), Duration::from_secs(5));

        let err = service
            .extract("Is data sold?", "We never sell data.")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_extraction_failed() {
        let service =
            ExtractionService::from_extractor(Arc::new(SlowExtractor), Duration::from_secs(2));

        let err = service
            .extract("Is data sold?", "We never sell data.")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
    }
}
