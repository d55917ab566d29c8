//! End-to-end question answering over small policies.

use crate::catalog::MAJOR_QUESTIONS;
use crate::embeddings::providers::trigram::TrigramProvider;
use crate::embeddings::EmbeddingService;
use crate::engine::QueryEngine;
use crate::extract::lexical::LexicalExtractor;
use crate::extract::ExtractionService;
use crate::segment::Segmenter;
use crate::types::{AnswerOutcome, Document, NO_ANSWER_TEXT};
use policylens_core::{AppConfig, AppError};
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    const SELLS_NOTHING: &str = "We do not sell or share your data with third parties.";
    const HOLIDAYS: &str = "Our office is closed on public holidays and weekends.";

    async fn engine() -> QueryEngine {
        QueryEngine::new(
            EmbeddingService::from_provider(
                Arc::new(TrigramProvider::new("trigram-v2", 384)),
                Duration::from_secs(5),
            ),
            ExtractionService::from_extractor(Arc::new(LexicalExtractor::new()), Duration::from_secs(5)),
            Segmenter::default(),
            3,
        )
        .await
        .unwrap()
    }

    fn two_passage_policy() -> Document {
        Document::new("example.com", format!("{}\n\n{}", HOLIDAYS, SELLS_NOTHING))
    }

    #[tokio::test]
    async fn test_third_party_question_uses_sharing_passage() {
        let engine = engine().await;
        let document = two_passage_policy();

        let result = engine
            .answer(MAJOR_QUESTIONS[0], &document)
            .await
            .unwrap();

        assert_eq!(result.outcome, AnswerOutcome::Answered);
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].passage.text, SELLS_NOTHING);
        assert!(result.sources[0].score > result.sources[1].score);
        assert!(SELLS_NOTHING.contains(&result.answer));
        assert!(!result.answer.is_empty());
    }

    #[tokio::test]
    async fn test_batch_preserves_question_order() {
        let engine = engine().await;
        let document = two_passage_policy();

        let questions = [
            "Are you closed on weekends?",
            "Do you sell my data?",
            "Is the office open on public holidays?",
        ];
        let results = engine.batch_answer(&questions, &document).await.unwrap();

        let asked: Vec<&str> = results.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(asked, questions.to_vec());
    }

    #[tokio::test]
    async fn test_major_questions_in_fixed_order() {
        let engine = engine().await;
        let results = engine
            .batch_answer(&MAJOR_QUESTIONS, &two_passage_policy())
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        for (result, question) in results.iter().zip(MAJOR_QUESTIONS) {
            assert_eq!(result.question, question);
        }
    }

    #[tokio::test]
    async fn test_whitespace_document_has_no_content() {
        let engine = engine().await;
        let document = Document::new("blank.example", "   \n\n\t \n");

        let err = engine.prepare(&document).unwrap_err();
        assert!(matches!(err, AppError::NoContentAvailable(_)));

        let result = engine.answer("Do you sell my data?", &document).await.unwrap();
        assert_eq!(result.outcome, AnswerOutcome::NoContent);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_question_is_no_answer() {
        let engine = engine().await;

        let result = engine
            .answer("How long are payment records kept?", &two_passage_policy())
            .await
            .unwrap();

        assert_eq!(result.outcome, AnswerOutcome::NoAnswer);
        assert_eq!(result.answer, NO_ANSWER_TEXT);
        assert!(!result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_segmentation_is_cached_per_text() {
        let engine = engine().await;
        let document = two_passage_policy();
        let renamed = Document::new("mirror.example.com", document.text());

        let first = engine.prepare(&document).unwrap();
        engine.answer("Do you sell my data?", &document).await.unwrap();
        engine.answer("Are you open on weekends?", &renamed).await.unwrap();
        let second = engine.prepare(&renamed).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cached_documents(), 1);

        engine.prepare(&Document::new("other.org", SELLS_NOTHING)).unwrap();
        assert_eq!(engine.cached_documents(), 2);
    }

    #[tokio::test]
    async fn test_cache_evicts_oldest_document() {
        let engine = engine().await.with_cache_capacity(2);
        let first = Document::new("a.com", SELLS_NOTHING);
        let second = Document::new("b.com", HOLIDAYS);
        let third = two_passage_policy();

        let original = engine.prepare(&first).unwrap();
        engine.prepare(&second).unwrap();
        engine.prepare(&third).unwrap();
        assert_eq!(engine.cached_documents(), 2);

        // evicted, so segmented afresh
        let reloaded = engine.prepare(&first).unwrap();
        assert!(!Arc::ptr_eq(&original, &reloaded));
        assert_eq!(reloaded.len(), original.len());
        assert_eq!(engine.cached_documents(), 2);
    }

    #[tokio::test]
    async fn test_nearest_reference_question() {
        let engine = engine().await;

        let nearest = engine
            .nearest_reference("Is my data stored securely?")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(nearest.question, "Is my data stored securely?");
    }

    #[tokio::test]
    async fn test_load_from_default_config() {
        let config = AppConfig::default();
        let engine = QueryEngine::load(&config).await.unwrap();

        let result = engine
            .answer("Do you sell data to third parties?", &two_passage_policy())
            .await
            .unwrap();
        assert!(result.is_answered());
    }

    #[tokio::test]
    async fn test_zero_top_k_is_rejected() {
        let err = QueryEngine::new(
            EmbeddingService::from_provider(
                Arc::new(TrigramProvider::new("trigram-v2", 64)),
                Duration::from_secs(5),
            ),
            ExtractionService::from_extractor(Arc::new(LexicalExtractor::new()), Duration::from_secs(5)),
            Segmenter::default(),
            0,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }
}
