//! Sentence-overlap extractor.
//!
//! Local stand-in for a neural reader: the answer is the context sentence
//! sharing the most question terms, with rare terms counting for more.

use super::AnswerExtractor;
use crate::text::content_terms;
use crate::types::Extraction;
use policylens_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Default)]
pub struct LexicalExtractor;

/// A trimmed sentence with its byte offsets in the context.
struct Sentence<'a> {
    text: &'a str,
    start: usize,
    terms: HashSet<String>,
}

impl LexicalExtractor {
    pub fn new() -> Self {
        Self
    }

    fn sentences(context: &str) -> Vec<Sentence<'_>> {
        context
            .split_sentence_bound_indices()
            .filter_map(|(offset, raw)| {
                let text = raw.trim();
                if text.is_empty() {
                    return None;
                }
                let lead = raw.len() - raw.trim_start().len();
                Some(Sentence {
                    text,
                    start: offset + lead,
                    terms: content_terms(text).into_iter().collect(),
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl AnswerExtractor for LexicalExtractor {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn extract(&self, question: &str, context: &str) -> AppResult<Extraction> {
        let question_terms: HashSet<String> = content_terms(question).into_iter().collect();
        if question_terms.is_empty() {
            return Err(AppError::ExtractionFailed(
                "Question has no content words to match".to_string(),
            ));
        }

        let sentences = Self::sentences(context);

        // Inverse sentence frequency: terms found in every sentence say little.
        let total = sentences.len() as f32;
        let weights: HashMap<&str, f32> = question_terms
            .iter()
            .map(|term| {
                let df = sentences.iter().filter(|s| s.terms.contains(term)).count() as f32;
                (term.as_str(), (1.0 + total / (1.0 + df)).ln())
            })
            .collect();
        let weight_sum: f32 = weights.values().sum();

        let mut best: Option<(&Sentence<'_>, f32)> = None;
        for sentence in &sentences {
            let matched: f32 = weights
                .iter()
                .filter(|(term, _)| sentence.terms.contains(**term))
                .map(|(_, w)| w)
                .sum();

            if matched <= 0.0 {
                continue;
            }

            let score = matched / weight_sum;
            // strict comparison keeps the earliest sentence on ties
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((sentence, score));
            }
        }

        let (sentence, score) = best.ok_or_else(|| {
            AppError::ExtractionFailed(
                "No sentence in the context shares terms with the question".to_string(),
            )
        })?;

        Ok(Extraction {
            answer: sentence.text.to_string(),
            score: Some(score.clamp(0.0, 1.0)),
            start: sentence.start,
            end: sentence.start + sentence.text.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_picks_overlapping_sentence() {
        let context = "We do not sell or share your data with third parties.\n\
                       This page was last updated in January.";
        let extraction = LexicalExtractor::new()
            .extract(
                "Does this website share my personal data with third parties?",
                context,
            )
            .await
            .unwrap();

        assert_eq!(
            extraction.answer,
            "We do not sell or share your data with third parties."
        );
        assert_eq!(&context[extraction.start..extraction.end], extraction.answer);
        assert!(extraction.score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_rare_terms_outweigh_common_ones() {
        let context = "Your data is stored on servers. Your data is encrypted at rest. \
                       Location data is collected only with consent.";
        let extraction = LexicalExtractor::new()
            .extract("Do you collect location data?", context)
            .await
            .unwrap();

        assert_eq!(
            extraction.answer,
            "Location data is collected only with consent."
        );
    }

    #[tokio::test]
    async fn test_earliest_sentence_wins_ties() {
        let context = "Cookies are used for login. Cookies are used for analytics.";
        let extraction = LexicalExtractor::new()
            .extract("What are cookies used for?", context)
            .await
            .unwrap();

        assert_eq!(extraction.answer, "Cookies are used for login.");
        assert_eq!(extraction.start, 0);
    }

    #[tokio::test]
    async fn test_no_overlap_fails() {
        let err = LexicalExtractor::new()
            .extract("How long is payment information retained?", "We love cats and dogs.")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_stop_word_question_fails() {
        let err = LexicalExtractor::new()
            .extract("Is it?", "We love cats and dogs.")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExtractionFailed(_)));
    }
}
