//! Passage ranking by cosine similarity.

use crate::embeddings::EmbeddingService;
use crate::types::{Passage, RankedPassage};
use policylens_core::{AppError, AppResult};
use std::cmp::Ordering;

/// Number of passages merged into the extractor context when not configured.
pub const DEFAULT_TOP_K: usize = 3;

/// Cosine similarity between two vectors.
///
/// Defined as 0 when either vector has zero magnitude. Callers must pass
/// vectors of equal length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Best-first order: higher score first, then lower passage index.
fn best_first(a: &RankedPassage, b: &RankedPassage) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.passage.index.cmp(&b.passage.index))
}

/// Score passages against a query vector and keep the best `k`.
///
/// Pure part of ranking, separated so the ordering contract can be tested
/// with hand-made vectors.
pub fn select_top_k(
    query: &[f32],
    passages: &[Passage],
    vectors: &[Vec<f32>],
    k: usize,
) -> AppResult<Vec<RankedPassage>> {
    if passages.len() != vectors.len() {
        return Err(AppError::InvalidEmbedding(format!(
            "{} passages but {} vectors",
            passages.len(),
            vectors.len()
        )));
    }

    if let Some(bad) = vectors.iter().find(|v| v.len() != query.len()) {
        return Err(AppError::InvalidEmbedding(format!(
            "Passage vector has dimension {}, query has {}",
            bad.len(),
            query.len()
        )));
    }

    let mut ranked: Vec<RankedPassage> = passages
        .iter()
        .zip(vectors)
        .map(|(passage, vector)| RankedPassage {
            passage: passage.clone(),
            score: cosine_similarity(query, vector),
        })
        .collect();

    ranked.sort_by(best_first);
    ranked.truncate(k);

    Ok(ranked)
}

/// Ranks a document's passages against a question.
#[derive(Debug, Clone)]
pub struct PassageRanker {
    embeddings: EmbeddingService,
}

impl PassageRanker {
    pub fn new(embeddings: EmbeddingService) -> Self {
        Self { embeddings }
    }

    /// Return the `k` passages most similar to `query`, best first.
    ///
    /// An empty passage set is `NoContentAvailable`.
    pub async fn rank(
        &self,
        query: &str,
        passages: &[Passage],
        k: usize,
    ) -> AppResult<Vec<RankedPassage>> {
        if passages.is_empty() {
            return Err(AppError::NoContentAvailable(
                "Document has no passages to rank".to_string(),
            ));
        }

        let query_vector = self.embeddings.encode_one(query).await?;

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let passage_vectors = self.embeddings.encode(&texts).await?;

        let ranked = select_top_k(&query_vector, passages, &passage_vectors, k)?;

        tracing::debug!(
            "Ranked {} passages, kept {} (best score: {:.3})",
            passages.len(),
            ranked.len(),
            ranked.first().map(|r| r.score).unwrap_or(0.0)
        );

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::segment::segment;
    use std::sync::Arc;
    use std::time::Duration;

    fn passage(index: usize, text: &str) -> Passage {
        Passage {
            index,
            text: text.to_string(),
            byte_range: (0, text.len()),
        }
    }

    fn ranker() -> PassageRanker {
        PassageRanker::new(EmbeddingService::from_provider(
            Arc::new(TrigramProvider::new("trigram-v2", 384)),
            Duration::from_secs(5),
        ))
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let a = vec![0.3, -1.2, 4.0, 0.01];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = vec![0.5, 0.1, -0.7];
        let b = vec![-0.2, 0.9, 0.4];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        let zero = vec![0.0, 0.0, 0.0];
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_select_top_k_orders_best_first() {
        let passages = vec![
            passage(0, "A"),
            passage(1, "B"),
            passage(2, "C"),
            passage(3, "D"),
        ];
        let vectors = vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.7, 0.7],
            vec![-1.0, 0.0],
        ];

        let ranked = select_top_k(&[1.0, 0.0], &passages, &vectors, 3).unwrap();

        let order: Vec<usize> = ranked.iter().map(|r| r.passage.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_select_top_k_ties_break_by_index() {
        let passages = vec![passage(0, "A"), passage(1, "B"), passage(2, "C")];
        let same = vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]];

        let ranked = select_top_k(&[1.0, 1.0], &passages, &same, 2).unwrap();
        let order: Vec<usize> = ranked.iter().map(|r| r.passage.index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_select_top_k_bounds() {
        let passages = vec![passage(0, "A"), passage(1, "B")];
        let vectors = vec![vec![1.0], vec![0.5]];

        assert_eq!(select_top_k(&[1.0], &passages, &vectors, 10).unwrap().len(), 2);
        assert_eq!(select_top_k(&[1.0], &passages, &vectors, 1).unwrap().len(), 1);
        assert!(select_top_k(&[1.0], &passages, &vectors, 0).unwrap().is_empty());
    }

    #[test]
    fn test_select_top_k_rejects_dimension_mismatch() {
        let passages = vec![passage(0, "A")];
        let vectors = vec![vec![1.0, 0.0, 0.0]];

        let err = select_top_k(&[1.0, 0.0], &passages, &vectors, 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidEmbedding(_)));
    }

    #[tokio::test]
    async fn test_rank_empty_is_no_content() {
        let err = ranker().rank("anything", &[], 3).await.unwrap_err();
        assert!(matches!(err, AppError::NoContentAvailable(_)));
    }

    #[tokio::test]
    async fn test_rank_respects_k_and_threshold() {
        let text = "We collect your name and email address when you register.\n\n\
                    OK\n\n\
                    Cookies help us remember your preferences between visits.\n\n\
                    We may share data with payment processors to complete orders.\n\n\
                    You can request deletion of your account at any time.";
        let passages = segment(text);
        assert_eq!(passages.len(), 4);

        let ranked = ranker()
            .rank("Can I delete my account?", &passages, 3)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.passage.text.trim().chars().count() > 10));
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(ranked[0].passage.text.contains("deletion of your account"));
    }
}
