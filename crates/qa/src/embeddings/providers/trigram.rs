//! Hashed word + character-trigram embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use crate::text::content_terms;
use policylens_core::AppResult;
use std::collections::BTreeMap;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Seeds keep word and trigram features in separate hash streams.
const WORD_SEED: u8 = b'w';
const TRIGRAM_SEED: u8 = b't';

/// Weight of the whole-word feature relative to the sum of its trigrams.
const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Local, offline embedding model.
///
/// Each content term contributes a whole-word feature plus its boundary-padded
/// character trigrams, hashed into a fixed number of buckets. Term frequency is
/// dampened with a square root and the result is L2-normalised, so texts
/// sharing vocabulary (or word stems) land close together. Deterministic and
/// free of any model file.
#[derive(Debug)]
pub struct TrigramProvider {
    model: String,
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model: model.into(),
            dimensions: dimensions.max(1),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        // ordered so colliding buckets always sum in the same order
        let mut frequencies: BTreeMap<String, u32> = BTreeMap::new();
        for term in content_terms(text) {
            *frequencies.entry(term).or_insert(0) += 1;
        }

        for (term, count) in &frequencies {
            let tf = (*count as f32).sqrt();

            vector[self.bucket(WORD_SEED, term.as_bytes())] += WORD_WEIGHT * tf;

            let padded: Vec<char> = format!("^{}$", term).chars().collect();
            let trigrams = padded.len().saturating_sub(2);
            if trigrams == 0 {
                continue;
            }
            let per_trigram = TRIGRAM_WEIGHT * tf / trigrams as f32;
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(TRIGRAM_SEED, trigram.as_bytes())] += per_trigram;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }

    fn bucket(&self, seed: u8, bytes: &[u8]) -> usize {
        let hash = std::iter::once(seed)
            .chain(bytes.iter().copied())
            .fold(FNV_OFFSET, |acc, b| (acc ^ b as u64).wrapping_mul(FNV_PRIME));
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::cosine_similarity;

    fn provider() -> TrigramProvider {
        TrigramProvider::new("trigram-v2", 384)
    }

    #[tokio::test]
    async fn test_unit_length() {
        let embedding = provider().embed("We encrypt data at rest").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let p = provider();
        let a = p.embed("cookies track browsing").await.unwrap();
        let b = p.embed("cookies track browsing").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_many_terms_embed_bit_identically() {
        // few buckets force collisions between terms
        let p = TrigramProvider::new("trigram-v2", 16);
        let text = "We collect your name, email address, postal address, phone number, \
                    payment card details, purchase history, device identifiers, IP address, \
                    browser type, operating system, referring pages, location data, cookies, \
                    advertising identifiers, support messages, survey answers and marketing \
                    preferences to provide, secure, personalise and improve our services.";

        let first = p.embed(text).await.unwrap();
        for _ in 0..50 {
            let again = p.embed(text).await.unwrap();
            let same_bits = first
                .iter()
                .zip(&again)
                .all(|(a, b)| a.to_bits() == b.to_bits());
            assert!(same_bits);
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let p = provider();
        let texts = vec![
            "location data".to_string(),
            "payment details".to_string(),
        ];
        let batch = p.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], p.embed("location data").await.unwrap());
        assert_eq!(batch[1], p.embed("payment details").await.unwrap());
    }

    #[tokio::test]
    async fn test_stop_words_only_yields_zero_vector() {
        let embedding = provider().embed("do you have it").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let p = provider();
        let question = p
            .embed("Does this website share my personal data with third parties?")
            .await
            .unwrap();
        let related = p
            .embed("We do not sell or share your data with third parties.")
            .await
            .unwrap();
        let unrelated = p
            .embed("This page was last updated in January and applies to visitors.")
            .await
            .unwrap();

        assert!(cosine_similarity(&question, &related) > cosine_similarity(&question, &unrelated));
    }
}
