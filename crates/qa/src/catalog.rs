//! Reference questions.
//!
//! The major questions are answered for every analyzed policy, in order. The
//! whole catalog is embedded once per session so free-text questions can be
//! matched to the closest reference question.

use crate::embeddings::EmbeddingService;
use crate::rank::cosine_similarity;
use policylens_core::AppResult;

pub const MAJOR_QUESTIONS: [&str; 4] = [
    "Does this website share my personal data with third parties?",
    "What types of data does this website collect?",
    "How long does the website store my personal information?",
    "If I delete my account, will my data be removed or stored?",
];

pub const SUGGESTED_QUESTIONS: [&str; 6] = [
    "Does this website use cookies to track my data?",
    "Can this website sell my data to advertisers?",
    "Does this website track my location?",
    "Is my data stored securely?",
    "Can I request to delete all my personal data?",
    "Does this website share my payment details with others?",
];

/// All reference questions, major first.
pub fn all_questions() -> impl Iterator<Item = &'static str> {
    MAJOR_QUESTIONS.iter().chain(SUGGESTED_QUESTIONS.iter()).copied()
}

/// A catalog question and how close it is to some query.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMatch {
    pub question: &'static str,
    pub similarity: f32,
}

/// Catalog with precomputed embeddings.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    entries: Vec<(&'static str, Vec<f32>)>,
}

impl QuestionCatalog {
    /// Embed every reference question.
    pub async fn build(embeddings: &EmbeddingService) -> AppResult<Self> {
        let questions: Vec<&'static str> = all_questions().collect();
        let texts: Vec<String> = questions.iter().map(|q| q.to_string()).collect();
        let vectors = embeddings.encode(&texts).await?;

        tracing::debug!("Embedded {} reference questions", questions.len());

        Ok(Self {
            entries: questions.into_iter().zip(vectors).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closest reference question to `vector`; the first entry wins ties.
    pub fn nearest(&self, vector: &[f32]) -> Option<ReferenceMatch> {
        let mut best: Option<ReferenceMatch> = None;

        for (question, reference) in &self.entries {
            if reference.len() != vector.len() {
                continue;
            }
            let similarity = cosine_similarity(vector, reference);
            if best.as_ref().map_or(true, |b| similarity > b.similarity) {
                best = Some(ReferenceMatch {
                    question,
                    similarity,
                });
            }
        }

        best
    }
}
