//! Question-answering type definitions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Text shown when a question could not be answered from the document.
pub const NO_ANSWER_TEXT: &str = "No answer found in this policy.";

/// Text shown when the document has nothing to analyze.
pub const NO_CONTENT_TEXT: &str = "Cannot analyze this document: no usable passages.";

/// An immutable policy document.
///
/// Cloning is cheap; the text is shared.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    text: Arc<str>,
    fingerprint: String,
}

impl Document {
    /// Create a document from its logical name (usually the site host) and text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text: String = text.into();
        let fingerprint = format!("{:x}", Sha256::digest(text.as_bytes()));

        Self {
            name: name.into(),
            text: Arc::from(text),
            fingerprint,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// SHA-256 of the text, hex encoded. Identical text means identical passages.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// A trimmed block of document text used as one retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Position in the document's passage sequence (0-indexed)
    pub index: usize,

    /// Verbatim text, already trimmed
    pub text: String,

    /// Byte range of `text` within the document
    pub byte_range: (usize, usize),
}

/// A passage paired with its cosine similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPassage {
    pub passage: Passage,

    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// Span picked by an answer extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Verbatim substring of the context
    pub answer: String,

    /// Model confidence, when the extractor reports one
    pub score: Option<f32>,

    /// Byte offsets of `answer` within the context
    pub start: usize,
    pub end: usize,
}

/// How a question was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// An answer span was extracted
    Answered,

    /// The extractor found no span for this question
    NoAnswer,

    /// The document produced no passages at all
    NoContent,
}

/// Answer to one question about one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question: String,

    /// Answer text, or a fixed explanation when unanswered
    pub answer: String,

    /// Extractor confidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Passages merged into the extractor context, best first
    pub sources: Vec<RankedPassage>,

    pub outcome: AnswerOutcome,
}

impl AnswerResult {
    /// Build a result from an extracted span and the passages it came from.
    pub fn answered(
        question: impl Into<String>,
        extraction: Extraction,
        sources: Vec<RankedPassage>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: extraction.answer,
            score: extraction.score,
            sources,
            outcome: AnswerOutcome::Answered,
        }
    }

    /// The extractor came back empty-handed.
    pub fn no_answer(question: impl Into<String>, sources: Vec<RankedPassage>) -> Self {
        Self {
            question: question.into(),
            answer: NO_ANSWER_TEXT.to_string(),
            score: None,
            sources,
            outcome: AnswerOutcome::NoAnswer,
        }
    }

    /// The document had nothing to rank.
    pub fn no_content(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: NO_CONTENT_TEXT.to_string(),
            score: None,
            sources: Vec::new(),
            outcome: AnswerOutcome::NoContent,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.outcome == AnswerOutcome::Answered
    }
}
