//! Privacy policy question answering.
//!
//! - Passage segmentation and embedding-based ranking
//! - Extractive answers over the best passages
//! - Keyword risk scoring
//! - The reference question catalog

pub mod catalog;
pub mod embeddings;
pub mod engine;
pub mod extract;
pub mod rank;
pub mod risk;
pub mod segment;
pub mod text;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use catalog::{QuestionCatalog, ReferenceMatch, MAJOR_QUESTIONS, SUGGESTED_QUESTIONS};
pub use embeddings::EmbeddingService;
pub use engine::QueryEngine;
pub use extract::{AnswerExtractor, ExtractionService};
pub use rank::PassageRanker;
pub use risk::{RiskReport, RiskScore, RuleSet};
pub use segment::Segmenter;
pub use types::{AnswerOutcome, AnswerResult, Document, Passage, RankedPassage};
