//! Query engine: segment, rank, extract.

use crate::catalog::{QuestionCatalog, ReferenceMatch};
use crate::embeddings::EmbeddingService;
use crate::extract::{merge_context, ExtractionService};
use crate::rank::PassageRanker;
use crate::segment::Segmenter;
use crate::types::{AnswerResult, Document, Passage};
use futures::stream::{self, StreamExt, TryStreamExt};
use policylens_core::{AppConfig, AppError, AppResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::instrument;

/// Documents whose passages stay cached before the oldest is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Segmented documents keyed by fingerprint, evicted oldest first.
#[derive(Debug)]
struct PassageCache {
    entries: HashMap<String, Arc<[Passage]>>,
    order: VecDeque<String>,
    capacity: usize,
}

impl PassageCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, fingerprint: &str) -> Option<Arc<[Passage]>> {
        self.entries.get(fingerprint).cloned()
    }

    fn insert(&mut self, fingerprint: &str, passages: Arc<[Passage]>) {
        while self.order.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!("Evicted passages of document {}", oldest);
        }

        self.order.push_back(fingerprint.to_string());
        self.entries.insert(fingerprint.to_string(), passages);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Answers questions about documents.
///
/// Models are loaded once and shared by every query. Passages are computed
/// once per distinct document text and cached by fingerprint, holding at most
/// `DEFAULT_CACHE_CAPACITY` documents unless changed with
/// [`QueryEngine::with_cache_capacity`].
#[derive(Debug)]
pub struct QueryEngine {
    embeddings: EmbeddingService,
    ranker: PassageRanker,
    extractor: ExtractionService,
    segmenter: Segmenter,
    top_k: usize,
    catalog: QuestionCatalog,
    passages: Mutex<PassageCache>,
}

impl QueryEngine {
    /// Load both models and embed the reference questions.
    pub async fn load(config: &AppConfig) -> AppResult<Self> {
        let embeddings = EmbeddingService::load(&config.embedding, &config.timeouts).await?;
        let extractor = ExtractionService::load(
            &config.extractor,
            &config.timeouts,
            config.resolve_extractor_key(),
        )?;

        Self::new(
            embeddings,
            extractor,
            Segmenter::new(config.retrieval.min_passage_chars),
            config.retrieval.top_k,
        )
        .await
    }

    pub async fn new(
        embeddings: EmbeddingService,
        extractor: ExtractionService,
        segmenter: Segmenter,
        top_k: usize,
    ) -> AppResult<Self> {
        if top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        let catalog = QuestionCatalog::build(&embeddings).await?;

        tracing::info!(
            "Query engine ready: embeddings={}, extractor={}, top_k={}",
            embeddings.model_name(),
            extractor.name(),
            top_k
        );

        Ok(Self {
            ranker: PassageRanker::new(embeddings.clone()),
            embeddings,
            extractor,
            segmenter,
            top_k,
            catalog,
            passages: Mutex::new(PassageCache::new(DEFAULT_CACHE_CAPACITY)),
        })
    }

    /// Keep passages of at most `capacity` documents (minimum 1).
    pub fn with_cache_capacity(self, capacity: usize) -> Self {
        Self {
            passages: Mutex::new(PassageCache::new(capacity)),
            ..self
        }
    }

    /// Passages of `document`, segmenting on first use.
    fn passages(&self, document: &Document) -> Arc<[Passage]> {
        let mut cache = self.passages.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(passages) = cache.get(document.fingerprint()) {
            return passages;
        }

        let passages: Arc<[Passage]> = self.segmenter.segment(document.text()).into();
        cache.insert(document.fingerprint(), Arc::clone(&passages));
        passages
    }

    /// Segment `document` ahead of the first question.
    ///
    /// Fails with `NoContentAvailable` when it yields no passages.
    pub fn prepare(&self, document: &Document) -> AppResult<Arc<[Passage]>> {
        let passages = self.passages(document);
        if passages.is_empty() {
            return Err(AppError::NoContentAvailable(format!(
                "'{}' has no passages longer than the minimum length",
                document.name()
            )));
        }

        tracing::info!("Prepared '{}': {} passages", document.name(), passages.len());
        Ok(passages)
    }

    /// Answer one question.
    ///
    /// Missing content and failed extraction become unanswered results; only
    /// model and embedding failures are returned as errors.
    #[instrument(skip(self, document), fields(document = document.name()))]
    pub async fn answer(&self, question: &str, document: &Document) -> AppResult<AnswerResult> {
        let passages = self.passages(document);

        let ranked = match self.ranker.rank(question, &passages, self.top_k).await {
            Ok(ranked) => ranked,
            Err(AppError::NoContentAvailable(reason)) => {
                tracing::warn!("No content to answer from: {}", reason);
                return Ok(AnswerResult::no_content(question));
            }
            Err(e) => return Err(e),
        };

        let context = merge_context(&ranked);

        match self.extractor.extract(question, &context).await {
            Ok(extraction) => Ok(AnswerResult::answered(question, extraction, ranked)),
            Err(AppError::ExtractionFailed(reason)) => {
                tracing::warn!("No answer extracted: {}", reason);
                Ok(AnswerResult::no_answer(question, ranked))
            }
            Err(e) => Err(e),
        }
    }

    /// Answer several questions about one document, in input order.
    pub async fn batch_answer<S: AsRef<str>>(
        &self,
        questions: &[S],
        document: &Document,
    ) -> AppResult<Vec<AnswerResult>> {
        stream::iter(questions)
            .then(|question| self.answer(question.as_ref(), document))
            .try_collect()
            .await
    }

    /// Closest reference question to `question`.
    pub async fn nearest_reference(&self, question: &str) -> AppResult<Option<ReferenceMatch>> {
        let vector = self.embeddings.encode_one(question).await?;
        Ok(self.catalog.nearest(&vector))
    }

    /// Number of distinct documents segmented so far.
    pub fn cached_documents(&self) -> usize {
        self.passages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
