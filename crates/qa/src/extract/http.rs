//! Remote extractive QA model over HTTP.
//!
//! Speaks the Hugging Face `question-answering` inference contract, which is
//! also what most self-hosted reader servers (e.g. a `roberta-base-squad2`
//! deployment) accept:
//!
//! ```text
//! POST <endpoint>
//! {"inputs": {"question": "...", "context": "..."}}
//! -> {"answer": "...", "score": 0.93, "start": 12, "end": 40}
//! ```
//!
//! `start`/`end` are character offsets into the context.

use super::AnswerExtractor;
use crate::types::Extraction;
use policylens_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug)]
pub struct HttpExtractor {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Debug, Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct QaAnswer {
    answer: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
}

/// Some servers wrap the single answer in a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaResponse {
    One(QaAnswer),
    Many(Vec<QaAnswer>),
}

impl HttpExtractor {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::ModelUnavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    async fn query(&self, question: &str, context: &str) -> AppResult<QaAnswer> {
        let body = QaRequest {
            inputs: QaInputs { question, context },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExtractionFailed(format!("QA request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExtractionFailed(format!(
                "QA endpoint error ({}): {}",
                status, text
            )));
        }

        let parsed: QaResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExtractionFailed(format!("Failed to parse QA response: {}", e)))?;

        match parsed {
            QaResponse::One(answer) => Ok(answer),
            QaResponse::Many(answers) => answers
                .into_iter()
                .max_by(|a, b| {
                    a.score
                        .unwrap_or(0.0)
                        .total_cmp(&b.score.unwrap_or(0.0))
                })
                .ok_or_else(|| AppError::ExtractionFailed("QA endpoint returned no answers".to_string())),
        }
    }
}

/// Convert a character offset into a byte offset within `text`.
fn char_to_byte(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == text.chars().count() {
        return Some(text.len());
    }
    text.char_indices().nth(char_offset).map(|(byte, _)| byte)
}

/// Map a model answer onto the context so the span is always a verbatim slice.
///
/// Offsets win when they agree with the answer text; otherwise the first
/// occurrence of the answer text is used.
fn locate_span(context: &str, answer: &QaAnswer) -> Option<(usize, usize)> {
    let wanted = answer.answer.trim();
    if wanted.is_empty() {
        return None;
    }

    if let (Some(start), Some(end)) = (answer.start, answer.end) {
        let bytes = char_to_byte(context, start).zip(char_to_byte(context, end));
        if let Some((s, e)) = bytes {
            if let Some(slice) = context.get(s..e) {
                let lead = slice.len() - slice.trim_start().len();
                let trimmed = slice.trim();
                if trimmed == wanted {
                    return Some((s + lead, s + lead + trimmed.len()));
                }
            }
        }
    }

    context
        .find(wanted)
        .map(|start| (start, start + wanted.len()))
}

#[async_trait::async_trait]
impl AnswerExtractor for HttpExtractor {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, question, context), fields(endpoint = %self.endpoint, context_len = context.len()))]
    async fn extract(&self, question: &str, context: &str) -> AppResult<Extraction> {
        let answer = self.query(question, context).await?;

        // SQuAD2-style models answer "" when the context has no answer.
        let (start, end) = locate_span(context, &answer).ok_or_else(|| {
            AppError::ExtractionFailed(format!(
                "QA model answer {:?} is not a span of the context",
                answer.answer
            ))
        })?;

        Ok(Extraction {
            answer: context[start..end].to_string(),
            score: answer.score,
            start,
            end,
        })
    }
}
