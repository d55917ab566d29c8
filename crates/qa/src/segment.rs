//! Passage segmentation.
//!
//! A passage is a block of consecutive non-blank lines. Any run of blank or
//! whitespace-only lines is a single boundary, so the stray empty paragraphs
//! left by HTML extraction never split a section in two.

use crate::types::Passage;

/// Passages this short or shorter (in characters, after trimming) are noise:
/// headings, single words, cookie-banner buttons.
pub const MIN_PASSAGE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    min_chars: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(MIN_PASSAGE_CHARS)
    }
}

impl Segmenter {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// Split document text into ordered passages.
    ///
    /// Each passage is a trimmed, verbatim slice of `text` whose byte range is
    /// recorded. Indices are contiguous from 0 after filtering.
    pub fn segment(&self, text: &str) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut block: Option<(usize, usize)> = None;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            if line.trim().is_empty() {
                if let Some(range) = block.take() {
                    self.push_block(text, range, &mut passages);
                }
            } else {
                let end = offset + line.len();
                block = Some(match block {
                    Some((start, _)) => (start, end),
                    None => (offset, end),
                });
            }
            offset += line.len();
        }

        if let Some(range) = block {
            self.push_block(text, range, &mut passages);
        }

        tracing::debug!(
            "Segmented {} bytes into {} passages",
            text.len(),
            passages.len()
        );

        passages
    }

    fn push_block(&self, text: &str, (start, end): (usize, usize), passages: &mut Vec<Passage>) {
        let raw = &text[start..end];
        let trimmed = raw.trim();

        if trimmed.chars().count() <= self.min_chars {
            return;
        }

        let lead = raw.len() - raw.trim_start().len();
        let begin = start + lead;

        passages.push(Passage {
            index: passages.len(),
            text: trimmed.to_string(),
            byte_range: (begin, begin + trimmed.len()),
        });
    }
}

/// Segment with the default minimum length.
pub fn segment(text: &str) -> Vec<Passage> {
    Segmenter::default().segment(text)
}
