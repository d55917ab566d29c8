//! Term normalization shared by the local embedding model and the lexical extractor.

use unicode_segmentation::UnicodeSegmentation;

/// Words that carry no meaning for matching questions against policy text.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "does", "do", "did", "what", "how", "will", "can",
    "my", "your", "our", "we", "you", "me", "us", "if", "when", "who", "any", "all", "about",
    "there", "these", "those", "such", "into", "than", "then", "also", "may", "would", "should",
];

/// Split text into normalized content terms, in order of appearance.
///
/// Lowercases, keeps alphanumeric word segments, drops stop words and words of
/// two characters or fewer, and folds simple English plurals.
pub fn content_terms(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .map(|w| fold_plural(&w))
        .collect()
}

fn fold_plural(word: &str) -> String {
    let word = word.strip_suffix("'s").unwrap_or(word);

    if word.chars().count() <= 3 {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }

    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}
