use std::collections::BTreeSet;

use super::stopwords::is_stopword;


pub const MIN_WORD_CHARS: usize = 3;

pub const MAX_NGRAM: usize = 3;


fn trim_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Lower-cased words with edge punctuation removed. No length or stopword filtering.
fn raw_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(trim_word)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Words that survive the length and stopword filters, in text order.
///
/// Stopwords are removed here, before n-grams are built, so no bigram or
/// trigram can consist solely of stopwords.
pub fn content_words(text: &str) -> Vec<String> {
    raw_words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS && !is_stopword(w))
        .collect()
}


pub fn extract_terms(text: &str) -> BTreeSet<String> {
    let words = content_words(text);
    let mut terms = BTreeSet::new();

    for n in 1..=MAX_NGRAM {
        for window in words.windows(n) {
            terms.insert(window.join(" "));
        }
    }

    terms
}

/// The normalized form of a whole phrase, used for query terms, concepts and
/// discipline names. Words are filtered exactly as in `extract_terms`, so a
/// phrase of up to `MAX_NGRAM` content words equals the n-gram extracted from
/// the same words in a document.
pub fn normalize_phrase(text: &str) -> String {
    content_words(text).join(" ")
}

/// Case and whitespace folded text with every word kept.
pub fn fold_text(text: &str) -> String {
    raw_words(text).join(" ")
}


#[derive(Debug, Default, Clone, Copy)]
pub struct TermExtractor;

impl TermExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        extract_terms(text)
    }
}
