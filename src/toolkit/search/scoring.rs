use std::collections::BTreeSet;

use super::terms::{normalize_phrase, TermCache};
use crate::models::Work;

/// Share of query terms present in the document, clamped to `[0, 1]`.
///
/// An empty query carries no signal and scores `0.0`.
pub fn score(document_terms: &BTreeSet<String>, query_terms: &BTreeSet<String>) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }

    let matches = document_terms
        .iter()
        .filter(|term| query_terms.contains(*term))
        .count();

    (matches as f64 / query_terms.len() as f64).min(1.0)
}

/// Document terms of a work: title, abstract and concept n-grams plus each
/// concept's whole normalized phrase.
pub fn work_terms(work: &Work, cache: &TermCache) -> BTreeSet<String> {
    let mut terms = cache.extract(&work.title);

    if let Some(text) = work.abstract_text.as_deref() {
        terms.extend(cache.extract(text));
    }

    for concept in &work.concepts {
        let phrase = normalize_phrase(concept);
        if !phrase.is_empty() {
            terms.insert(phrase);
        }
        terms.extend(cache.extract(concept));
    }

    terms
}

/// Expertise vocabulary a work contributes to each of its authors: its concepts
/// plus the terms of its abstract, all case-folded.
pub fn expertise_terms(work: &Work, cache: &TermCache) -> BTreeSet<String> {
    let mut terms: BTreeSet<String> = work
        .concepts
        .iter()
        .map(|c| normalize_phrase(c))
        .filter(|c| !c.is_empty())
        .collect();

    if let Some(text) = work.abstract_text.as_deref() {
        terms.extend(cache.extract(text));
    }

    terms
}


pub struct RelevanceScorer<'a> {
    query_terms: &'a BTreeSet<String>,
    cache: &'a TermCache,
}

impl<'a> RelevanceScorer<'a> {
    pub fn new(query_terms: &'a BTreeSet<String>, cache: &'a TermCache) -> Self {
        Self { query_terms, cache }
    }

    pub fn query_terms(&self) -> &BTreeSet<String> {
        self.query_terms
    }

    pub fn cache(&self) -> &TermCache {
        self.cache
    }

    /// Scores a work, returning its document terms alongside the score.
    pub fn score_work(&self, work: &Work) -> (BTreeSet<String>, f64) {
        let terms = work_terms(work, self.cache);
        let relevance = score(&terms, self.query_terms);
        (terms, relevance)
    }
}
