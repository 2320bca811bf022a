use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::work::Work;
use crate::utils::safe_truncate_ellipsis;

pub const SUMMARY_TERMS: usize = 5;

const ABSTRACT_SNIPPET_CHARS: usize = 280;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(flatten)]
    pub work: Work,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    pub relevance_score: f64,
}

impl Article {
    pub fn new(work: Work, keywords: BTreeSet<String>, relevance_score: f64) -> Self {
        Self {
            work,
            keywords,
            relevance_score,
        }
    }

    pub fn id(&self) -> &str {
        &self.work.id
    }

    pub fn citation_count(&self) -> u64 {
        self.work.citation_count
    }

    /// Concepts first, then the most specific keywords (longest n-grams).
    pub fn top_terms(&self, limit: usize) -> Vec<String> {
        let mut terms: Vec<String> = Vec::with_capacity(limit);

        let mut keywords: Vec<&String> = self.keywords.iter().collect();
        keywords.sort_by(|a, b| {
            b.split(' ')
                .count()
                .cmp(&a.split(' ').count())
                .then_with(|| a.cmp(b))
        });

        let candidates = self
            .work
            .concepts
            .iter()
            .map(|c| c.to_lowercase())
            .chain(keywords.into_iter().cloned());

        for term in candidates {
            if terms.len() >= limit {
                break;
            }
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        terms
    }

    pub fn to_summary(&self) -> ArticleSummary {
        ArticleSummary {
            id: self.work.id.clone(),
            title: self.work.title.clone(),
            authors: self.work.authors.iter().map(|a| a.display_name.clone()).collect(),
            publication_date: self.work.publication_date,
            doi: self.work.doi.clone(),
            citation_count: self.work.citation_count,
            relevance_score: self.relevance_score,
            top_terms: self.top_terms(SUMMARY_TERMS),
            abstract_snippet: self
                .work
                .abstract_text
                .as_deref()
                .map(|text| safe_truncate_ellipsis(text, ABSTRACT_SNIPPET_CHARS)),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub publication_date: Option<NaiveDate>,
    pub doi: Option<String>,
    pub citation_count: u64,
    pub relevance_score: f64,
    pub top_terms: Vec<String>,
    pub abstract_snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_top_terms_prefers_concepts_then_longest_keywords() {
        let work = Work::new("W1", "Quantum error correction")
            .with_concepts(["Physics", "Quantum Computing"]);
        let article = Article::new(
            work,
            keywords(&["quantum", "error correction", "quantum error correction", "physics"]),
            0.5,
        );

        assert_eq!(
            article.top_terms(4),
            vec![
                "physics".to_string(),
                "quantum computing".to_string(),
                "quantum error correction".to_string(),
                "error correction".to_string(),
            ]
        );
    }

    #[test]
    fn test_summary_truncates_abstract() {
        let work = Work::new("W1", "Long").with_abstract("x".repeat(400)).with_authors(["Ada Lovelace"]);
        let summary = Article::new(work, BTreeSet::new(), 0.2).to_summary();
        let snippet = summary.abstract_snippet.unwrap();
        assert_eq!(snippet.chars().count(), ABSTRACT_SNIPPET_CHARS + 3);
        assert_eq!(summary.authors, vec!["Ada Lovelace".to_string()]);
    }

    #[test]
    fn test_flattened_serialization() {
        let article = Article::new(Work::new("W9", "Flat"), BTreeSet::new(), 1.0);
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["id"], "W9");
        assert_eq!(json["relevance_score"], 1.0);
    }
}
