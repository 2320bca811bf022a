use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ranking::{sort_ranked, Ranked};
use super::terms::normalize_phrase;
use crate::models::{Article, Expert};

/// A ranked entity whose own vocabulary can be checked against disciplines.
pub trait Combinable: Ranked {
    fn discipline_terms(&self) -> Vec<&str>;

    fn set_relevance(&mut self, score: f64);
}

impl Combinable for Expert {
    fn discipline_terms(&self) -> Vec<&str> {
        self.expertise_areas.iter().map(String::as_str).collect()
    }

    fn set_relevance(&mut self, score: f64) {
        self.relevance_score = score;
    }
}

impl Combinable for Article {
    fn discipline_terms(&self) -> Vec<&str> {
        self.work
            .concepts
            .iter()
            .chain(self.keywords.iter())
            .map(String::as_str)
            .collect()
    }

    fn set_relevance(&mut self, score: f64) {
        self.relevance_score = score;
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombineOptions {
    pub require_all: bool,
    pub confirmed_score: f64,
    pub partial_credit_weight: f64,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            require_all: false,
            confirmed_score: 1.0,
            partial_credit_weight: 0.5,
        }
    }
}

impl CombineOptions {
    pub fn require_all() -> Self {
        Self {
            require_all: true,
            ..Default::default()
        }
    }

    pub fn any() -> Self {
        Self::default()
    }
}

/// One term set per discipline name; blank names are dropped.
pub fn discipline_term_sets<S: AsRef<str>>(disciplines: &[S]) -> Vec<BTreeSet<String>> {
    disciplines
        .iter()
        .map(|d| normalize_phrase(d.as_ref()))
        .filter(|d| !d.is_empty())
        .map(|d| BTreeSet::from([d]))
        .collect()
}

/// Per discipline: does any discipline term occur inside any entity term.
pub fn discipline_matches<T: Combinable>(entity: &T, disciplines: &[BTreeSet<String>]) -> Vec<bool> {
    let entity_terms: Vec<String> = entity
        .discipline_terms()
        .into_iter()
        .map(normalize_phrase)
        .collect();

    disciplines
        .iter()
        .map(|terms| {
            terms
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .any(|t| entity_terms.iter().any(|e| e.contains(&t)))
        })
        .collect()
}


pub fn combine<T: Combinable>(
    primary: Vec<T>,
    disciplines: &[BTreeSet<String>],
    options: CombineOptions,
) -> Vec<T> {
    let mut combined = if disciplines.is_empty() {
        primary
    } else {
        let total = disciplines.len() as f64;
        primary
            .into_iter()
            .filter_map(|mut entity| {
                let matched = discipline_matches(&entity, disciplines)
                    .into_iter()
                    .filter(|m| *m)
                    .count();

                if options.require_all {
                    if matched < disciplines.len() {
                        return None;
                    }
                    entity.set_relevance(options.confirmed_score);
                    return Some(entity);
                }

                let original = entity.relevance();
                if matched == 0 {
                    return (original > 0.0).then_some(entity);
                }
                let boosted = original + options.partial_credit_weight * (matched as f64 / total);
                entity.set_relevance(boosted.min(1.0));
                Some(entity)
            })
            .collect()
    };

    sort_ranked(&mut combined);
    debug!(
        "Combined into {} results across {} disciplines (require_all={})",
        combined.len(),
        disciplines.len(),
        options.require_all
    );
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Work, WorkSummary};

    fn expert(name: &str, relevance: f64, citations: u64, areas: &[&str]) -> Expert {
        let summary = WorkSummary {
            id: format!("{name}-w"),
            title: "t".into(),
            publication_date: None,
            year: None,
            citation_count: citations,
            doi: None,
            relevance_score: relevance,
        };
        Expert::from_first_work(
            format!("author:{name}"),
            name,
            None,
            summary,
            areas.iter().map(|s| s.to_string()),
        )
    }

    fn names(experts: &[Expert]) -> Vec<&str> {
        experts.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_require_all_drops_partial_match() {
        let disciplines = discipline_term_sets(&["Biology", "Economics"]);
        let experts = vec![
            expert("partial", 0.9, 10, &["computational biology"]),
            expert("full", 0.2, 10, &["molecular biology", "health economics"]),
        ];

        let combined = combine(experts, &disciplines, CombineOptions::require_all());

        assert_eq!(names(&combined), vec!["full"]);
        assert_eq!(combined[0].relevance_score, 1.0);
    }

    #[test]
    fn test_any_mode_partial_credit() {
        let disciplines = discipline_term_sets(&["biology", "economics"]);
        let experts = vec![
            expert("one", 0.2, 10, &["biology"]),
            expert("both", 0.2, 10, &["biology", "economics"]),
        ];

        let combined = combine(experts, &disciplines, CombineOptions::any());

        assert_eq!(names(&combined), vec!["both", "one"]);
        assert!((combined[0].relevance_score - 0.7).abs() < 1e-9);
        assert!((combined[1].relevance_score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_any_mode_keeps_relevant_unmatched_and_drops_irrelevant() {
        let disciplines = discipline_term_sets(&["economics"]);
        let experts = vec![
            expert("relevant", 0.4, 10, &["physics"]),
            expert("irrelevant", 0.0, 10, &["physics"]),
        ];

        let combined = combine(experts, &disciplines, CombineOptions::any());

        assert_eq!(names(&combined), vec!["relevant"]);
        assert_eq!(combined[0].relevance_score, 0.4);
    }

    #[test]
    fn test_any_mode_score_is_clamped() {
        let disciplines = discipline_term_sets(&["economics"]);
        let combined = combine(
            vec![expert("top", 0.9, 1, &["economics"])],
            &disciplines,
            CombineOptions::any(),
        );
        assert_eq!(combined[0].relevance_score, 1.0);
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let disciplines = vec![BTreeSet::from(["Neuro".to_string()])];
        let e = expert("x", 0.1, 1, &["computational neuroscience"]);
        assert_eq!(discipline_matches(&e, &disciplines), vec![true]);
    }

    #[test]
    fn test_no_disciplines_returns_resorted_input() {
        let experts = vec![expert("low", 0.1, 1, &[]), expert("high", 0.8, 1, &[])];
        let combined = combine(experts, &[], CombineOptions::require_all());
        assert_eq!(names(&combined), vec!["high", "low"]);
        assert_eq!(combined[0].relevance_score, 0.8);
    }

    #[test]
    fn test_citation_tie_break_after_combining() {
        let disciplines = discipline_term_sets(&["ecology"]);
        let experts = vec![
            expert("few", 0.3, 5, &["ecology"]),
            expert("many", 0.3, 500, &["ecology"]),
        ];
        let combined = combine(experts, &disciplines, CombineOptions::require_all());
        assert_eq!(names(&combined), vec!["many", "few"]);
    }

    #[test]
    fn test_articles_match_on_concepts_and_keywords() {
        let disciplines = discipline_term_sets(&["machine learning", "genomics"]);
        let article = Article::new(
            Work::new("w1", "t").with_concepts(["Genomics"]),
            BTreeSet::from(["machine learning".to_string()]),
            0.3,
        );
        let combined = combine(vec![article], &disciplines, CombineOptions::require_all());
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].relevance_score, 1.0);
    }

    #[test]
    fn test_blank_disciplines_dropped() {
        assert_eq!(discipline_term_sets(&["  ", "Physics"]).len(), 1);
    }
}
