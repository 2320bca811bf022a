use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use super::author_key::{AuthorKey, AuthorKeyStrategy, NormalizedNameKey};
use crate::models::{Expert, Work};
use crate::toolkit::search::ranking::sort_ranked;
use crate::toolkit::search::scoring::{expertise_terms, RelevanceScorer};
use crate::toolkit::search::terms::TermCache;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorState {
    Unseen,
    Accumulating,
}


#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregationStats {
    pub works_folded: usize,
    pub works_without_authors: usize,
    pub authors: usize,
}

/// Folds a stream of works into per-author `Expert` profiles.
///
/// Profiles are kept in first-seen order so that equal-ranked experts come out
/// in a deterministic order.
pub struct ExpertAggregator<'a> {
    scorer: RelevanceScorer<'a>,
    key_strategy: Arc<dyn AuthorKeyStrategy>,
    index: HashMap<AuthorKey, usize>,
    experts: Vec<Expert>,
    stats: AggregationStats,
}

impl<'a> ExpertAggregator<'a> {
    pub fn new(query_terms: &'a BTreeSet<String>, cache: &'a TermCache) -> Self {
        Self {
            scorer: RelevanceScorer::new(query_terms, cache),
            key_strategy: Arc::new(NormalizedNameKey),
            index: HashMap::new(),
            experts: Vec::new(),
            stats: AggregationStats::default(),
        }
    }

    pub fn with_key_strategy(mut self, strategy: Arc<dyn AuthorKeyStrategy>) -> Self {
        self.key_strategy = strategy;
        self
    }

    pub fn state_of(&self, key: &AuthorKey) -> AuthorState {
        if self.index.contains_key(key) {
            AuthorState::Accumulating
        } else {
            AuthorState::Unseen
        }
    }

    pub fn get(&self, key: &AuthorKey) -> Option<&Expert> {
        self.index.get(key).map(|&i| &self.experts[i])
    }

    pub fn stats(&self) -> AggregationStats {
        AggregationStats {
            authors: self.experts.len(),
            ..self.stats
        }
    }

    pub fn fold(&mut self, work: &Work) {
        if work.authors.is_empty() {
            debug!("Work {} has no authors, skipping aggregation", work.id);
            self.stats.works_without_authors += 1;
            return;
        }

        let (_, relevance) = self.scorer.score_work(work);
        let terms = expertise_terms(work, self.scorer.cache());
        let summary = work.summary(relevance);

        let mut seen_in_work: HashSet<AuthorKey> = HashSet::new();
        for author in &work.authors {
            let Some(key) = self.key_strategy.key(author) else {
                debug!("Unkeyable author on work {}", work.id);
                continue;
            };
            if !seen_in_work.insert(key.clone()) {
                continue;
            }

            let existing = self.index.get(&key).copied();
            match existing {
                Some(i) => {
                    self.experts[i].absorb(
                        author.institution.as_deref(),
                        summary.clone(),
                        terms.iter().cloned(),
                    );
                }
                None => {
                    let expert = Expert::from_first_work(
                        key.as_str(),
                        author.display_name.trim(),
                        author.institution.clone(),
                        summary.clone(),
                        terms.iter().cloned(),
                    );
                    self.index.insert(key, self.experts.len());
                    self.experts.push(expert);
                }
            }
        }

        self.stats.works_folded += 1;
    }

    pub fn fold_all<'w>(&mut self, works: impl IntoIterator<Item = &'w Work>) {
        for work in works {
            self.fold(work);
        }
    }

    /// Drops authors below `min_works` and returns the rest ranked by
    /// relevance, then citations.
    pub fn finish(self, min_works: usize) -> Vec<Expert> {
        let stats = self.stats();
        let mut finalized: Vec<Expert> = self
            .experts
            .into_iter()
            .filter(|e| e.works_count >= min_works)
            .collect();

        sort_ranked(&mut finalized);

        info!(
            "Aggregated {} works into {} authors, {} with at least {} works",
            stats.works_folded,
            stats.authors,
            finalized.len(),
            min_works
        );
        finalized
    }
}


pub fn aggregate_experts(
    works: &[Work],
    query_terms: &BTreeSet<String>,
    min_works: usize,
) -> Vec<Expert> {
    let cache = TermCache::default();
    let mut aggregator = ExpertAggregator::new(query_terms, &cache);
    aggregator.fold_all(works);
    aggregator.finish(min_works)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use crate::toolkit::search::experts::author_key::{name_key, SourceIdKey};

    fn terms(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_min_works_scenario() {
        let works = vec![
            Work::new("w1", "Paper one").with_authors(["Author X"]),
            Work::new("w2", "Paper two").with_authors(["Author X", "Author Y"]),
            Work::new("w3", "Paper three").with_authors(["Author X"]),
        ];

        let experts = aggregate_experts(&works, &terms(&["paper"]), 2);

        assert_eq!(experts.len(), 1);
        assert_eq!(experts[0].name, "Author X");
        assert_eq!(experts[0].id, "author:author_x");
        assert_eq!(experts[0].works_count, 3);
    }

    #[test]
    fn test_state_transitions() {
        let query = terms(&["lasers"]);
        let cache = TermCache::new(16);
        let mut aggregator = ExpertAggregator::new(&query, &cache);
        let key = name_key("Donna Strickland").unwrap();

        assert_eq!(aggregator.state_of(&key), AuthorState::Unseen);
        aggregator.fold(&Work::new("w1", "Chirped pulse lasers").with_authors(["Donna Strickland"]));
        assert_eq!(aggregator.state_of(&key), AuthorState::Accumulating);
        assert_eq!(aggregator.get(&key).unwrap().relevance_score, 1.0);
    }

    #[test]
    fn test_accumulates_counts_and_vocabulary() {
        let works = vec![
            Work::new("w1", "Quantum optics")
                .with_authors(["Ada"])
                .with_citations(10)
                .with_concepts(["Optics"])
                .with_abstract("Entangled photons"),
            Work::new("w2", "Trapped ions")
                .with_authors(["Ada"])
                .with_citations(30)
                .with_concepts(["Atomic Physics"]),
        ];

        let experts = aggregate_experts(&works, &terms(&["trapped ions"]), 1);
        let ada = &experts[0];

        assert_eq!(ada.works_count, 2);
        assert_eq!(ada.citation_count, 40);
        assert!(ada.expertise_areas.contains("optics"));
        assert!(ada.expertise_areas.contains("atomic physics"));
        assert!(ada.expertise_areas.contains("entangled photons"));
        assert_eq!(ada.relevance_score, 1.0);
        assert_eq!(ada.top_works[0].id, "w2");
    }

    #[test]
    fn test_works_without_authors_are_skipped() {
        let query = terms(&["x"]);
        let cache = TermCache::new(16);
        let mut aggregator = ExpertAggregator::new(&query, &cache);
        aggregator.fold(&Work::new("orphan", "No authors here"));
        aggregator.fold(&Work::new("w1", "Has one").with_authors(["Solo"]));

        let stats = aggregator.stats();
        assert_eq!(stats.works_without_authors, 1);
        assert_eq!(stats.works_folded, 1);
        assert_eq!(stats.authors, 1);
        assert_eq!(aggregator.finish(1).len(), 1);
    }

    #[test]
    fn test_ordering_by_relevance_then_citations() {
        let works = vec![
            Work::new("w1", "Unrelated survey").with_authors(["Famous"]).with_citations(9000),
            Work::new("w2", "Coral reefs").with_authors(["Relevant"]).with_citations(5),
            Work::new("w3", "Coral bleaching").with_authors(["AlsoRelevant"]).with_citations(50),
        ];

        let experts = aggregate_experts(&works, &terms(&["coral"]), 1);
        let names: Vec<&str> = experts.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["AlsoRelevant", "Relevant", "Famous"]);
    }

    #[test]
    fn test_namesakes_collide_under_name_key() {
        let works = vec![
            Work::new("w1", "Paper A")
                .with_author(Author::new("Wei Zhang").with_source_id("A1")),
            Work::new("w2", "Paper B")
                .with_author(Author::new("Wei Zhang").with_source_id("A2")),
        ];
        let merged = aggregate_experts(&works, &BTreeSet::new(), 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].works_count, 2);

        let cache = TermCache::new(16);
        let query = BTreeSet::new();
        let mut aggregator =
            ExpertAggregator::new(&query, &cache).with_key_strategy(Arc::new(SourceIdKey));
        aggregator.fold_all(&works);
        assert_eq!(aggregator.finish(1).len(), 2);
    }

    #[test]
    fn test_repeated_author_on_one_work_counts_once() {
        let works = vec![Work::new("w1", "Self collaboration").with_authors(["Kim", "kim"])];
        let experts = aggregate_experts(&works, &BTreeSet::new(), 1);
        assert_eq!(experts.len(), 1);
        assert_eq!(experts[0].works_count, 1);
    }

    #[test]
    fn test_institution_comes_from_authorship() {
        let works = vec![Work::new("w1", "Paper")
            .with_author(Author::new("Lin").with_institution("Tsinghua University"))];
        let experts = aggregate_experts(&works, &BTreeSet::new(), 1);
        assert_eq!(experts[0].institution.as_deref(), Some("Tsinghua University"));
    }
}
