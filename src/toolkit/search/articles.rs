use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ranking::sort_ranked;
use super::scoring::RelevanceScorer;
use super::terms::TermCache;
use crate::models::{Article, Work};


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    pub min_relevance: f64,
    pub max_results: Option<usize>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            min_relevance: 0.0,
            max_results: None,
        }
    }
}

impl RankOptions {
    pub fn with_limit(max_results: usize) -> Self {
        Self {
            max_results: Some(max_results),
            ..Default::default()
        }
    }

    pub fn min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }
}

/// Drops works whose id or non-empty normalized title was already seen.
pub fn dedupe_works(works: Vec<Work>) -> Vec<Work> {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(works.len());

    for work in works {
        let title = work.normalized_title();
        if seen_ids.contains(&work.id) || (!title.is_empty() && seen_titles.contains(&title)) {
            debug!("Skipping duplicate work: {}", work.id);
            continue;
        }
        seen_ids.insert(work.id.clone());
        if !title.is_empty() {
            seen_titles.insert(title);
        }
        unique.push(work);
    }

    unique
}


pub struct ArticleRanker<'a> {
    scorer: RelevanceScorer<'a>,
}

impl<'a> ArticleRanker<'a> {
    pub fn new(query_terms: &'a BTreeSet<String>, cache: &'a TermCache) -> Self {
        Self {
            scorer: RelevanceScorer::new(query_terms, cache),
        }
    }

    pub fn rank(&self, works: Vec<Work>, options: RankOptions) -> Vec<Article> {
        let total = works.len();
        let mut articles: Vec<Article> = dedupe_works(works)
            .into_iter()
            .filter_map(|work| {
                let (keywords, relevance) = self.scorer.score_work(&work);
                (relevance >= options.min_relevance)
                    .then(|| Article::new(work, keywords, relevance))
            })
            .collect();

        sort_ranked(&mut articles);

        if let Some(limit) = options.max_results {
            articles.truncate(limit);
        }

        debug!(
            "Ranked {} articles from {} works (min_relevance={})",
            articles.len(),
            total,
            options.min_relevance
        );
        articles
    }
}


pub fn rank_articles(
    works: Vec<Work>,
    query_terms: &BTreeSet<String>,
    options: RankOptions,
) -> Vec<Article> {
    let cache = TermCache::default();
    ArticleRanker::new(query_terms, &cache).rank(works, options)
}
