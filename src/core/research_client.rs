use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::config::ResearchMatchConfig;
use super::error::Result;
use crate::models::{Article, Expert, StructuredQuery, Work};
use crate::source::{normalize_batch, WorkQuery, WorkSource, SORT_BY_CITATIONS};
use crate::toolkit::search::{
    combine, dedupe_works, discipline_term_sets, normalize_phrase, ArticleRanker, CombineOptions,
    ExpertAggregator, RankOptions, TermCache,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SearchTarget {
    Articles,

    Experts,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSearch {
    pub max_results: Option<usize>,
    pub recent_years: Option<i32>,
    pub min_citations: Option<u64>,
    pub min_relevance: Option<f64>,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpertSearch {
    pub max_results: Option<usize>,
    pub recent_years: Option<i32>,
    pub min_works: Option<usize>,
}

/// Request facade over a bibliographic source.
///
/// Every call builds its own term cache and aggregator, so one client can
/// serve concurrent requests.
pub struct ResearchClient<S: WorkSource> {
    source: Arc<S>,
    config: ResearchMatchConfig,
}

impl<S: WorkSource> ResearchClient<S> {
    pub fn new(source: Arc<S>, config: ResearchMatchConfig) -> Self {
        info!(
            "Research client ready (source={}, max_results={}, recent_years={})",
            source.source_name(),
            config.default_max_results,
            config.recent_years
        );
        Self { source, config }
    }

    pub fn config(&self) -> &ResearchMatchConfig {
        &self.config
    }

    fn year_window(&self, recent_years: Option<i32>) -> (i32, i32) {
        let current = Utc::now().year();
        let span = recent_years.unwrap_or(self.config.recent_years).max(0);
        (current - span, current)
    }

    fn combine_options(&self, require_all: bool) -> CombineOptions {
        CombineOptions {
            require_all,
            confirmed_score: self.config.confirmed_score,
            partial_credit_weight: self.config.partial_credit_weight,
        }
    }

    async fn fetch_works(&self, query: &WorkQuery) -> Result<Vec<Work>> {
        let started = Instant::now();
        let records = self.source.search_works(query).await?;
        let works = normalize_batch(&records);
        info!(
            "Fetched {} works from {} in {}ms",
            works.len(),
            self.source.source_name(),
            started.elapsed().as_millis()
        );
        Ok(works)
    }

    pub async fn search_articles(
        &self,
        query: &StructuredQuery,
        options: &ArticleSearch,
    ) -> Result<Vec<Article>> {
        let span = info_span!("search_articles", request_id = %Uuid::new_v4());
        self.rank_articles_for(query, options).instrument(span).await
    }

    async fn rank_articles_for(
        &self,
        query: &StructuredQuery,
        options: &ArticleSearch,
    ) -> Result<Vec<Article>> {
        if query.is_empty() {
            warn!("Empty search query, returning no articles");
            return Ok(Vec::new());
        }

        let max_results = options.max_results.unwrap_or(self.config.default_max_results);
        let (from_year, to_year) = self.year_window(options.recent_years);
        let mut work_query = WorkQuery::new(query.search_text())
            .years(from_year, to_year)
            .per_page(max_results)
            .pages(self.config.article_pages)
            .sort(SORT_BY_CITATIONS);
        if let Some(min) = options.min_citations.filter(|m| *m > 0) {
            work_query = work_query.min_citations(min);
        }

        let works = self.fetch_works(&work_query).await?;

        let query_terms = query.query_terms();
        let cache = TermCache::new(self.config.term_cache_size);
        let rank_options = RankOptions::with_limit(max_results)
            .min_relevance(options.min_relevance.unwrap_or(self.config.min_relevance));
        let articles = ArticleRanker::new(&query_terms, &cache).rank(works, rank_options);

        info!("Found {} articles for query", articles.len());
        Ok(articles)
    }

    pub async fn search_experts(
        &self,
        query: &StructuredQuery,
        options: &ExpertSearch,
    ) -> Result<Vec<Expert>> {
        let span = info_span!("search_experts", request_id = %Uuid::new_v4());
        async {
            let max_results = options.max_results.unwrap_or(self.config.default_max_results);
            let min_works = options.min_works.unwrap_or(self.config.expert_min_works);
            let mut experts = self.collect_experts(query, options.recent_years, min_works).await?;
            experts.truncate(max_results);
            Ok(experts)
        }
        .instrument(span)
        .await
    }

    async fn collect_experts(
        &self,
        query: &StructuredQuery,
        recent_years: Option<i32>,
        min_works: usize,
    ) -> Result<Vec<Expert>> {
        if query.is_empty() {
            warn!("Empty search query, returning no experts");
            return Ok(Vec::new());
        }

        let (from_year, to_year) = self.year_window(recent_years);
        let work_query = WorkQuery::new(query.search_text())
            .years(from_year, to_year)
            .per_page(self.config.expert_per_page)
            .pages(self.config.expert_pages)
            .sort(SORT_BY_CITATIONS);

        let works = dedupe_works(self.fetch_works(&work_query).await?);

        let query_terms = query.query_terms();
        let cache = TermCache::new(self.config.term_cache_size);
        let mut aggregator = ExpertAggregator::new(&query_terms, &cache)
            .with_key_strategy(self.config.author_key.strategy());
        aggregator.fold_all(&works);
        Ok(aggregator.finish(min_works))
    }

    /// Experts with a larger publication record and at least `min_citations`.
    pub async fn search_experts_by_disciplines(
        &self,
        disciplines: &[String],
        max_results: Option<usize>,
        min_citations: Option<u64>,
    ) -> Result<Vec<Expert>> {
        let span = info_span!("search_experts_by_disciplines", request_id = %Uuid::new_v4());
        async {
            let query = StructuredQuery::from_areas(disciplines.iter().cloned());
            let min_citations = min_citations.unwrap_or(self.config.discipline_min_citations);
            let max_results = max_results.unwrap_or(self.config.default_max_results);

            let mut experts: Vec<Expert> = self
                .collect_experts(&query, None, self.config.discipline_min_works)
                .await?
                .into_iter()
                .filter(|e| e.citation_count >= min_citations)
                .collect();
            experts.truncate(max_results);

            info!(
                "Found {} experts with at least {} citations",
                experts.len(),
                min_citations
            );
            Ok(experts)
        }
        .instrument(span)
        .await
    }

    pub async fn search_multidisciplinary_experts(
        &self,
        primary: &str,
        secondary: &[String],
        max_results: Option<usize>,
        require_all: bool,
    ) -> Result<Vec<Expert>> {
        let span = info_span!(
            "search_multidisciplinary_experts",
            request_id = %Uuid::new_v4(),
            require_all
        );
        async {
            let max_results = max_results.unwrap_or(self.config.default_max_results);
            let query = StructuredQuery::from_areas([primary]);

            let mut primary_experts = self
                .collect_experts(&query, None, self.config.expert_min_works)
                .await?;
            if primary_experts.is_empty() {
                warn!("No experts found for primary discipline {:?}", primary);
                return Ok(Vec::new());
            }
            primary_experts.truncate(max_results.saturating_mul(2));

            let disciplines = discipline_term_sets(secondary);
            let mut experts = combine(primary_experts, &disciplines, self.combine_options(require_all));
            experts.truncate(max_results);

            info!("Found {} multidisciplinary experts", experts.len());
            Ok(experts)
        }
        .instrument(span)
        .await
    }

    /// Articles on the primary discipline, re-scored by how many secondary
    /// disciplines they also cover.
    pub async fn search_multidisciplinary_articles(
        &self,
        primary: &str,
        secondary: &[String],
        max_results: Option<usize>,
        require_all: bool,
    ) -> Result<Vec<Article>> {
        let span = info_span!(
            "search_multidisciplinary_articles",
            request_id = %Uuid::new_v4(),
            require_all
        );
        async {
            let max_results = max_results.unwrap_or(self.config.default_max_results);
            let primary_phrase = normalize_phrase(primary);
            if primary_phrase.is_empty() {
                warn!("Empty primary discipline, returning no articles");
                return Ok(Vec::new());
            }

            let query = StructuredQuery::from_areas(
                std::iter::once(primary.to_string()).chain(secondary.iter().cloned()),
            );
            let options = ArticleSearch {
                max_results: Some(max_results.saturating_mul(2)),
                ..Default::default()
            };
            let candidates: Vec<Article> = self
                .rank_articles_for(&query, &options)
                .await?
                .into_iter()
                .filter(|a| mentions(a, &primary_phrase))
                .collect();

            let disciplines = discipline_term_sets(secondary);
            let mut articles = combine(candidates, &disciplines, self.combine_options(require_all));
            articles.truncate(max_results);

            info!("Found {} multidisciplinary articles", articles.len());
            Ok(articles)
        }
        .instrument(span)
        .await
    }
}

fn mentions(article: &Article, phrase: &str) -> bool {
    let text: BTreeSet<String> = std::iter::once(article.work.title.as_str())
        .chain(article.work.abstract_text.as_deref())
        .chain(article.work.concepts.iter().map(String::as_str))
        .map(normalize_phrase)
        .chain(article.keywords.iter().cloned())
        .collect();
    text.iter().any(|t| t.contains(phrase))
}
