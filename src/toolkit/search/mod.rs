pub mod analysis;
pub mod articles;
pub mod combine;
pub mod experts;
pub mod ranking;
pub mod scoring;
pub mod terms;

pub use analysis::{analyze_expert_match, ExpertMatch, MatchPriority};
pub use articles::{dedupe_works, rank_articles, ArticleRanker, RankOptions};
pub use combine::{combine, discipline_matches, discipline_term_sets, Combinable, CombineOptions};
pub use experts::{aggregate_experts, AuthorKey, AuthorKeyKind, AuthorKeyStrategy, ExpertAggregator};
pub use ranking::{compare_ranked, sort_ranked, Ranked};
pub use scoring::{expertise_terms, score, work_terms, RelevanceScorer};
pub use terms::{extract_terms, normalize_phrase, TermCache, TermExtractor};
