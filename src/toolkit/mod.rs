

pub mod query;
pub mod search;


pub use query::extract_json_block;
pub use search::{
    aggregate_experts, analyze_expert_match, combine, rank_articles, ArticleRanker,
    CombineOptions, ExpertAggregator, ExpertMatch, MatchPriority, RankOptions, TermCache,
};
