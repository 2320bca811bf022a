pub mod aggregator;
pub mod author_key;

pub use aggregator::{aggregate_experts, AggregationStats, AuthorState, ExpertAggregator};
pub use author_key::{name_key, AuthorKey, AuthorKeyKind, AuthorKeyStrategy, NormalizedNameKey, SourceIdKey};
