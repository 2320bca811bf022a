

pub mod core;
pub mod models;
pub mod source;
pub mod toolkit;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};


pub use crate::core::config::ResearchMatchConfig;
pub use crate::core::error::{MatchError, Result};
pub use crate::core::research_client::{ArticleSearch, ExpertSearch, ResearchClient, SearchTarget};
pub use models::{Article, Expert, StructuredQuery, Work};
pub use source::{OpenAlexClient, StaticWorkSource, WorkQuery, WorkSource};


pub const DEFAULT_OPENALEX_URL: &str = "https://api.openalex.org";


pub const DEFAULT_TERM_CACHE_SIZE: usize = 1000;


pub const DEFAULT_MAX_RESULTS: usize = 20;
