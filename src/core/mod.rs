

pub mod config;
pub mod error;
pub mod research_client;


pub use self::config::ResearchMatchConfig;
pub use self::error::{MatchError, Result};
pub use self::research_client::{ArticleSearch, ExpertSearch, ResearchClient, SearchTarget};
