pub mod article;
pub mod expert;
pub mod query;
pub mod work;

pub use article::{Article, ArticleSummary};
pub use expert::{Expert, ExpertSummary, TOP_WORKS_CAPACITY};
pub use query::StructuredQuery;
pub use work::{Author, Work, WorkSummary};
