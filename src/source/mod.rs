pub mod normalize;
pub mod openalex;

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::core::error::{MatchError, Result};

pub use normalize::{normalize_batch, normalize_record};
pub use openalex::OpenAlexClient;

pub const SORT_BY_CITATIONS: &str = "cited_by_count:desc";

/// A full-text work search against a bibliographic source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkQuery {
    pub search: String,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    pub per_page: usize,
    pub pages: usize,
    pub sort: Option<String>,
    pub min_citations: Option<u64>,
}

impl WorkQuery {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            from_year: None,
            to_year: None,
            per_page: 25,
            pages: 1,
            sort: None,
            min_citations: None,
        }
    }

    pub fn years(mut self, from_year: i32, to_year: i32) -> Self {
        self.from_year = Some(from_year);
        self.to_year = Some(to_year);
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn min_citations(mut self, min_citations: u64) -> Self {
        self.min_citations = Some(min_citations);
        self
    }

    /// Rejects queries no source can answer: a blank search or an inverted year range.
    pub fn validate(&self) -> Result<()> {
        if self.search.trim().is_empty() {
            return Err(MatchError::Invariant("work query has an empty search string".into()));
        }
        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                return Err(MatchError::Invariant(format!(
                    "work query year range is inverted: {from}-{to}"
                )));
            }
        }
        Ok(())
    }
}

/// Where raw work records come from.
///
/// Records are returned unparsed; turning them into `Work`s is the
/// normalizer's job so that a malformed record never fails a whole search.
#[async_trait]
pub trait WorkSource: Send + Sync {
    async fn search_works(&self, query: &WorkQuery) -> Result<Vec<Value>>;

    fn source_name(&self) -> &str;
}

/// In-memory source returning the same records for every query.
pub struct StaticWorkSource {
    records: Vec<Value>,
    queries: Mutex<Vec<WorkQuery>>,
}

impl StaticWorkSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Accepts a JSON array of records or an API page with a `results` array.
    pub fn from_json(body: Value) -> Result<Self> {
        match body {
            Value::Array(records) => Ok(Self::new(records)),
            Value::Object(mut page) => match page.remove("results") {
                Some(Value::Array(records)) => Ok(Self::new(records)),
                _ => Err(MatchError::Source(
                    "expected a JSON array or an object with a `results` array".into(),
                )),
            },
            _ => Err(MatchError::Source("expected a JSON array of works".into())),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MatchError::Source(format!("cannot read {}: {}", path.display(), e)))?;
        let source = Self::from_json(serde_json::from_str(&text)?)?;
        info!("Loaded {} works from {}", source.records.len(), path.display());
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<WorkQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl WorkSource for StaticWorkSource {
    async fn search_works(&self, query: &WorkQuery) -> Result<Vec<Value>> {
        query.validate()?;
        self.queries.lock().push(query.clone());
        Ok(self.records.clone())
    }

    fn source_name(&self) -> &str {
        "static"
    }
}
