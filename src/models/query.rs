use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::toolkit::search::terms::normalize_phrase;


#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    #[serde(default)]
    pub research_areas: Vec<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub search_keywords: Vec<String>,
}

impl StructuredQuery {
    pub fn new(
        research_areas: Vec<String>,
        expertise: Vec<String>,
        search_keywords: Vec<String>,
    ) -> Self {
        Self {
            research_areas,
            expertise,
            search_keywords,
        }
    }


    pub fn from_areas<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            research_areas: areas.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Raw phrases in field order: research areas, expertise, then keywords.
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.research_areas
            .iter()
            .chain(self.expertise.iter())
            .chain(self.search_keywords.iter())
            .map(String::as_str)
    }

    /// Normalized query phrases used for relevance scoring.
    pub fn query_terms(&self) -> BTreeSet<String> {
        self.phrases()
            .map(normalize_phrase)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Free-text search string handed to the bibliographic source.
    pub fn search_text(&self) -> String {
        self.phrases()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.query_terms().is_empty()
    }
}
