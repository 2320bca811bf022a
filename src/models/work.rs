use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::toolkit::search::terms::fold_text;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}

impl Author {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            source_id: None,
            institution: None,
        }
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

/// A normalized publication record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub citation_count: u64,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub doi: Option<String>,
}

impl Work {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            abstract_text: None,
            publication_date: None,
            citation_count: 0,
            concepts: Vec::new(),
            doi: None,
        }
    }

    pub fn with_authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = names.into_iter().map(Author::new).collect();
        self
    }

    pub fn with_author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn with_citations(mut self, citations: u64) -> Self {
        self.citation_count = citations;
        self
    }

    pub fn with_concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concepts = concepts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.publication_date = Some(date);
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }


    pub fn year(&self) -> Option<i32> {
        self.publication_date.map(|d| d.year())
    }

    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.display_name.as_str()).collect()
    }

    /// Title key used for duplicate detection; empty for untitled works.
    pub fn normalized_title(&self) -> String {
        fold_text(&self.title)
    }

    pub fn summary(&self, relevance_score: f64) -> WorkSummary {
        WorkSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            publication_date: self.publication_date,
            year: self.year(),
            citation_count: self.citation_count,
            doi: self.doi.clone(),
            relevance_score,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub id: String,
    pub title: String,
    pub publication_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub citation_count: u64,
    pub doi: Option<String>,
    pub relevance_score: f64,
}
