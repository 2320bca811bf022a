use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::models::Author;


#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthorKey(String);

impl AuthorKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AuthorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decides which author records refer to the same person.
///
/// Returns `None` for authors that cannot be keyed (e.g. a blank name), which
/// are then left out of aggregation.
pub trait AuthorKeyStrategy: Send + Sync {
    fn key(&self, author: &Author) -> Option<AuthorKey>;
}


pub fn name_key(display_name: &str) -> Option<AuthorKey> {
    let words: Vec<String> = display_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(AuthorKey(format!("author:{}", words.join("_"))))
}

/// Keys authors by their lower-cased, underscore-joined display name.
/// Namesakes merge and name variants split.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedNameKey;

impl AuthorKeyStrategy for NormalizedNameKey {
    fn key(&self, author: &Author) -> Option<AuthorKey> {
        name_key(&author.display_name)
    }
}

/// Prefers the source's own author identifier and falls back to the name.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceIdKey;

impl AuthorKeyStrategy for SourceIdKey {
    fn key(&self, author: &Author) -> Option<AuthorKey> {
        match author.source_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(AuthorKey(format!("source:{id}"))),
            _ => name_key(&author.display_name),
        }
    }
}

/// Configurable choice of author identity rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AuthorKeyKind {
    #[default]
    Name,

    SourceId,
}

impl AuthorKeyKind {
    pub fn strategy(self) -> Arc<dyn AuthorKeyStrategy> {
        match self {
            Self::Name => Arc::new(NormalizedNameKey),
            Self::SourceId => Arc::new(SourceIdKey),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_name_key_is_stable_and_normalized() {
        let a = NormalizedNameKey.key(&Author::new("Grace  Hopper")).unwrap();
        let b = NormalizedNameKey.key(&Author::new(" grace hopper ")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "author:grace_hopper");
    }

    #[test]
    fn test_blank_name_has_no_key() {
        assert!(NormalizedNameKey.key(&Author::new("   ")).is_none());
    }

    #[test]
    fn test_source_id_preferred() {
        let author = Author::new("J. Smith").with_source_id("https://openalex.org/A123");
        let key = SourceIdKey.key(&author).unwrap();
        assert_eq!(key.as_str(), "source:https://openalex.org/A123");

        let fallback = SourceIdKey.key(&Author::new("J. Smith")).unwrap();
        assert_eq!(fallback.as_str(), "author:j._smith");
    }

    #[test]
    fn test_key_kind_selects_strategy() {
        let author = Author::new("Ana Ruiz").with_source_id("A9");
        let kind = AuthorKeyKind::from_str("source_id").unwrap();
        assert_eq!(kind.strategy().key(&author).unwrap().as_str(), "source:A9");
        assert_eq!(
            AuthorKeyKind::default().strategy().key(&author).unwrap().as_str(),
            "author:ana_ruiz"
        );
    }
}
