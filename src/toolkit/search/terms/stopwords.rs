use std::collections::HashSet;

use lazy_static::lazy_static;

lazy_static! {
    pub static ref STOPWORDS: HashSet<&'static str> = {
        [
            "the", "and", "for", "with", "from", "into", "onto", "upon", "than",
            "been", "being", "were", "was", "are", "has", "have", "had", "does", "did",
            "would", "could", "should", "might", "must", "shall", "can", "may", "will",
            "not", "this", "that", "these", "those", "which", "its", "their",
        ]
        .into_iter()
        .collect()
    };
}


#[inline]
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}
