pub mod cache;
pub mod extractor;
pub mod stopwords;

pub use cache::{CacheStats, TermCache};
pub use extractor::{content_words, extract_terms, fold_text, normalize_phrase, TermExtractor};
pub use stopwords::{is_stopword, STOPWORDS};
