use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::extractor::extract_terms;

/// Per-request memo of extracted term sets.
///
/// Abstracts are re-read once per co-author during expert aggregation, so the
/// same text is usually extracted several times within one request.
pub struct TermCache {
    cache: Mutex<LruCache<String, BTreeSet<String>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl TermCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn make_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        if text.trim().is_empty() {
            return BTreeSet::new();
        }

        let key = Self::make_key(text);
        {
            let mut cache = self.cache.lock();
            if let Some(terms) = cache.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return terms.clone();
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let terms = extract_terms(text);
        self.cache.lock().put(key, terms.clone());
        terms
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        CacheStats {
            hits,
            misses,
            size: self.cache.lock().len(),
            hit_rate,
        }
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for TermCache {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TERM_CACHE_SIZE)
    }
}
