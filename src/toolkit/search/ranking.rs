use std::cmp::Ordering;

use crate::models::{Article, Expert};


pub trait Ranked {
    fn relevance(&self) -> f64;

    fn citations(&self) -> u64;
}

impl Ranked for Article {
    fn relevance(&self) -> f64 {
        self.relevance_score
    }

    fn citations(&self) -> u64 {
        self.work.citation_count
    }
}

impl Ranked for Expert {
    fn relevance(&self) -> f64 {
        self.relevance_score
    }

    fn citations(&self) -> u64 {
        self.citation_count
    }
}


pub fn compare_ranked<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.relevance()
        .partial_cmp(&a.relevance())
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.citations().cmp(&a.citations()))
}

/// Relevance descending, then citations descending. Stable, so full ties keep
/// their incoming order.
pub fn sort_ranked<T: Ranked>(items: &mut [T]) {
    items.sort_by(compare_ranked);
}
