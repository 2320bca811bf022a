use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::work::WorkSummary;

/// Maximum number of works kept on an expert profile.
pub const TOP_WORKS_CAPACITY: usize = 5;

pub const SUMMARY_EXPERTISE: usize = 5;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expert {
    pub id: String,
    pub name: String,
    pub institution: Option<String>,
    pub works_count: usize,
    pub citation_count: u64,
    pub expertise_areas: BTreeSet<String>,
    pub top_works: Vec<WorkSummary>,
    pub recent_years: BTreeSet<i32>,
    pub relevance_score: f64,
    #[serde(skip)]
    term_frequency: BTreeMap<String, u32>,
}

impl Expert {
    /// Opens a profile from the first work attributed to an author.
    pub fn from_first_work(
        id: impl Into<String>,
        name: impl Into<String>,
        institution: Option<String>,
        work: WorkSummary,
        terms: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut expert = Self {
            id: id.into(),
            name: name.into(),
            institution: institution.filter(|i| !i.trim().is_empty()),
            works_count: 1,
            citation_count: work.citation_count,
            expertise_areas: BTreeSet::new(),
            top_works: Vec::with_capacity(TOP_WORKS_CAPACITY),
            recent_years: BTreeSet::new(),
            relevance_score: work.relevance_score,
            term_frequency: BTreeMap::new(),
        };
        expert.add_terms(terms);
        if let Some(year) = work.year {
            expert.recent_years.insert(year);
        }
        expert.top_works.push(work);
        expert
    }

    /// Folds one more work into the profile. Relevance never decreases.
    pub fn absorb(
        &mut self,
        institution: Option<&str>,
        work: WorkSummary,
        terms: impl IntoIterator<Item = String>,
    ) {
        self.works_count += 1;
        self.citation_count += work.citation_count;
        self.relevance_score = self.relevance_score.max(work.relevance_score);

        if self.institution.is_none() {
            self.institution = institution
                .filter(|i| !i.trim().is_empty())
                .map(str::to_string);
        }
        if let Some(year) = work.year {
            self.recent_years.insert(year);
        }
        self.add_terms(terms);
        self.insert_top_work(work);
    }

    fn add_terms(&mut self, terms: impl IntoIterator<Item = String>) {
        for term in terms {
            let term = term.to_lowercase();
            *self.term_frequency.entry(term.clone()).or_insert(0) += 1;
            self.expertise_areas.insert(term);
        }
    }

    // Strictly-greater comparison keeps the earlier work ahead on equal citations.
    fn insert_top_work(&mut self, work: WorkSummary) {
        let pos = self
            .top_works
            .iter()
            .position(|w| w.citation_count < work.citation_count)
            .unwrap_or(self.top_works.len());

        if pos < TOP_WORKS_CAPACITY {
            self.top_works.insert(pos, work);
            self.top_works.truncate(TOP_WORKS_CAPACITY);
        }
    }

    /// Most frequent expertise terms first, alphabetical on ties.
    pub fn top_expertise(&self, limit: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, u32)> = self
            .expertise_areas
            .iter()
            .map(|t| (t, self.term_frequency.get(t).copied().unwrap_or(0)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().take(limit).map(|(t, _)| t.clone()).collect()
    }

    pub fn to_summary(&self) -> ExpertSummary {
        ExpertSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            institution: self.institution.clone(),
            works_count: self.works_count,
            citation_count: self.citation_count,
            relevance_score: self.relevance_score,
            top_expertise: self.top_expertise(SUMMARY_EXPERTISE),
            top_works: self.top_works.clone(),
            recent_years: self.recent_years.iter().rev().copied().collect(),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertSummary {
    pub id: String,
    pub name: String,
    pub institution: Option<String>,
    pub works_count: usize,
    pub citation_count: u64,
    pub relevance_score: f64,
    pub top_expertise: Vec<String>,
    pub top_works: Vec<WorkSummary>,
    pub recent_years: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, citations: u64, relevance: f64, year: Option<i32>) -> WorkSummary {
        WorkSummary {
            id: id.to_string(),
            title: format!("Work {id}"),
            publication_date: None,
            year,
            citation_count: citations,
            doi: None,
            relevance_score: relevance,
        }
    }

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_work_seeds_profile() {
        let expert = Expert::from_first_work(
            "author:ada_lovelace",
            "Ada Lovelace",
            Some("Analytical Engines Ltd".into()),
            summary("W1", 40, 0.5, Some(2020)),
            terms(&["Computing", "engines"]),
        );
        assert_eq!(expert.works_count, 1);
        assert_eq!(expert.citation_count, 40);
        assert_eq!(expert.relevance_score, 0.5);
        assert!(expert.expertise_areas.contains("computing"));
        assert_eq!(expert.top_works.len(), 1);
        assert_eq!(expert.recent_years.iter().copied().collect::<Vec<_>>(), vec![2020]);
    }

    #[test]
    fn test_relevance_is_monotonic_across_folds() {
        let mut expert = Expert::from_first_work("a", "A", None, summary("W0", 1, 0.4, None), vec![]);
        let mut previous = expert.relevance_score;
        for (i, relevance) in [0.2, 0.9, 0.1, 0.0, 0.5].into_iter().enumerate() {
            expert.absorb(None, summary(&format!("W{}", i + 1), 1, relevance, None), vec![]);
            assert!(expert.relevance_score >= previous);
            previous = expert.relevance_score;
        }
        assert_eq!(expert.relevance_score, 0.9);
        assert_eq!(expert.works_count, 6);
    }

    #[test]
    fn test_top_works_bounded_and_sorted() {
        let mut expert = Expert::from_first_work("a", "A", None, summary("W0", 10, 0.0, None), vec![]);
        for (i, citations) in [50, 3, 70, 10, 90, 1, 20].into_iter().enumerate() {
            expert.absorb(None, summary(&format!("W{}", i + 1), citations, 0.0, None), vec![]);
            assert!(expert.top_works.len() <= TOP_WORKS_CAPACITY);
            assert!(expert
                .top_works
                .windows(2)
                .all(|w| w[0].citation_count >= w[1].citation_count));
        }
        let counts: Vec<u64> = expert.top_works.iter().map(|w| w.citation_count).collect();
        assert_eq!(counts, vec![90, 70, 50, 20, 10]);
        assert_eq!(expert.citation_count, 10 + 50 + 3 + 70 + 10 + 90 + 1 + 20);
    }

    #[test]
    fn test_top_works_ties_keep_first_seen() {
        let mut expert = Expert::from_first_work("a", "A", None, summary("first", 10, 0.0, None), vec![]);
        expert.absorb(None, summary("second", 10, 0.0, None), vec![]);
        let ids: Vec<&str> = expert.top_works.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);

        for i in 0..4 {
            expert.absorb(None, summary(&format!("late{i}"), 10, 0.0, None), vec![]);
        }
        assert_eq!(expert.top_works[0].id, "first");
        assert!(expert.top_works.iter().all(|w| w.id != "late3"));
    }

    #[test]
    fn test_institution_filled_from_later_work() {
        let mut expert = Expert::from_first_work("a", "A", Some("  ".into()), summary("W0", 0, 0.0, None), vec![]);
        assert!(expert.institution.is_none());
        expert.absorb(Some("ETH Zurich"), summary("W1", 0, 0.0, None), vec![]);
        expert.absorb(Some("MIT"), summary("W2", 0, 0.0, None), vec![]);
        assert_eq!(expert.institution.as_deref(), Some("ETH Zurich"));
    }

    #[test]
    fn test_summary_top_expertise_by_frequency() {
        let mut expert = Expert::from_first_work(
            "a",
            "A",
            None,
            summary("W0", 0, 0.0, Some(2019)),
            terms(&["qubits", "optics"]),
        );
        expert.absorb(None, summary("W1", 0, 0.0, Some(2023)), terms(&["qubits", "annealing"]));

        let summary = expert.to_summary();
        assert_eq!(summary.top_expertise[0], "qubits");
        assert_eq!(summary.top_expertise[1..], ["annealing".to_string(), "optics".to_string()]);
        assert_eq!(summary.recent_years, vec![2023, 2019]);
    }
}
