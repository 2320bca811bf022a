use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::models::{Expert, StructuredQuery};

pub const HIGH_PRIORITY_THRESHOLD: f64 = 0.8;
pub const MEDIUM_PRIORITY_THRESHOLD: f64 = 0.6;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MatchPriority {
    High,

    Medium,

    Low,
}

impl MatchPriority {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_PRIORITY_THRESHOLD {
            Self::High
        } else if score > MEDIUM_PRIORITY_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for MatchPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertMatch {
    pub expertise_match: BTreeMap<String, f64>,
    pub overall_match: f64,
    pub priority: MatchPriority,
    pub recommendation: String,
}

fn skill_matches(skill: &str, expert: &Expert) -> bool {
    let skill = skill.trim().to_lowercase();
    if skill.is_empty() {
        return false;
    }
    expert.expertise_areas.iter().any(|area| {
        let area = area.to_lowercase();
        !area.is_empty() && (area.contains(&skill) || skill.contains(&area))
    })
}

pub fn recommendation(name: &str, priority: MatchPriority) -> String {
    let message = match priority {
        MatchPriority::High => format!(
            "{name} is an excellent match for your research interests. \
             Their expertise directly aligns with your collaboration needs."
        ),
        MatchPriority::Medium => format!(
            "{name} is a good match for your research. \
             They have relevant expertise that could benefit your collaboration."
        ),
        MatchPriority::Low => format!(
            "{name} has some relevant expertise, but may not be an ideal fit. \
             Consider them if other candidates are unavailable."
        ),
    };
    format!("Priority: {priority}. {message}")
}

/// Scores how well an expert covers the query's requested expertise.
///
/// Each skill scores 1.0 when it and one of the expert's areas contain each
/// other, case-insensitively. The overall match averages the mean skill score
/// with the expert's relevance.
pub fn analyze_expert_match(expert: &Expert, query: &StructuredQuery) -> ExpertMatch {
    let expertise_match: BTreeMap<String, f64> = query
        .expertise
        .iter()
        .filter(|skill| !skill.trim().is_empty())
        .map(|skill| {
            let score = if skill_matches(skill, expert) { 1.0 } else { 0.0 };
            (skill.clone(), score)
        })
        .collect();

    let mean = if expertise_match.is_empty() {
        0.0
    } else {
        expertise_match.values().sum::<f64>() / expertise_match.len() as f64
    };

    let overall_match = (mean + expert.relevance_score) / 2.0;
    let priority = MatchPriority::from_score(overall_match);

    ExpertMatch {
        expertise_match,
        overall_match,
        priority,
        recommendation: recommendation(&expert.name, priority),
    }
}
