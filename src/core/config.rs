use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Result;
use crate::toolkit::search::experts::AuthorKeyKind;

const ENV_PREFIX: &str = "RESEARCHMATCH";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchMatchConfig {

    pub openalex_url: String,
    pub mailto: String,
    pub timeout: u64,
    pub max_retries: u32,
    pub rate_limit_delay_ms: u64,


    pub default_max_results: usize,
    pub recent_years: i32,
    pub article_pages: usize,
    pub expert_per_page: usize,
    pub expert_pages: usize,


    pub min_relevance: f64,
    pub expert_min_works: usize,
    pub discipline_min_works: usize,
    pub discipline_min_citations: u64,
    pub author_key: AuthorKeyKind,


    pub confirmed_score: f64,
    pub partial_credit_weight: f64,

    pub term_cache_size: usize,
}

impl ResearchMatchConfig {

    pub fn new(mailto: &str) -> Self {
        Self {
            openalex_url: crate::DEFAULT_OPENALEX_URL.to_string(),
            mailto: mailto.to_string(),
            timeout: 30,
            max_retries: 3,
            rate_limit_delay_ms: 1000,

            default_max_results: crate::DEFAULT_MAX_RESULTS,
            recent_years: 5,
            article_pages: 1,
            expert_per_page: 100,
            expert_pages: 1,

            min_relevance: 0.0,
            expert_min_works: 3,
            discipline_min_works: 5,
            discipline_min_citations: 100,
            author_key: AuthorKeyKind::Name,

            confirmed_score: 1.0,
            partial_credit_weight: 0.5,

            term_cache_size: crate::DEFAULT_TERM_CACHE_SIZE,
        }
    }


    /// Defaults overridden by `RESEARCHMATCH_<FIELD>` variables, e.g.
    /// `RESEARCHMATCH_EXPERT_MIN_WORKS=5`.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Layers defaults, an optional TOML file and `RESEARCHMATCH_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let loaded: Self = builder
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        use super::error::MatchError;

        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(MatchError::Config(format!(
                "min_relevance must be within [0, 1], got {}",
                self.min_relevance
            )));
        }
        if self.term_cache_size == 0 {
            return Err(MatchError::Config("term_cache_size must be positive".into()));
        }
        if self.recent_years < 0 {
            return Err(MatchError::Config("recent_years cannot be negative".into()));
        }
        Ok(())
    }
}

impl Default for ResearchMatchConfig {
    fn default() -> Self {
        Self::new("")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ResearchMatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.expert_min_works, 3);
        assert_eq!(config.confirmed_score, 1.0);
        assert_eq!(config.partial_credit_weight, 0.5);
    }

    #[test]
    fn test_validate_rejects_out_of_range_relevance() {
        let config = ResearchMatchConfig {
            min_relevance: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ResearchMatchConfig::load(None).unwrap();
        assert_eq!(config.discipline_min_works, 5);
        assert_eq!(config.openalex_url, crate::DEFAULT_OPENALEX_URL);
    }

    fn with_vars(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_env_overrides_use_field_names() {
        let config = ResearchMatchConfig::load_with(
            None,
            with_vars(&[
                ("RESEARCHMATCH_EXPERT_MIN_WORKS", "7"),
                ("RESEARCHMATCH_DEFAULT_MAX_RESULTS", "12"),
                ("RESEARCHMATCH_AUTHOR_KEY", "source_id"),
            ]),
        )
        .unwrap();

        assert_eq!(config.expert_min_works, 7);
        assert_eq!(config.default_max_results, 12);
        assert_eq!(config.author_key, AuthorKeyKind::SourceId);
        assert_eq!(config.discipline_min_works, 5);
    }

    #[test]
    fn test_env_override_is_validated() {
        let result = ResearchMatchConfig::load_with(
            None,
            with_vars(&[("RESEARCHMATCH_MIN_RELEVANCE", "2.0")]),
        );
        assert!(result.is_err());
    }
}
