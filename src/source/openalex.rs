use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::{WorkQuery, WorkSource};
use crate::core::config::ResearchMatchConfig;
use crate::core::error::{MatchError, Result};

/// Largest page size the works endpoint accepts.
pub const MAX_PER_PAGE: usize = 200;

/// Upper bound on a server-requested `Retry-After` wait.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

pub struct OpenAlexClient {
    base_url: Url,
    mailto: Option<String>,
    max_retries: u32,
    rate_limit_delay: Duration,
    client: Client,
}

impl OpenAlexClient {
    pub fn new(config: &ResearchMatchConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.openalex_url).map_err(|e| {
            MatchError::Config(format!("invalid openalex_url {:?}: {}", config.openalex_url, e))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let mailto = Some(config.mailto.trim().to_string()).filter(|m| !m.is_empty());

        let user_agent = match &mailto {
            Some(email) => format!("researchmatch/{} ({})", env!("CARGO_PKG_VERSION"), email),
            None => format!("researchmatch/{}", env!("CARGO_PKG_VERSION")),
        };
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent).map_err(|_| {
                MatchError::Config(format!("mailto cannot be used in a header: {:?}", config.mailto))
            })?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .default_headers(headers)
            .build()?;

        info!(
            "OpenAlex client initialized (url={}, polite_pool={})",
            base_url,
            mailto.is_some()
        );

        Ok(Self {
            base_url,
            mailto,
            max_retries: config.max_retries.max(1),
            rate_limit_delay: Duration::from_millis(config.rate_limit_delay_ms),
            client,
        })
    }

    /// `/works` URL for one page of `query`.
    pub fn works_url(&self, query: &WorkQuery, page: usize) -> Result<Url> {
        let mut url = self
            .base_url
            .join("works")
            .map_err(|e| MatchError::Config(format!("cannot build works url: {}", e)))?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("search", &query.search);

            let filter = build_filter(query);
            if !filter.is_empty() {
                params.append_pair("filter", &filter);
            }
            if let Some(sort) = &query.sort {
                params.append_pair("sort", sort);
            }
            params.append_pair("per-page", &query.per_page.clamp(1, MAX_PER_PAGE).to_string());
            params.append_pair("page", &page.to_string());
            if let Some(email) = &self.mailto {
                params.append_pair("mailto", email);
            }
        }

        Ok(url)
    }

    async fn fetch_page(&self, url: &Url) -> Result<Vec<Value>> {
        let mut last_error: Option<MatchError> = None;

        for attempt in 1..=self.max_retries {
            debug!("GET {} (attempt {}/{})", url, attempt, self.max_retries);

            let response = match self.client.get(url.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Request failed (attempt {}/{}): {}", attempt, self.max_retries, e);
                    last_error = Some(MatchError::Http(e));
                    tokio::time::sleep(self.rate_limit_delay * attempt).await;
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                last_error = Some(MatchError::Source("rate limited".into()));
                let Some(wait) = self.rate_limit_wait(response.headers(), attempt) else {
                    warn!("Rate limited by OpenAlex on the last attempt");
                    break;
                };
                warn!("Rate limited by OpenAlex, waiting {:?}", wait);
                tokio::time::sleep(wait).await;
                continue;
            }
            if status.is_server_error() {
                warn!("OpenAlex returned {} (attempt {}/{})", status, attempt, self.max_retries);
                last_error = Some(MatchError::Source(format!("server error {}", status)));
                tokio::time::sleep(self.rate_limit_delay * attempt).await;
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MatchError::Source(format!(
                    "OpenAlex returned {}: {}",
                    status,
                    crate::utils::safe_truncate_ellipsis(&body, 200)
                )));
            }

            let body: Value = response.json().await?;
            return parse_works_page(body);
        }

        Err(last_error.unwrap_or_else(|| MatchError::Source("no attempts made".into())))
    }

    /// Wait before retrying a 429; `None` once no attempts remain.
    fn rate_limit_wait(&self, headers: &HeaderMap, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        Some(retry_after(headers).unwrap_or(self.rate_limit_delay * 2))
    }
}

fn build_filter(query: &WorkQuery) -> String {
    let mut parts = Vec::new();

    if query.from_year.is_some() || query.to_year.is_some() {
        let from = query.from_year.map(|y| y.to_string()).unwrap_or_default();
        let to = query.to_year.map(|y| y.to_string()).unwrap_or_default();
        parts.push(format!("publication_year:{from}-{to}"));
    }
    if let Some(min) = query.min_citations.filter(|m| *m > 0) {
        parts.push(format!("cited_by_count:>{}", min - 1));
    }

    parts.join(",")
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let secs = raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
    Duration::try_from_secs_f64(secs.min(MAX_RETRY_AFTER.as_secs_f64())).ok()
}

/// Extracts the `results` array of a works page.
pub fn parse_works_page(mut body: Value) -> Result<Vec<Value>> {
    match body.get_mut("results").map(Value::take) {
        Some(Value::Array(results)) => Ok(results),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => Err(MatchError::Source(format!(
            "unexpected `results` type in works page: {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl WorkSource for OpenAlexClient {
    async fn search_works(&self, query: &WorkQuery) -> Result<Vec<Value>> {
        query.validate()?;
        let pages = query.pages.max(1);
        let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
        let mut records = Vec::new();

        for page in 1..=pages {
            let url = self.works_url(query, page)?;
            let batch = self.fetch_page(&url).await?;
            let fetched = batch.len();
            records.extend(batch);

            if fetched < per_page {
                debug!("Page {} returned {} of {} records, stopping", page, fetched, per_page);
                break;
            }
            if page < pages {
                tokio::time::sleep(self.rate_limit_delay).await;
            }
        }

        info!("Fetched {} records for {:?}", records.len(), query.search);
        Ok(records)
    }

    fn source_name(&self) -> &str {
        "openalex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(mailto: &str) -> OpenAlexClient {
        OpenAlexClient::new(&ResearchMatchConfig::new(mailto)).unwrap()
    }

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_works_url() {
        let query = WorkQuery::new("coral reef ecology")
            .years(2020, 2025)
            .min_citations(100)
            .sort("cited_by_count:desc")
            .per_page(50);

        let url = client("me@example.org").works_url(&query, 2).unwrap();

        assert_eq!(url.path(), "/works");
        assert_eq!(param(&url, "search").as_deref(), Some("coral reef ecology"));
        assert_eq!(
            param(&url, "filter").as_deref(),
            Some("publication_year:2020-2025,cited_by_count:>99")
        );
        assert_eq!(param(&url, "sort").as_deref(), Some("cited_by_count:desc"));
        assert_eq!(param(&url, "per-page").as_deref(), Some("50"));
        assert_eq!(param(&url, "page").as_deref(), Some("2"));
        assert_eq!(param(&url, "mailto").as_deref(), Some("me@example.org"));
    }

    #[test]
    fn test_works_url_minimal() {
        let url = client("").works_url(&WorkQuery::new("x").per_page(5000), 1).unwrap();
        assert_eq!(param(&url, "filter"), None);
        assert_eq!(param(&url, "mailto"), None);
        assert_eq!(param(&url, "per-page").as_deref(), Some("200"));
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let config = ResearchMatchConfig {
            openalex_url: "http://localhost:8080/openalex".into(),
            ..Default::default()
        };
        let client = OpenAlexClient::new(&config).unwrap();
        let url = client.works_url(&WorkQuery::new("x"), 1).unwrap();
        assert_eq!(url.path(), "/openalex/works");
    }

    #[test]
    fn test_open_ended_year_range() {
        let mut query = WorkQuery::new("x");
        query.from_year = Some(2018);
        assert_eq!(build_filter(&query), "publication_year:2018-");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = ResearchMatchConfig {
            openalex_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(OpenAlexClient::new(&config), Err(MatchError::Config(_))));
    }

    #[test]
    fn test_parse_works_page() {
        let results = parse_works_page(json!({"meta": {"count": 2}, "results": [{"id": "W1"}, {"id": "W2"}]})).unwrap();
        assert_eq!(results.len(), 2);

        assert!(parse_works_page(json!({"meta": {}})).unwrap().is_empty());
        assert!(parse_works_page(json!({"results": "oops"})).is_err());
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2.5"));
        assert_eq!(retry_after(&headers), Some(Duration::from_millis(2500)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("-1"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_no_rate_limit_wait_on_last_attempt() {
        let config = ResearchMatchConfig {
            max_retries: 3,
            rate_limit_delay_ms: 100,
            ..Default::default()
        };
        let client = OpenAlexClient::new(&config).unwrap();
        let mut headers = HeaderMap::new();

        assert_eq!(client.rate_limit_wait(&headers, 1), Some(Duration::from_millis(200)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("5"));
        assert_eq!(client.rate_limit_wait(&headers, 2), Some(Duration::from_secs(5)));
        assert_eq!(client.rate_limit_wait(&headers, 3), None);
    }

    #[test]
    fn test_retry_after_is_capped() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("86400"));
        assert_eq!(retry_after(&headers), Some(MAX_RETRY_AFTER));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("1e30"));
        assert_eq!(retry_after(&headers), Some(MAX_RETRY_AFTER));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("inf"));
        assert_eq!(retry_after(&headers), None);
    }
}
