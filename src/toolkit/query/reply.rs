use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::StructuredQuery;
use crate::utils::collapse_whitespace;

lazy_static! {
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fenced block pattern");
    static ref BRACED_JSON: Regex = Regex::new(r"(?s)\{.*\}").expect("valid braces pattern");
    static ref FREE_TEXT_SEPARATORS: Regex = Regex::new(r"[,;\n]").expect("valid separator pattern");
}

/// Pulls the JSON payload out of a model reply: a fenced block first, then the
/// outermost braces, else the trimmed text itself.
pub fn extract_json_block(text: &str) -> &str {
    if let Some(inner) = FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }
    if let Some(braced) = BRACED_JSON.find(text) {
        return braced.as_str().trim();
    }
    text.trim()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

impl StructuredQuery {
    /// Reads a structured query out of a language-model reply.
    ///
    /// Missing or mistyped fields become empty lists. A reply with no usable
    /// JSON object yields the empty query.
    pub fn from_model_reply(text: &str) -> Self {
        let payload = extract_json_block(text);
        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!("Could not parse structured query reply: {}", e);
                return Self::default();
            }
        };

        let Some(object) = value.as_object() else {
            warn!("Structured query reply is not a JSON object");
            return Self::default();
        };

        let mut expertise = string_list(object.get("specific_topics"));
        expertise.extend(string_list(object.get("methodologies")));

        let query = Self {
            research_areas: string_list(object.get("research_areas")),
            expertise,
            search_keywords: string_list(object.get("search_keywords")),
        };
        debug!(
            "Structured query: {} areas, {} expertise, {} keywords",
            query.research_areas.len(),
            query.expertise.len(),
            query.search_keywords.len()
        );
        query
    }

    /// Rule-based structuring: each comma, semicolon or line separated part of
    /// the text becomes a search keyword.
    pub fn from_free_text(text: &str) -> Self {
        let search_keywords = FREE_TEXT_SEPARATORS
            .split(text)
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            search_keywords,
            ..Default::default()
        }
    }
}
