use std::collections::HashSet;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::models::{Author, Work};

const DOI_PREFIXES: [&str; 3] = ["https://doi.org/", "http://doi.org/", "doi:"];

lazy_static! {
    static ref HTML_ENTITY: Regex =
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity pattern");
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).map(String::from);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Decodes named and numeric HTML entities; unknown entities are left as-is.
pub fn unescape_html(text: &str) -> String {
    HTML_ENTITY
        .replace_all(text, |caps: &Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn str_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn read_title(record: &Map<String, Value>) -> String {
    str_field(record, "title")
        .or_else(|| str_field(record, "display_name"))
        .map(unescape_html)
        .unwrap_or_default()
}

fn read_authors(record: &Map<String, Value>) -> Vec<Author> {
    let Some(authorships) = record.get("authorships").and_then(Value::as_array) else {
        return Vec::new();
    };

    authorships
        .iter()
        .filter_map(|authorship| {
            let author = authorship.get("author")?;
            let name = author.get("display_name")?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }

            let mut parsed = Author::new(name);
            if let Some(id) = author.get("id").and_then(Value::as_str).filter(|s| !s.is_empty()) {
                parsed = parsed.with_source_id(id);
            }
            let institution = authorship
                .get("institutions")
                .and_then(Value::as_array)
                .and_then(|list| list.first())
                .and_then(|inst| inst.get("display_name"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty());
            if let Some(institution) = institution {
                parsed = parsed.with_institution(institution);
            }
            Some(parsed)
        })
        .collect()
}

/// Rebuilds abstract text from a `word -> [positions]` index.
pub fn rebuild_abstract(index: &Map<String, Value>) -> Option<String> {
    let mut positioned: Vec<(u64, &str)> = index
        .iter()
        .flat_map(|(word, positions)| {
            positions
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_u64)
                .map(move |pos| (pos, word.as_str()))
        })
        .collect();

    if positioned.is_empty() {
        return None;
    }
    positioned.sort_by_key(|(pos, _)| *pos);
    Some(
        positioned
            .into_iter()
            .map(|(_, word)| word)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn read_abstract(record: &Map<String, Value>) -> Option<String> {
    if let Some(text) = str_field(record, "abstract") {
        return Some(unescape_html(text));
    }
    record
        .get("abstract_inverted_index")
        .and_then(Value::as_object)
        .and_then(rebuild_abstract)
}

fn read_date(record: &Map<String, Value>) -> Option<NaiveDate> {
    if let Some(raw) = str_field(record, "publication_date") {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => return Some(date),
            Err(_) => debug!("Unparseable publication_date {:?}", raw),
        }
    }
    let year = record.get("publication_year").and_then(Value::as_i64)?;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 1, 1)
}

fn read_citations(record: &Map<String, Value>, id: &str) -> u64 {
    match record.get("cited_by_count") {
        Some(value) => match value.as_i64() {
            Some(n) if n >= 0 => n as u64,
            Some(n) => {
                warn!("Work {} has negative citation count {}, using 0", id, n);
                0
            }
            None => value.as_u64().unwrap_or_else(|| {
                warn!("Work {} has non-numeric citation count, using 0", id);
                0
            }),
        },
        None => {
            warn!("Work {} has no citation count, using 0", id);
            0
        }
    }
}

fn read_concepts(record: &Map<String, Value>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut concepts = Vec::new();

    for field in ["concepts", "keywords"] {
        let Some(items) = record.get(field).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            let name = match item {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj.get("display_name").and_then(Value::as_str),
                _ => None,
            };
            let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            if seen.insert(name.to_lowercase()) {
                concepts.push(name.to_string());
            }
        }
    }

    concepts
}

pub fn strip_doi(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let bare = DOI_PREFIXES
        .iter()
        .find_map(|prefix| {
            trimmed
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &trimmed[prefix.len()..])
        })
        .unwrap_or(trimmed)
        .trim();
    (!bare.is_empty()).then(|| bare.to_string())
}

fn title_id(title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("work:{}", &digest[..16])
}

/// Reads one OpenAlex-shaped record into a `Work`.
///
/// Every field falls back to a safe default; only a non-object record is
/// rejected.
pub fn normalize_record(record: &Value) -> Option<Work> {
    let record = record.as_object()?;

    let title = read_title(record);
    let doi = record.get("doi").and_then(Value::as_str).and_then(strip_doi);
    let id = str_field(record, "id")
        .map(str::to_string)
        .or_else(|| doi.as_ref().map(|d| format!("doi:{d}")))
        .unwrap_or_else(|| title_id(&title));

    let citation_count = read_citations(record, &id);

    Some(Work {
        authors: read_authors(record),
        abstract_text: read_abstract(record),
        publication_date: read_date(record),
        citation_count,
        concepts: read_concepts(record),
        doi,
        title,
        id,
    })
}

pub fn normalize_batch(records: &[Value]) -> Vec<Work> {
    let works: Vec<Work> = records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let work = normalize_record(record);
            if work.is_none() {
                warn!("Skipping record {} of batch: not a JSON object", i);
            }
            work
        })
        .collect();

    debug!("Normalized {} of {} records", works.len(), records.len());
    works
}
