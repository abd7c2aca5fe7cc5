//! Article model and the ingestion boundary that produces it.
//!
//! Bibliographic sources do not reliably return well-typed records: titles arrive as
//! nested objects when they carry markup, MeSH lists arrive as a single string, PMIDs
//! arrive as numbers. Everything loosely typed is coerced here, once, so the ranking
//! code downstream only ever sees plain strings and string lists.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PharmalitError, Result};

/// A fetched article, strictly typed. Read-only to the ranking engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub pmid: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub mesh_terms: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub url: String,
}

impl Article {
    /// Normalise one loosely typed JSON record into an [`Article`].
    ///
    /// Fails only when the record is not an object or carries no usable `pmid`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            PharmalitError::MalformedArticle(format!("expected an object, got {}", kind(value)))
        })?;

        let field = |names: &[&str]| -> Option<&Value> {
            names.iter().find_map(|n| obj.get(*n)).filter(|v| !v.is_null())
        };

        let pmid = field(&["pmid", "PMID", "id"]).map(coerce_text).unwrap_or_default();
        if pmid.is_empty() {
            return Err(PharmalitError::MalformedArticle("missing pmid".to_string()));
        }

        Ok(Self {
            pmid,
            title: field(&["title"]).map(coerce_text).unwrap_or_default(),
            abstract_text: field(&["abstract", "abstractText", "abstract_text"])
                .map(coerce_text)
                .unwrap_or_default(),
            authors: field(&["authors"]).map(|v| coerce_list(v, None)).unwrap_or_default(),
            journal: field(&["journal", "source"]).map(coerce_text).unwrap_or_default(),
            publication_date: field(&["publicationDate", "publication_date", "pubDate", "pub_date"])
                .map(coerce_text)
                .unwrap_or_default(),
            mesh_terms: field(&["meshTerms", "mesh_terms", "mesh"])
                .map(|v| coerce_list(v, Some(';')))
                .unwrap_or_default(),
            keywords: field(&["keywords"])
                .map(|v| coerce_list(v, Some(';')))
                .unwrap_or_default(),
            url: field(&["url"]).map(coerce_text).unwrap_or_default(),
        })
    }

    /// Lowercased `title + " " + abstract`, used by every combined-text check.
    pub fn combined_text_lower(&self) -> String {
        format!("{} {}", self.title, self.abstract_text).to_lowercase()
    }
}

/// Parse a JSON array of article records. Records that cannot be normalised are skipped
/// with a warning; a payload that is not an array is an error.
pub fn articles_from_json(json: &str) -> Result<Vec<Article>> {
    let value: Value = serde_json::from_str(json)?;
    let records = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("articles") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PharmalitError::MalformedArticle(
                    "object payload has no \"articles\" array".to_string(),
                ))
            }
        },
        other => {
            return Err(PharmalitError::MalformedArticle(format!(
                "expected an array of articles, got {}",
                kind(&other)
            )))
        }
    };

    let total = records.len();
    let mut articles = Vec::with_capacity(total);
    for (idx, record) in records.iter().enumerate() {
        match Article::from_value(record) {
            Ok(a) => articles.push(a),
            Err(e) => warn!(index = idx, error = %e, "Skipping article record"),
        }
    }
    debug!(total, kept = articles.len(), "Normalised article batch");
    Ok(articles)
}

/// Coerce any JSON value into a single string.
/// Objects and arrays contribute every nested string leaf, space-joined.
fn coerce_text(value: &Value) -> String {
    let mut parts = Vec::new();
    collect_leaves(value, &mut parts);
    parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            if !s.trim().is_empty() {
                out.push(s.trim().to_string());
            }
        }
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
    }
}

/// Coerce a JSON value into a list of strings. A bare string becomes a one-element list,
/// or is split on `split_on` when given.
fn coerce_list(value: &Value, split_on: Option<char>) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(coerce_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => match split_on {
            Some(sep) => s
                .split(sep)
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            None if s.trim().is_empty() => Vec::new(),
            None => vec![s.trim().to_string()],
        },
        _ => Vec::new(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}
