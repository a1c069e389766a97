use serde::Deserialize;
use serde_json::Value;

use crate::error::SearchError;
use crate::model::{ResultItem, UrlTemplate, format_thousands};

pub const SUGGESTION_PREFIX: &str = "window.google.ac.h(";

/// Turns a raw response body into result items.
///
/// Bodies that parse but lack the expected fields decode to an empty list
/// rather than an error, so "no matches" never shows up as a failure.
pub trait ResponseDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Vec<ResultItem>, SearchError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryDecoder;

#[derive(Debug, Deserialize)]
struct Repository {
    id: u64,
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    language: Option<String>,
}

impl From<Repository> for ResultItem {
    fn from(repo: Repository) -> Self {
        ResultItem {
            id: repo.id.to_string(),
            title: repo.full_name,
            subtitle: repo.description,
            tag: repo.language.filter(|language| !language.is_empty()),
            accessory: Some(format!("★ {}", format_thousands(repo.stargazers_count))),
            url: repo.html_url,
        }
    }
}

impl ResponseDecoder for RepositoryDecoder {
    fn decode(&self, raw: &str) -> Result<Vec<ResultItem>, SearchError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|_| SearchError::decode("Failed to parse search response"))?;

        let Some(entries) = value.get("items").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let items = entries
            .iter()
            .filter_map(|entry| match Repository::deserialize(entry) {
                Ok(repo) => Some(ResultItem::from(repo)),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed repository entry");
                    None
                }
            })
            .collect();
        Ok(items)
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionDecoder {
    results_url: UrlTemplate,
}

impl SuggestionDecoder {
    pub fn new(results_url: UrlTemplate) -> Self {
        Self { results_url }
    }
}

impl ResponseDecoder for SuggestionDecoder {
    fn decode(&self, raw: &str) -> Result<Vec<ResultItem>, SearchError> {
        Ok(decode_suggestions(raw)?
            .into_iter()
            .map(|suggestion| {
                let url = self.results_url.render(&suggestion);
                ResultItem::titled(suggestion, url)
            })
            .collect())
    }
}

/// Strips the `window.google.ac.h(...)` wrapper and collects the suggestion strings.
pub fn decode_suggestions(raw: &str) -> Result<Vec<String>, SearchError> {
    let payload = raw.trim();
    let suffix = if payload.ends_with(");") { ");" } else { ")" };

    let Some(inner) = payload
        .strip_prefix(SUGGESTION_PREFIX)
        .and_then(|rest| rest.strip_suffix(suffix))
    else {
        return Err(SearchError::decode("Unexpected suggestion response format"));
    };

    let value: Value = serde_json::from_str(inner)
        .map_err(|_| SearchError::decode("Failed to parse suggestion response"))?;

    let Some(entries) = value.get(1).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(text) => Some(text.as_str()),
            Value::Array(parts) => parts.first().and_then(Value::as_str),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
        .collect())
}
