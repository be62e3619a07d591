use chrono::{DateTime, Utc};
use ontology::TagInstance;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

use crate::fuzzy::FuzzyConfig;
use crate::source::SourceError;

/// Similarity cut-off for the fuzzy fallback. Scores run from 0.0 (identical)
/// to 1.0 (nothing in common); hits at or below the threshold are kept.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.4;

/// An external, timestamped, authored text message. Read-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Transport-assigned identifier, when the transport has one.
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    /// Epoch seconds.
    pub created_at: i64,
    #[serde(default)]
    pub pubkey: String,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
}

impl Event {
    pub fn new(content: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: None,
            content: content.into(),
            created_at,
            pubkey: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.pubkey = pubkey.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A stored content item as handed over by the item source. Items own their
/// tags exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    /// Tags that fail to decode are dropped on load; they could never match.
    #[serde(default, deserialize_with = "decodable_tags")]
    pub tags: Vec<TagInstance>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl StoredItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: String::new(),
            tags: Vec::new(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tag(mut self, tag: TagInstance) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }
}

fn decodable_tags<'de, D>(deserializer: D) -> Result<Vec<TagInstance>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<JsonValue>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, tag)| match TagInstance::deserialize(tag) {
            Ok(tag) => Some(tag),
            Err(err) => {
                debug!(index, error = %err, "tag_undecodable");
                None
            }
        })
        .collect())
}

/// Which stage produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOrigin {
    /// At least one tag rule fired; fuzzy search was skipped.
    Rule,
    /// No rule fired; items came from the approximate text search.
    Fuzzy,
    /// Nothing matched.
    None,
}

impl MatchOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOrigin::Rule => "rule",
            MatchOrigin::Fuzzy => "fuzzy",
            MatchOrigin::None => "none",
        }
    }
}

/// One matched item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchHit {
    pub item: StoredItem,
    /// Index into `item.tags` of the first tag that fired (rule hits only).
    pub matched_tag: Option<usize>,
    /// Similarity score (fuzzy hits only; lower is closer).
    pub fuzzy_score: Option<f64>,
}

/// Deduplicated items judged relevant to one event.
///
/// Rule hits keep item-source order. Fuzzy hits are ordered by ascending
/// score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub origin: MatchOrigin,
    pub hits: Vec<MatchHit>,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self {
            origin: MatchOrigin::None,
            hits: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn item_ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.item.id.as_str()).collect()
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.hits.iter().any(|hit| hit.item.id == item_id)
    }
}

/// Engine configuration.
///
/// Cheap to clone and serde-friendly so it can be embedded in higher-level
/// configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Keep fuzzy hits whose score is at or below this value.
    #[serde(default = "MatchConfig::default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Run the fuzzy search when no rule matches.
    #[serde(default = "MatchConfig::default_fuzzy_fallback")]
    pub fuzzy_fallback: bool,
    /// Cap on fuzzy hits returned; `None` keeps every hit under threshold.
    #[serde(default)]
    pub max_fuzzy_results: Option<usize>,
    /// Compiled-size limit for `matches regex` patterns, in bytes.
    #[serde(default = "MatchConfig::default_regex_size_limit")]
    pub regex_size_limit: usize,
    #[serde(default)]
    pub fuzzy: FuzzyConfig,
}

impl MatchConfig {
    pub(crate) fn default_fuzzy_threshold() -> f64 {
        DEFAULT_FUZZY_THRESHOLD
    }

    pub(crate) fn default_fuzzy_fallback() -> bool {
        true
    }

    pub(crate) fn default_regex_size_limit() -> usize {
        ontology::parse::DEFAULT_REGEX_SIZE_LIMIT
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.fuzzy_threshold.is_finite() || !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(MatchError::InvalidConfig(
                "fuzzy_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.max_fuzzy_results == Some(0) {
            return Err(MatchError::InvalidConfig(
                "max_fuzzy_results must be greater than zero when set".into(),
            ));
        }
        if self.regex_size_limit == 0 {
            return Err(MatchError::InvalidConfig(
                "regex_size_limit must be greater than zero".into(),
            ));
        }
        self.fuzzy.validate()
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: Self::default_fuzzy_threshold(),
            fuzzy_fallback: Self::default_fuzzy_fallback(),
            max_fuzzy_results: None,
            regex_size_limit: Self::default_regex_size_limit(),
            fuzzy: FuzzyConfig::default(),
        }
    }
}

/// Errors produced by the matching layer.
///
/// Malformed tag data never shows up here; it only makes the offending tag
/// not match.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid engine configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// The item source could not be read.
    #[error("item source error: {0}")]
    Source(#[from] SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config_is_valid() {
        let cfg = MatchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.fuzzy_threshold, DEFAULT_FUZZY_THRESHOLD);
        assert!(cfg.fuzzy_fallback);
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let cfg = MatchConfig {
            fuzzy_threshold: 1.5,
            ..MatchConfig::default()
        };
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("fuzzy_threshold")),
            other => panic!("unexpected error: {other}"),
        }

        let cfg = MatchConfig {
            fuzzy_threshold: f64::NAN,
            ..MatchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_result_cap_rejected() {
        let cfg = MatchConfig {
            max_fuzzy_results: Some(0),
            ..MatchConfig::default()
        };
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("max_fuzzy_results")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn item_accepts_camel_case_timestamp() {
        let item: StoredItem = serde_json::from_value(json!({
            "id": "a",
            "name": "Budget",
            "updatedAt": "2024-01-05T10:00:00Z",
            "tags": [{"name": "desc", "condition": "contains", "value": "rent"}]
        }))
        .unwrap();
        assert_eq!(item.updated_at.timestamp(), 1_704_448_800);
        assert_eq!(item.tags.len(), 1);
        assert!(item.content.is_empty());
    }

    #[test]
    fn undecodable_tags_are_dropped_not_fatal() {
        let item: StoredItem = serde_json::from_value(json!({
            "id": "a",
            "tags": [
                {"name": "desc", "condition": "contains", "value": ["rent", "due"]},
                {"condition": "is", "value": "nameless"},
                {"name": "desc", "condition": "is", "value": null},
                {"name": "desc", "condition": "contains", "value": "rent"}
            ]
        }))
        .unwrap();
        assert_eq!(item.tags.len(), 2);
        assert_eq!(item.tags[0].value, ontology::TagValue::default());
        assert_eq!(item.tags[1].value, ontology::TagValue::text("rent"));

        let bare: StoredItem = serde_json::from_value(json!({"id": "b", "tags": null})).unwrap();
        assert!(bare.tags.is_empty());
    }

    #[test]
    fn event_defaults_optional_fields() {
        let event: Event =
            serde_json::from_value(json!({"content": "hi", "created_at": 1})).unwrap();
        assert!(event.id.is_none());
        assert!(event.tags.is_empty());
        assert!(event.pubkey.is_empty());
    }
}
