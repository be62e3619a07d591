//! Per-type definitions: legal conditions, validator, and wire rules.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::condition::Condition;
use crate::error::OntologyError;
use crate::parse::{compile_pattern, parse_finite, parse_timestamp, DEFAULT_REGEX_SIZE_LIMIT};
use crate::value::{TagValue, ValueShape};

/// What a tag type means, independent of its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticKind {
    /// Free text. Also the permissive fallback for unknown tag names, so it
    /// accepts either range shape for `between`.
    Text,
    NumberRange,
    TimeRange,
    Regex,
    /// A closed vocabulary. An empty option list means any non-blank value.
    Enum { options: Vec<String> },
    /// Structured value such as a location (`{name, address, lat, lon}`).
    Object,
}

impl SemanticKind {
    /// Whether a value of `shape` can be stored under this kind.
    pub fn accepts(&self, shape: ValueShape) -> bool {
        match self {
            SemanticKind::Text => shape != ValueShape::Object,
            SemanticKind::NumberRange => {
                matches!(shape, ValueShape::Text | ValueShape::NumberRange)
            }
            SemanticKind::TimeRange => matches!(shape, ValueShape::Text | ValueShape::TimeRange),
            SemanticKind::Regex | SemanticKind::Enum { .. } => shape == ValueShape::Text,
            SemanticKind::Object => matches!(shape, ValueShape::Text | ValueShape::Object),
        }
    }
}

/// A registered tag type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTypeDefinition {
    name: String,
    #[serde(flatten)]
    kind: SemanticKind,
    conditions: Vec<Condition>,
}

impl TagTypeDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: SemanticKind,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> Self {
        let mut ordered: Vec<Condition> = Vec::new();
        for condition in conditions {
            if !ordered.contains(&condition) {
                ordered.push(condition);
            }
        }
        Self {
            name: name.into(),
            kind,
            conditions: ordered,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SemanticKind {
        &self.kind
    }

    /// Legal conditions, in declaration order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn supports(&self, condition: &Condition) -> bool {
        !matches!(condition, Condition::Other(_)) && self.conditions.contains(condition)
    }

    /// Structural and semantic validity of `value` under `condition`.
    pub fn validate(&self, value: &TagValue, condition: &Condition) -> bool {
        self.validate_with_limit(value, condition, DEFAULT_REGEX_SIZE_LIMIT)
    }

    /// As [`validate`](Self::validate), with an explicit compiled-size cap
    /// for `matches regex` patterns.
    pub fn validate_with_limit(
        &self,
        value: &TagValue,
        condition: &Condition,
        regex_size_limit: usize,
    ) -> bool {
        if !self.supports(condition) || !self.kind.accepts(value.shape()) {
            return false;
        }

        match condition {
            Condition::Is | Condition::Contains => {
                let Some(text) = value.match_text().map(str::trim) else {
                    return false;
                };
                if text.is_empty() {
                    return false;
                }
                match &self.kind {
                    SemanticKind::NumberRange => parse_finite(text).is_some(),
                    SemanticKind::Enum { options }
                        if *condition == Condition::Is && !options.is_empty() =>
                    {
                        options.iter().any(|opt| opt.eq_ignore_ascii_case(text))
                    }
                    _ => true,
                }
            }
            Condition::Before | Condition::After => {
                value.as_text().and_then(parse_timestamp).is_some()
            }
            // Both bounds must be well-formed; one bad bound invalidates the range.
            Condition::Between => match value {
                TagValue::TimeRange(r) => {
                    parse_timestamp(&r.start).is_some() && parse_timestamp(&r.end).is_some()
                }
                TagValue::NumberRange(r) => {
                    parse_finite(&r.lower).is_some() && parse_finite(&r.upper).is_some()
                }
                _ => false,
            },
            Condition::MatchesRegex => value
                .as_text()
                .and_then(|pattern| compile_pattern(pattern, regex_size_limit))
                .is_some(),
            Condition::Other(_) => false,
        }
    }

    /// Canonical wire form of `value`. Lossless: bounds and text are written
    /// exactly as held.
    pub fn serialize(&self, value: &TagValue) -> JsonValue {
        match value {
            TagValue::Text(s) => JsonValue::String(s.clone()),
            TagValue::NumberRange(r) => json!({ "lower": r.lower, "upper": r.upper }),
            TagValue::TimeRange(r) => json!({ "start": r.start, "end": r.end }),
            TagValue::Object(map) => JsonValue::Object(map.clone()),
        }
    }

    /// Decode a wire value, rejecting shapes this type cannot hold.
    pub fn deserialize(&self, raw: &JsonValue) -> Result<TagValue, OntologyError> {
        let value: TagValue = serde::Deserialize::deserialize(raw)
            .map_err(|err: serde_json::Error| OntologyError::Malformed(err.to_string()))?;
        if !self.kind.accepts(value.shape()) {
            return Err(OntologyError::ShapeMismatch {
                type_name: self.name.clone(),
                shape: value.shape(),
            });
        }
        Ok(value)
    }

    /// Blank value for a tag of this type switching to `condition`.
    pub fn empty_value(&self, condition: &Condition) -> TagValue {
        if condition.is_range() {
            match self.kind {
                SemanticKind::TimeRange => TagValue::time_range("", ""),
                _ => TagValue::number_range("", ""),
            }
        } else {
            TagValue::default()
        }
    }
}
