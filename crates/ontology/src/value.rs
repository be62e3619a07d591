//! Tag value shapes and their wire representation.
//!
//! The shape of a [`TagValue`] is decided jointly by the tag's type and its
//! condition: scalar text for `is`/`contains`/`before`/`after`, a
//! `{lower, upper}` pair for numeric `between`, a `{start, end}` pair for
//! time `between`, and a free-form object for structured types such as
//! locations.
//!
//! On the wire the value is untagged. Range bounds are always written as
//! strings, but JSON numbers are accepted on input so that hand-written
//! data like `{"lower": 10, "upper": 20}` still loads. `null` reads as empty
//! text. Arrays have no tag value shape and are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::OntologyError;

/// Keys consulted, in order, when an object value is compared as text.
const OBJECT_TEXT_KEYS: &[&str] = &["name", "label", "address"];

/// A two-sided numeric range. Bounds keep the raw user-entered text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NumberRange {
    pub lower: String,
    pub upper: String,
}

/// A two-sided time range. Bounds keep the raw user-entered text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Value carried by a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, try_from = "JsonValue")]
pub enum TagValue {
    Text(String),
    NumberRange(NumberRange),
    TimeRange(TimeRange),
    Object(Map<String, JsonValue>),
}

/// Coarse shape of a [`TagValue`], used in validation and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Text,
    NumberRange,
    TimeRange,
    Object,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueShape::Text => "text",
            ValueShape::NumberRange => "number range",
            ValueShape::TimeRange => "time range",
            ValueShape::Object => "object",
        };
        f.write_str(label)
    }
}

impl TagValue {
    /// Shorthand for a text value.
    pub fn text(s: impl Into<String>) -> Self {
        TagValue::Text(s.into())
    }

    /// Shorthand for a numeric range value.
    pub fn number_range(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        TagValue::NumberRange(NumberRange {
            lower: lower.into(),
            upper: upper.into(),
        })
    }

    /// Shorthand for a time range value.
    pub fn time_range(start: impl Into<String>, end: impl Into<String>) -> Self {
        TagValue::TimeRange(TimeRange {
            start: start.into(),
            end: end.into(),
        })
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            TagValue::Text(_) => ValueShape::Text,
            TagValue::NumberRange(_) => ValueShape::NumberRange,
            TagValue::TimeRange(_) => ValueShape::TimeRange,
            TagValue::Object(_) => ValueShape::Object,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text compared by `is`/`contains`: the string itself, or for objects
    /// the first non-blank of `name`, `label`, `address`. Ranges have none.
    pub fn match_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s.as_str()),
            TagValue::Object(map) => OBJECT_TEXT_KEYS
                .iter()
                .filter_map(|key| map.get(*key).and_then(JsonValue::as_str))
                .find(|s| !s.trim().is_empty()),
            TagValue::NumberRange(_) | TagValue::TimeRange(_) => None,
        }
    }

    /// All textual parts joined by single spaces.
    pub fn flatten(&self) -> String {
        match self {
            TagValue::Text(s) => s.clone(),
            TagValue::NumberRange(r) => join_nonblank([r.lower.as_str(), r.upper.as_str()]),
            TagValue::TimeRange(r) => join_nonblank([r.start.as_str(), r.end.as_str()]),
            TagValue::Object(map) => {
                let mut parts = Vec::new();
                flatten_json(&JsonValue::Object(map.clone()), &mut parts);
                parts.join(" ")
            }
        }
    }
}

impl Default for TagValue {
    fn default() -> Self {
        TagValue::Text(String::new())
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Text(s)
    }
}

fn join_nonblank<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn flatten_json(value: &JsonValue, out: &mut Vec<String>) {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => out.push(s.clone()),
        JsonValue::Number(n) => out.push(n.to_string()),
        JsonValue::Array(items) => items.iter().for_each(|v| flatten_json(v, out)),
        JsonValue::Object(map) => map.values().for_each(|v| flatten_json(v, out)),
        _ => {}
    }
}

impl TryFrom<JsonValue> for TagValue {
    type Error = OntologyError;

    fn try_from(raw: JsonValue) -> Result<Self, Self::Error> {
        match raw {
            JsonValue::Null => Ok(TagValue::default()),
            JsonValue::String(s) => Ok(TagValue::Text(s)),
            JsonValue::Number(n) => Ok(TagValue::Text(n.to_string())),
            JsonValue::Bool(b) => Ok(TagValue::Text(b.to_string())),
            JsonValue::Array(_) => Err(OntologyError::Malformed(
                "arrays are not a tag value shape".into(),
            )),
            JsonValue::Object(map) => {
                if let Some((lower, upper)) = bound_pair(&map, "lower", "upper") {
                    Ok(TagValue::NumberRange(NumberRange { lower, upper }))
                } else if let Some((start, end)) = bound_pair(&map, "start", "end") {
                    Ok(TagValue::TimeRange(TimeRange { start, end }))
                } else {
                    Ok(TagValue::Object(map))
                }
            }
        }
    }
}

/// Both bounds of an object holding exactly the two keys `a` and `b`, each a
/// string or a number. Anything else is a plain object.
fn bound_pair(map: &Map<String, JsonValue>, a: &str, b: &str) -> Option<(String, String)> {
    if map.len() != 2 {
        return None;
    }
    Some((bound(map.get(a)?)?, bound(map.get(b)?)?))
}

fn bound(raw: &JsonValue) -> Option<String> {
    match raw {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_each_shape() {
        let text: TagValue = serde_json::from_value(json!("meeting")).unwrap();
        assert_eq!(text, TagValue::text("meeting"));

        let nums: TagValue = serde_json::from_value(json!({"lower": "10", "upper": "20"})).unwrap();
        assert_eq!(nums, TagValue::number_range("10", "20"));

        let times: TagValue =
            serde_json::from_value(json!({"start": "2024-01-01", "end": "2024-01-31"})).unwrap();
        assert_eq!(times, TagValue::time_range("2024-01-01", "2024-01-31"));

        let obj: TagValue = serde_json::from_value(json!({"name": "Paris", "lat": 48.8})).unwrap();
        assert_eq!(obj.shape(), ValueShape::Object);
    }

    #[test]
    fn numeric_bounds_become_strings() {
        let v: TagValue = serde_json::from_value(json!({"lower": 10, "upper": 20.5})).unwrap();
        assert_eq!(v, TagValue::number_range("10", "20.5"));
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"lower": "10", "upper": "20.5"})
        );
    }

    #[test]
    fn scalar_numbers_become_text() {
        let v: TagValue = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(v, TagValue::text("42"));
    }

    #[test]
    fn null_reads_as_empty_text() {
        let v: TagValue = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(v, TagValue::default());
    }

    #[test]
    fn arrays_are_rejected() {
        assert!(serde_json::from_value::<TagValue>(json!(["a", "b"])).is_err());
        assert!(serde_json::from_value::<TagValue>(json!([1, 2])).is_err());
    }

    #[test]
    fn pair_with_extra_key_is_an_object() {
        let v: TagValue =
            serde_json::from_value(json!({"lower": "1", "upper": "2", "unit": "kg"})).unwrap();
        assert_eq!(v.shape(), ValueShape::Object);
    }

    #[test]
    fn partial_pair_falls_back_to_object() {
        let v: TagValue = serde_json::from_value(json!({"lower": "1"})).unwrap();
        assert_eq!(v.shape(), ValueShape::Object);
    }

    #[test]
    fn object_match_text_prefers_name() {
        let v: TagValue =
            serde_json::from_value(json!({"label": "Office", "name": " ", "address": "1 Main St"}))
                .unwrap();
        assert_eq!(v.match_text(), Some("Office"));
        assert!(TagValue::number_range("1", "2").match_text().is_none());
    }

    #[test]
    fn flatten_collects_text_parts() {
        assert_eq!(TagValue::number_range("10", "20").flatten(), "10 20");
        assert_eq!(TagValue::time_range("", "2024-01-01").flatten(), "2024-01-01");
        let v: TagValue = serde_json::from_value(json!({"name": "Cafe", "tags": ["quiet", 3]})).unwrap();
        let flat = v.flatten();
        assert!(flat.contains("Cafe"));
        assert!(flat.contains("quiet"));
        assert!(flat.contains('3'));
    }
}
