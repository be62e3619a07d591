//! Tag rule evaluation.
//!
//! A tag contributes a match only when its definition validates the value
//! for the tag's condition *and* the condition holds for the event. Tags on
//! one item are OR-combined: the first tag that fires decides the item, and
//! the remaining tags are not evaluated.

use chrono::{DateTime, Utc};
use ontology::parse::{compile_pattern, first_number, parse_finite, parse_timestamp};
use ontology::{Condition, TagInstance, TagTypeRegistry, TagValue};
use tracing::debug;

use crate::types::{Event, StoredItem};

/// An event reduced to what rule evaluation compares against. Built once
/// per match call.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedEvent {
    /// Lower-cased content; all text comparisons are case-insensitive.
    pub content: String,
    /// `None` when `created_at` is outside the representable range; every
    /// time condition then fails.
    pub created_at: Option<DateTime<Utc>>,
    /// First bare number in the content, for numeric `between`.
    pub number: Option<f64>,
}

impl PreparedEvent {
    pub fn new(event: &Event) -> Self {
        let content = event.content.to_lowercase();
        let number = first_number(&content);
        Self {
            content,
            created_at: ontology::parse::timestamp_from_epoch(event.created_at),
            number,
        }
    }
}

/// Knobs for rule evaluation that come from engine config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOptions {
    pub regex_size_limit: usize,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            regex_size_limit: ontology::parse::DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

/// Whether one tag matches the event. Invalid tags and unparseable data
/// evaluate to `false`.
pub fn evaluate_tag(
    registry: &TagTypeRegistry,
    tag: &TagInstance,
    event: &PreparedEvent,
    opts: &RuleOptions,
) -> bool {
    let def = registry.lookup(&tag.name);
    if !def.validate_with_limit(&tag.value, &tag.condition, opts.regex_size_limit) {
        debug!(
            tag = %tag.name,
            condition = %tag.condition,
            type_name = def.name(),
            "tag_invalid"
        );
        return false;
    }

    // The validator has already tied the value shape to the type's kind, so
    // dispatching on shape here is dispatching on kind.
    match (&tag.condition, &tag.value) {
        (Condition::Between, TagValue::TimeRange(range)) => {
            match (
                event.created_at,
                parse_timestamp(&range.start),
                parse_timestamp(&range.end),
            ) {
                (Some(at), Some(start), Some(end)) => start <= at && at <= end,
                _ => false,
            }
        }
        (Condition::Between, TagValue::NumberRange(range)) => {
            match (event.number, parse_finite(&range.lower), parse_finite(&range.upper)) {
                // Literal bound comparison: an inverted range matches nothing.
                (Some(n), Some(lower), Some(upper)) => lower <= n && n <= upper,
                _ => false,
            }
        }
        (Condition::MatchesRegex, TagValue::Text(pattern)) => {
            compile_pattern(pattern, opts.regex_size_limit)
                .map(|re| re.is_match(&event.content))
                .unwrap_or(false)
        }
        (Condition::Is | Condition::Contains, value) => value
            .match_text()
            .map(|needle| event.content.contains(&needle.to_lowercase()))
            .unwrap_or(false),
        (Condition::Before, TagValue::Text(raw)) => compare_time(raw, event, |at, t| at < t),
        (Condition::After, TagValue::Text(raw)) => compare_time(raw, event, |at, t| at > t),
        _ => false,
    }
}

fn compare_time(
    raw: &str,
    event: &PreparedEvent,
    holds: impl Fn(DateTime<Utc>, DateTime<Utc>) -> bool,
) -> bool {
    match (event.created_at, parse_timestamp(raw)) {
        (Some(at), Some(tag_time)) => holds(at, tag_time),
        _ => false,
    }
}

/// Index of the first tag on `item` that matches, if any.
pub fn item_matches(
    registry: &TagTypeRegistry,
    item: &StoredItem,
    event: &PreparedEvent,
    opts: &RuleOptions,
) -> Option<usize> {
    item.tags
        .iter()
        .position(|tag| evaluate_tag(registry, tag, event, opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_15: i64 = 1_705_276_800;
    const FEB_01: i64 = 1_706_745_600;

    fn eval(tag: TagInstance, event: &Event) -> bool {
        evaluate_tag(
            &TagTypeRegistry::builtin(),
            &tag,
            &PreparedEvent::new(event),
            &RuleOptions::default(),
        )
    }

    fn january() -> TagInstance {
        TagInstance::new(
            "time",
            Condition::Between,
            TagValue::time_range("2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z"),
        )
    }

    #[test]
    fn time_between_is_inclusive() {
        assert!(eval(january(), &Event::new("", JAN_15)));
        assert!(!eval(january(), &Event::new("", FEB_01)));
        assert!(eval(january(), &Event::new("", 1_704_067_200)));
        assert!(eval(january(), &Event::new("", FEB_01 - 1)));
    }

    #[test]
    fn unrepresentable_event_time_fails_time_rules() {
        assert!(!eval(january(), &Event::new("", i64::MAX)));
    }

    #[test]
    fn number_between_reads_first_number() {
        let tag = TagInstance::new("amount", "between", TagValue::number_range("10", "20"));
        assert!(eval(tag.clone(), &Event::new("paid 15 dollars", 0)));
        assert!(!eval(tag.clone(), &Event::new("paid 99 dollars", 0)));
        assert!(!eval(tag.clone(), &Event::new("paid nothing", 0)));
        assert!(eval(tag, &Event::new("paid 10", 0)));
    }

    #[test]
    fn inverted_number_range_never_matches() {
        let tag = TagInstance::new("number", "between", TagValue::number_range("20", "10"));
        assert!(!eval(tag.clone(), &Event::new("15", 0)));
        assert!(!eval(tag, &Event::new("20", 0)));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let tag = TagInstance::new("desc", "contains", "meeting");
        assert!(eval(tag, &Event::new("Reminder: MEETING at 5pm", 0)));
        let tag = TagInstance::new("desc", "is", "Meeting");
        assert!(eval(tag, &Event::new("the meeting moved", 0)));
    }

    #[test]
    fn location_object_compares_by_name() {
        let value: TagValue = serde_json::from_value(serde_json::json!({
            "name": "Central Park",
            "lat": 40.78
        }))
        .unwrap();
        let tag = TagInstance::new("location", "is", value);
        assert!(eval(tag, &Event::new("picnic at central park?", 0)));
    }

    #[test]
    fn regex_matches_and_bad_patterns_fail_closed() {
        let tag = TagInstance::new("pattern", "matches regex", r"invoice\s+#\d+");
        assert!(eval(tag, &Event::new("Invoice #42 is due", 0)));
        let broken = TagInstance::new("pattern", "matches regex", "invoice(");
        assert!(!eval(broken, &Event::new("invoice(", 0)));
    }

    #[test]
    fn before_and_after_are_strict() {
        let before = TagInstance::new("time", "before", "2024-01-15T00:00:00Z");
        let after = TagInstance::new("time", "after", "2024-01-15T00:00:00Z");
        assert!(!eval(before.clone(), &Event::new("", JAN_15)));
        assert!(!eval(after.clone(), &Event::new("", JAN_15)));
        assert!(eval(before, &Event::new("", JAN_15 - 1)));
        assert!(eval(after, &Event::new("", JAN_15 + 1)));
    }

    #[test]
    fn unknown_condition_fails_closed() {
        let tag = TagInstance::new("desc", "near", "meeting");
        assert!(!eval(tag, &Event::new("meeting", 0)));
    }

    #[test]
    fn condition_outside_type_fails() {
        let tag = TagInstance::new("Emotion", "contains", "happy");
        assert!(!eval(tag, &Event::new("so happy today", 0)));
    }

    #[test]
    fn first_matching_tag_is_reported() {
        let item = StoredItem::new("x", "X")
            .with_tag(TagInstance::new("desc", "contains", "absent"))
            .with_tag(TagInstance::new("desc", "contains", "lunch"))
            .with_tag(TagInstance::new("desc", "contains", "friday"));
        let event = PreparedEvent::new(&Event::new("Lunch on Friday", 0));
        let idx = item_matches(
            &TagTypeRegistry::builtin(),
            &item,
            &event,
            &RuleOptions::default(),
        );
        assert_eq!(idx, Some(1));
    }
}
