//! Parsing helpers shared by validation and rule evaluation.
//!
//! Every helper here returns `Option`/`bool` instead of an error: a bad date,
//! number, or pattern in user-entered tag data means "does not match", never
//! a failure of the surrounding evaluation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Compiled-size cap applied to tag patterns unless the caller overrides it.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?(?:\d+(?:\.\d+)?|\.\d+)").unwrap_or_else(|err| {
        panic!("bare number pattern must compile: {err}");
    })
});

/// Parse a user-entered timestamp.
///
/// Accepts RFC 3339, naive date-times (read as UTC), bare `YYYY-MM-DD`
/// (midnight UTC), and integer epoch seconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
    }

    None
}

/// Convert event epoch seconds into a UTC timestamp. Out-of-range values
/// yield `None`.
pub fn timestamp_from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Parse a range bound or scalar as a finite `f64`.
pub fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Extract the first bare decimal literal from free text.
pub fn first_number(text: &str) -> Option<f64> {
    BARE_NUMBER
        .find(text)
        .and_then(|m| parse_finite(m.as_str()))
}

/// Compile a tag pattern case-insensitively. Invalid or oversized patterns
/// yield `None`.
pub fn compile_pattern(pattern: &str, size_limit: usize) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    match RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(size_limit)
        .build()
    {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!(pattern, error = %err, "pattern_compile_failed");
            None
        }
    }
}
