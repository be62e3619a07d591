use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Relational operator a tag applies to an event.
///
/// Identifiers are read case-insensitively. Anything unrecognized is kept
/// verbatim in [`Condition::Other`]; no type definition ever declares an
/// `Other` condition, so such tags fail validation and never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Is,
    Contains,
    Before,
    After,
    Between,
    MatchesRegex,
    Other(String),
}

impl Condition {
    /// Wire identifier for this condition.
    pub fn as_str(&self) -> &str {
        match self {
            Condition::Is => "is",
            Condition::Contains => "contains",
            Condition::Before => "before",
            Condition::After => "after",
            Condition::Between => "between",
            Condition::MatchesRegex => "matches regex",
            Condition::Other(raw) => raw.as_str(),
        }
    }

    /// Whether the condition carries a two-sided range value.
    pub fn is_range(&self) -> bool {
        matches!(self, Condition::Between)
    }
}

impl From<&str> for Condition {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "is" => Condition::Is,
            "contains" => Condition::Contains,
            "before" => Condition::Before,
            "after" => Condition::After,
            "between" => Condition::Between,
            "matches regex" => Condition::MatchesRegex,
            _ => Condition::Other(raw.to_string()),
        }
    }
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        Condition::from(raw.as_str())
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Condition {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Condition::from(s))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
