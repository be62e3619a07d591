//! The tag type registry: single source of truth for what a tag name means.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::condition::Condition;
use crate::definition::{SemanticKind, TagTypeDefinition};

/// Name of the definition unknown tag names resolve to.
pub const FALLBACK_TYPE: &str = "string";

const EMOTIONS: &[&str] = &[
    "happy", "sad", "angry", "excited", "anxious", "calm", "grateful", "tired",
];

const BUSINESS: &[&str] = &[
    "meeting", "invoice", "payment", "contract", "proposal", "deadline", "delivery",
];

static DEFAULT_REGISTRY: Lazy<TagTypeRegistry> = Lazy::new(TagTypeRegistry::builtin);

/// Shared, lazily built instance of [`TagTypeRegistry::builtin`].
pub fn default_registry() -> &'static TagTypeRegistry {
    &DEFAULT_REGISTRY
}

/// Immutable name → definition table with a permissive text fallback.
#[derive(Debug, Clone)]
pub struct TagTypeRegistry {
    definitions: HashMap<String, TagTypeDefinition>,
    fallback: TagTypeDefinition,
}

impl TagTypeRegistry {
    /// Start from an empty table with only the text fallback.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            definitions: HashMap::new(),
            fallback: fallback_definition(),
        }
    }

    /// The built-in tag vocabulary.
    pub fn builtin() -> Self {
        use Condition::*;

        Self::builder()
            .with(TagTypeDefinition::new(
                "number",
                SemanticKind::NumberRange,
                [Is, Between],
            ))
            .with(TagTypeDefinition::new(
                "time",
                SemanticKind::TimeRange,
                [Is, Before, After, Between],
            ))
            .with(TagTypeDefinition::new(
                "location",
                SemanticKind::Object,
                [Is, Contains],
            ))
            .with(TagTypeDefinition::new(
                "pattern",
                SemanticKind::Regex,
                [MatchesRegex],
            ))
            .with(TagTypeDefinition::new(
                "People",
                SemanticKind::Enum { options: vec![] },
                [Is, Contains],
            ))
            .with(TagTypeDefinition::new(
                "Emotion",
                SemanticKind::Enum {
                    options: owned(EMOTIONS),
                },
                [Is],
            ))
            .with(TagTypeDefinition::new(
                "Business",
                SemanticKind::Enum {
                    options: owned(BUSINESS),
                },
                [Is, Contains],
            ))
            .build()
    }

    /// Exact-match lookup; unknown names resolve to the `string` definition.
    pub fn lookup(&self, name: &str) -> &TagTypeDefinition {
        self.definitions.get(name).unwrap_or(&self.fallback)
    }

    /// Whether `name` has its own definition (as opposed to the fallback).
    pub fn contains(&self, name: &str) -> bool {
        name == FALLBACK_TYPE || self.definitions.contains_key(name)
    }

    /// Registered names, sorted, including the fallback.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.push(self.fallback.name());
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl Default for TagTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Construction-time helper; the built registry has no mutation API.
#[derive(Debug)]
pub struct RegistryBuilder {
    definitions: HashMap<String, TagTypeDefinition>,
    fallback: TagTypeDefinition,
}

impl RegistryBuilder {
    /// Register a definition, replacing any earlier one with the same name.
    /// Registering `string` replaces the fallback itself.
    pub fn with(mut self, definition: TagTypeDefinition) -> Self {
        if definition.name() == FALLBACK_TYPE {
            self.fallback = definition;
        } else {
            self.definitions
                .insert(definition.name().to_string(), definition);
        }
        self
    }

    pub fn build(self) -> TagTypeRegistry {
        TagTypeRegistry {
            definitions: self.definitions,
            fallback: self.fallback,
        }
    }
}

fn fallback_definition() -> TagTypeDefinition {
    use Condition::*;

    TagTypeDefinition::new(
        FALLBACK_TYPE,
        SemanticKind::Text,
        [Is, Contains, MatchesRegex, Before, After, Between],
    )
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}
