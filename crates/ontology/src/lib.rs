//! Tag Ontology
//!
//! Stored items carry semantically-typed tags: a location, a time range, a
//! number range, free text, one of a small vocabulary of emotions. This crate
//! decides what each tag *means*.
//!
//! ## What we do here
//!
//! - **Registry** - [`TagTypeRegistry`] maps a type name to its
//!   [`TagTypeDefinition`]. Unknown names resolve to the `string` definition
//!   instead of failing, because tag names come from free-form UI input.
//! - **Conditions** - each type declares the [`Condition`]s it allows
//!   (`is`, `contains`, `before`, `after`, `between`, `matches regex`).
//! - **Validation** - [`TagTypeDefinition::validate`] checks that a value has
//!   the right shape for its condition and that dates, numbers and patterns
//!   actually parse. It answers `bool`; nothing in validation returns an error.
//! - **Wire format** - `serialize`/`deserialize` on each definition are exact
//!   inverses for every value that validates.
//!
//! ## Example
//!
//! ```
//! use ontology::{default_registry, Condition, TagInstance, TagValue};
//!
//! let registry = default_registry();
//! let tag = TagInstance::new(
//!     "time",
//!     Condition::Between,
//!     TagValue::time_range("2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z"),
//! );
//! assert!(tag.is_valid(registry));
//!
//! // Unknown names behave like `string` tags.
//! let desc = TagInstance::new("desc", "contains", "meeting");
//! assert_eq!(desc.definition(registry).name(), "string");
//! ```

mod condition;
mod definition;
mod error;
pub mod parse;
mod registry;
mod tag;
mod value;

pub use crate::condition::Condition;
pub use crate::definition::{SemanticKind, TagTypeDefinition};
pub use crate::error::OntologyError;
pub use crate::registry::{default_registry, RegistryBuilder, TagTypeRegistry, FALLBACK_TYPE};
pub use crate::tag::{TagInstance, WireTag};
pub use crate::value::{NumberRange, TagValue, TimeRange, ValueShape};
