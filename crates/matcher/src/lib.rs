//! # Tagmatch Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` decides, for every incoming event, which stored items are
//! relevant to it. It sits on top of the tag ontology (`ontology`): items
//! carry typed tags, and the engine evaluates those tags against the event's
//! text and timestamp.
//!
//! Matching runs in two stages:
//! - **Rules.** Each item's tags are validated against their type
//!   definition and evaluated against the event. Tags on an item are
//!   OR-combined; any firing tag makes the item a hit.
//! - **Fuzzy fallback.** Only when no rule fires at all, an approximate text
//!   search over item names, content, and tag values runs. Hits must score
//!   at or below [`MatchConfig::fuzzy_threshold`] (lower is closer).
//!
//! Malformed tags never fail a call; they simply do not match. The only
//! error surfaced from [`MatchEngine::match_event`] is a failed item load.
//!
//! ## Core Types
//!
//! - [`Event`]: the incoming message (content, epoch-seconds timestamp, author).
//! - [`StoredItem`]: an item and its tags, as returned by an [`ItemSource`].
//! - [`MatchEngine`]: the two-stage matcher.
//! - [`MatchResult`]: deduplicated hits plus the [`MatchOrigin`] that produced them.
//! - [`FuzzyIndex`]: pluggable approximate search; [`StrsimIndex`] is the default.
//! - [`NotificationSink`]: told about each non-empty result.
//!
//! ## Example Usage
//!
//! ```
//! use matcher::{Event, InMemoryItemSource, MatchConfig, MatchEngine, MatchOrigin, StoredItem};
//! use ontology::TagInstance;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), matcher::MatchError> {
//! let items = vec![
//!     StoredItem::new("n1", "Team sync")
//!         .with_tag(TagInstance::new("Business", "is", "meeting")),
//! ];
//! let engine = MatchEngine::new(InMemoryItemSource::new(items), MatchConfig::default())?;
//!
//! let result = engine
//!     .match_event(&Event::new("Meeting moved to 3pm", 1_705_276_800))
//!     .await?;
//! assert_eq!(result.origin, MatchOrigin::Rule);
//! assert_eq!(result.item_ids(), vec!["n1"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Every call runs inside a `matcher.match_event` tracing span and ends with
//! a `match_success` or `match_failure` event. Install a [`MatchMetrics`]
//! implementation via [`set_match_metrics`] to record per-event latency and
//! hit counts.

pub mod engine;
pub mod fuzzy;
pub mod metrics;
pub mod notify;
pub mod rules;
pub mod source;
pub mod types;

pub use crate::engine::MatchEngine;
pub use crate::fuzzy::{
    default_index_factory, FuzzyConfig, FuzzyDocument, FuzzyHit, FuzzyIndex, IndexFactory,
    StrsimIndex,
};
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::notify::{format_notification, NotificationSink, TracingSink};
pub use crate::rules::{evaluate_tag, item_matches, PreparedEvent, RuleOptions};
pub use crate::source::{InMemoryItemSource, ItemSource, JsonFileItemSource, SourceError};
pub use crate::types::{
    Event, MatchConfig, MatchError, MatchHit, MatchOrigin, MatchResult, StoredItem,
    DEFAULT_FUZZY_THRESHOLD,
};
