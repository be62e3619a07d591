//! Workspace umbrella crate for tagmatch.
//!
//! Re-exports the tag ontology (`ontology`) and the matching engine
//! (`matcher`) behind one import path, and adds the pieces a host process
//! needs around them: YAML configuration ([`TagmatchConfig`]) and tracing
//! setup ([`init_tracing`]).
//!
//! ```
//! use tagmatch::{Event, InMemoryItemSource, MatchEngine, StoredItem, TagInstance, TagmatchConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TagmatchConfig::from_yaml("version: \"1.0\"\nmatcher:\n  max_fuzzy_results: 3\n")?;
//! let items = vec![StoredItem::new("n1", "Rent").with_tag(TagInstance::new("desc", "contains", "rent"))];
//! let engine = MatchEngine::new(InMemoryItemSource::new(items), config.to_match_config())?;
//!
//! let result = engine.match_event(&Event::new("rent is due friday", 1_705_276_800)).await?;
//! assert!(result.contains("n1"));
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use config::{
    ConfigLoadError, FuzzyYamlConfig, LoggingConfig, MatcherYamlConfig, TagmatchConfig,
};

pub use ontology::{
    default_registry, Condition, NumberRange, OntologyError, RegistryBuilder, SemanticKind,
    TagInstance, TagTypeDefinition, TagTypeRegistry, TagValue, TimeRange, ValueShape, WireTag,
    FALLBACK_TYPE,
};

pub use matcher::{
    evaluate_tag, format_notification, item_matches, set_match_metrics, Event, FuzzyConfig,
    FuzzyDocument, FuzzyHit, FuzzyIndex, InMemoryItemSource, IndexFactory, ItemSource,
    JsonFileItemSource, MatchConfig, MatchEngine, MatchError, MatchHit, MatchMetrics, MatchOrigin,
    MatchResult, NotificationSink, PreparedEvent, RuleOptions, SourceError, StoredItem,
    StrsimIndex, TracingSink, DEFAULT_FUZZY_THRESHOLD,
};

/// Install the global `tracing` subscriber described by `logging`.
///
/// `RUST_LOG` overrides `logging.level` when set. Fails if a subscriber is
/// already installed or the filter directive does not parse.
#[cfg(feature = "cli")]
pub fn init_tracing(
    logging: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::EnvFilter;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
