use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use ontology::TagTypeRegistry;
use tracing::{debug, info, warn, Instrument};

use crate::fuzzy::{default_index_factory, FuzzyDocument, FuzzyHit, IndexFactory};
use crate::metrics::metrics_recorder;
use crate::notify::{format_notification, NotificationSink};
use crate::rules::{item_matches, PreparedEvent, RuleOptions};
use crate::source::ItemSource;
use crate::types::{Event, MatchConfig, MatchError, MatchHit, MatchOrigin, MatchResult, StoredItem};


/// Decides, for one incoming event, which stored items are relevant.
///
/// Stateless between calls: every call loads a fresh item snapshot, and the
/// fuzzy fallback builds its own index from that snapshot. Calls must be
/// polled inside a Tokio runtime; the fuzzy index is built on the blocking
/// pool.
pub struct MatchEngine<S> {
    source: S,
    registry: Arc<TagTypeRegistry>,
    config: MatchConfig,
    index_factory: IndexFactory,
}

impl<S: ItemSource> MatchEngine<S> {
    /// Engine over `source` with the built-in tag registry and the default
    /// fuzzy index.
    pub fn new(source: S, config: MatchConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            source,
            registry: Arc::new(TagTypeRegistry::builtin()),
            config,
            index_factory: default_index_factory(),
        })
    }

    /// Use a custom tag registry.
    pub fn with_registry(mut self, registry: impl Into<Arc<TagTypeRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    /// Use a custom fuzzy index implementation.
    pub fn with_index_factory(mut self, factory: IndexFactory) -> Self {
        self.index_factory = factory;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn registry(&self) -> &TagTypeRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Match one event against the whole item collection.
    ///
    /// Rule matches always win: when any item matches by tag, the fuzzy
    /// stage is skipped. Only a failed item load is returned as an error.
    pub async fn match_event(&self, event: &Event) -> Result<MatchResult, MatchError> {
        let span = tracing::info_span!(
            "matcher.match_event",
            event_id = ?event.id,
            pubkey = %event.pubkey,
            created_at = event.created_at
        );
        self.match_event_inner(event).instrument(span).await
    }

    /// [`match_event`](Self::match_event), then tell `sink` about a
    /// non-empty result. Empty results produce no notification.
    pub async fn match_and_notify<N>(
        &self,
        event: &Event,
        sink: &N,
    ) -> Result<MatchResult, MatchError>
    where
        N: NotificationSink + ?Sized,
    {
        let result = self.match_event(event).await?;
        if !result.is_empty() {
            sink.notify(&format_notification(&result));
        }
        Ok(result)
    }

    async fn match_event_inner(&self, event: &Event) -> Result<MatchResult, MatchError> {
        let start = Instant::now();
        let prepared = PreparedEvent::new(event);

        let items = match self.source.get_all().await {
            Ok(items) => items,
            Err(err) => {
                let elapsed_micros = start.elapsed().as_micros();
                warn!(error = %err, elapsed_micros, "match_failure");
                if let Some(recorder) = metrics_recorder() {
                    recorder.record_source_failure(start.elapsed());
                }
                return Err(err.into());
            }
        };
        let item_count = items.len();

        let rule_hits = self.rule_stage(&items, &prepared);
        let result = if !rule_hits.is_empty() {
            MatchResult {
                origin: MatchOrigin::Rule,
                hits: rule_hits,
            }
        } else if self.config.fuzzy_fallback {
            debug!(items = item_count, "fuzzy_fallback");
            let hits = self.fuzzy_stage(items, &event.content).await;
            if hits.is_empty() {
                MatchResult::empty()
            } else {
                MatchResult {
                    origin: MatchOrigin::Fuzzy,
                    hits,
                }
            }
        } else {
            MatchResult::empty()
        };

        let latency = start.elapsed();
        info!(
            origin = result.origin.as_str(),
            hits = result.len(),
            items = item_count,
            elapsed_micros = latency.as_micros(),
            "match_success"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_match(result.origin, latency, result.len());
        }

        Ok(result)
    }

    /// Items with at least one matching tag, first occurrence per id.
    fn rule_stage(&self, items: &[StoredItem], event: &PreparedEvent) -> Vec<MatchHit> {
        let opts = RuleOptions {
            regex_size_limit: self.config.regex_size_limit,
        };
        let mut seen: HashSet<&str> = HashSet::new();
        let mut hits = Vec::new();

        for item in items {
            if seen.contains(item.id.as_str()) {
                continue;
            }
            if let Some(tag_idx) = item_matches(&self.registry, item, event, &opts) {
                seen.insert(item.id.as_str());
                hits.push(MatchHit {
                    item: item.clone(),
                    matched_tag: Some(tag_idx),
                    fuzzy_score: None,
                });
            }
        }
        hits
    }

    /// Build a fresh index over the snapshot and keep hits within threshold.
    async fn fuzzy_stage(&self, items: Vec<StoredItem>, text: &str) -> Vec<MatchHit> {
        if text.trim().is_empty() || items.is_empty() {
            return Vec::new();
        }

        let factory = Arc::clone(&self.index_factory);
        let fuzzy_cfg = self.config.fuzzy.clone();
        let threshold = self.config.fuzzy_threshold;
        let limit = self.config.max_fuzzy_results;
        let query = text.to_string();

        let joined = tokio::task::spawn_blocking(move || {
            let mut index = factory(&fuzzy_cfg);
            index.set_collection(
                items
                    .iter()
                    .enumerate()
                    .map(|(position, item)| FuzzyDocument::from_item(position, item))
                    .collect(),
            );
            let ranked = index.search(&query);
            select_fuzzy_hits(&items, ranked, threshold, limit)
        })
        .await;

        match joined {
            Ok(hits) => hits,
            Err(err) => {
                warn!(error = %err, "fuzzy_index_failed");
                Vec::new()
            }
        }
    }
}

/// Threshold, dedupe, and cap ranked index output. Positions the index
/// invented (outside the snapshot) are dropped.
fn select_fuzzy_hits(
    items: &[StoredItem],
    mut ranked: Vec<FuzzyHit>,
    threshold: f64,
    limit: Option<usize>,
) -> Vec<MatchHit> {
    ranked.retain(|hit| hit.score.is_finite() && hit.score <= threshold);
    ranked.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen: HashSet<&str> = HashSet::new();
    let mut hits = Vec::new();
    for hit in ranked {
        let Some(item) = items.get(hit.position) else {
            continue;
        };
        if !seen.insert(item.id.as_str()) {
            continue;
        }
        hits.push(MatchHit {
            item: item.clone(),
            matched_tag: None,
            fuzzy_score: Some(hit.score),
        });
        if limit.is_some_and(|max| hits.len() >= max) {
            break;
        }
    }
    hits
}
