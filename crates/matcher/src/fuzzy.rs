//! Approximate text search used when no tag rule fires.
//!
//! The engine never keeps an index between calls. Each fallback run asks the
//! [`IndexFactory`] for a fresh [`FuzzyIndex`], loads the current item
//! snapshot into it, queries once, and drops it. Two calls running at the
//! same time therefore never see each other's index.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{MatchError, StoredItem};

/// Tuning for the default [`StrsimIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyConfig {
    /// Fields with fewer alphanumeric characters than this are not searched.
    #[serde(default = "FuzzyConfig::default_min_match_chars")]
    pub min_match_chars: usize,
}

impl FuzzyConfig {
    pub(crate) fn default_min_match_chars() -> usize {
        1
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.min_match_chars == 0 {
            return Err(MatchError::InvalidConfig(
                "fuzzy.min_match_chars must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            min_match_chars: Self::default_min_match_chars(),
        }
    }
}

/// Searchable text of one stored item: its name, its content, and the
/// flattened value of each tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyDocument {
    /// Position of the item in the snapshot the document was built from.
    pub position: usize,
    pub fields: Vec<String>,
}

impl FuzzyDocument {
    pub fn from_item(position: usize, item: &StoredItem) -> Self {
        let mut fields = Vec::with_capacity(2 + item.tags.len());
        fields.push(item.name.clone());
        fields.push(item.content.clone());
        fields.extend(item.tags.iter().map(|tag| tag.value.flatten()));
        Self { position, fields }
    }
}

/// A ranked search result. `score` runs from 0.0 (identical) to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyHit {
    pub position: usize,
    pub score: f64,
}

/// A searchable collection. Implementations return every document they can
/// score, best first; thresholding is the engine's job.
pub trait FuzzyIndex: Send {
    /// Replace the indexed collection.
    fn set_collection(&mut self, docs: Vec<FuzzyDocument>);

    /// Rank documents against `text`.
    fn search(&self, text: &str) -> Vec<FuzzyHit>;
}

/// Builds a fresh, empty index for one fallback run.
pub type IndexFactory = Arc<dyn Fn(&FuzzyConfig) -> Box<dyn FuzzyIndex> + Send + Sync>;

pub fn default_index_factory() -> IndexFactory {
    Arc::new(|cfg: &FuzzyConfig| Box::new(StrsimIndex::new(cfg.clone())) as Box<dyn FuzzyIndex>)
}

/// Default index: normalized Levenshtein similarity (via `strsim`) between
/// the query and the best-aligned word window of each field.
///
/// A query shorter than a field is slid over the field a word at a time, so
/// a short message can match inside a long note. A field shorter than the
/// query is slid over the query too, but its best score is scaled by the
/// square root of the share of query characters it covers. A one-word name
/// then cannot match a sentence on the strength of one similar word.
#[derive(Debug, Clone, Default)]
pub struct StrsimIndex {
    config: FuzzyConfig,
    docs: Vec<IndexedDoc>,
}

#[derive(Debug, Clone)]
struct IndexedDoc {
    position: usize,
    fields: Vec<Vec<String>>,
}

impl StrsimIndex {
    pub fn new(config: FuzzyConfig) -> Self {
        Self {
            config,
            docs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl FuzzyIndex for StrsimIndex {
    fn set_collection(&mut self, docs: Vec<FuzzyDocument>) {
        let min_chars = self.config.min_match_chars;
        self.docs = docs
            .into_iter()
            .map(|doc| IndexedDoc {
                position: doc.position,
                fields: doc
                    .fields
                    .iter()
                    .map(|field| words(field))
                    .filter(|w| w.iter().map(|s| s.chars().count()).sum::<usize>() >= min_chars)
                    .collect(),
            })
            .collect();
    }

    fn search(&self, text: &str) -> Vec<FuzzyHit> {
        let query = words(text);
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<FuzzyHit> = self
            .docs
            .iter()
            .filter(|doc| !doc.fields.is_empty())
            .map(|doc| {
                let best = doc
                    .fields
                    .iter()
                    .map(|field| window_similarity(&query, field))
                    .fold(0.0_f64, f64::max);
                FuzzyHit {
                    position: doc.position,
                    score: 1.0 - best,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn window_similarity(query: &[String], field: &[String]) -> f64 {
    if query.is_empty() || field.is_empty() {
        return 0.0;
    }
    if query.len() <= field.len() {
        return best_window(query, field);
    }

    let query_chars = query.join(" ").chars().count();
    let field_chars = field.join(" ").chars().count();
    let coverage = (field_chars as f64 / query_chars as f64).min(1.0);
    best_window(field, query) * coverage.sqrt()
}

fn best_window(needle: &[String], haystack: &[String]) -> f64 {
    let joined = needle.join(" ");
    haystack
        .windows(needle.len())
        .map(|window| strsim::normalized_levenshtein(&joined, &window.join(" ")))
        .fold(0.0_f64, f64::max)
}
