//! Item sources: where the engine loads its snapshot of stored items from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::types::StoredItem;

/// Failure to load the item collection. This is the only failure that
/// propagates out of a match call.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("item source unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read items: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode items: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Key/value object store exposing the whole collection.
///
/// Implementations hand out a fresh snapshot on every call; the engine never
/// mutates what it gets back.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn get_all(&self) -> Result<Vec<StoredItem>, SourceError>;
}

#[async_trait]
impl<S: ItemSource + ?Sized> ItemSource for Arc<S> {
    async fn get_all(&self) -> Result<Vec<StoredItem>, SourceError> {
        (**self).get_all().await
    }
}

/// In-process collection, shareable between an editor side that writes and
/// engines that read.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemSource {
    items: Arc<RwLock<Vec<StoredItem>>>,
}

impl InMemoryItemSource {
    pub fn new(items: Vec<StoredItem>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Replace the whole collection.
    pub async fn replace(&self, items: Vec<StoredItem>) {
        *self.items.write().await = items;
    }

    /// Insert or replace one item by id.
    pub async fn upsert(&self, item: StoredItem) {
        let mut guard = self.items.write().await;
        match guard.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => guard.push(item),
        }
    }

    /// Remove an item (and with it, its tags). Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut guard = self.items.write().await;
        let before = guard.len();
        guard.retain(|item| item.id != id);
        guard.len() != before
    }
}

#[async_trait]
impl ItemSource for InMemoryItemSource {
    async fn get_all(&self) -> Result<Vec<StoredItem>, SourceError> {
        Ok(self.items.read().await.clone())
    }
}

/// A JSON file holding an array of items, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileItemSource {
    path: PathBuf,
}

impl JsonFileItemSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemSource for JsonFileItemSource {
    async fn get_all(&self) -> Result<Vec<StoredItem>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
