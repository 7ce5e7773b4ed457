//! External-collaborator boundaries: the persistent store and the notifier.
//!
//! Both are trait objects injected into the engine so tests substitute
//! fakes. [`JsonStore`] is the shipped store: feeds and per-feed items as
//! pretty JSON under a directory, written atomically via a tmp file rename,
//! with a tmp-file fallback when the main file is corrupt.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::model::{Feed, Item};

/// Per-key strongly consistent store for feed config and item history.
#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn get_feed(&self, feed_id: &str) -> Option<Feed>;
    async fn list_feeds(&self) -> Vec<Feed>;
    async fn upsert_feed(&self, feed: Feed);
    async fn remove_feed(&self, feed_id: &str);

    async fn items(&self, feed_id: &str) -> Vec<Item>;
    async fn put_items(&self, feed_id: &str, items: Vec<Item>);
    async fn remove_items(&self, feed_id: &str);

    /// Flip an item's read flag on. No-op when absent or already read.
    async fn mark_read(&self, feed_id: &str, item_id: &str) {
        let mut items = self.items(feed_id).await;
        if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
            if !item.read {
                item.read = true;
                self.put_items(feed_id, items).await;
            }
        }
    }

    async fn toggle_favorite(&self, feed_id: &str, item_id: &str) {
        let mut items = self.items(feed_id).await;
        if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
            item.favorite = !item.favorite;
            self.put_items(feed_id, items).await;
        }
    }
}

/// Fire-and-forget notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, feed_name: &str, title: &str, link: &str);
}

/// Notifier that only writes to the log. Useful headless and in examples.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, feed_name: &str, title: &str, link: &str) {
        info!(feed = %feed_name, title = %title, link = %link, "new item");
    }
}

#[derive(Default)]
struct MemoryInner {
    feeds: Vec<Feed>,
    items: HashMap<String, Vec<Item>>,
}

/// Volatile store for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn get_feed(&self, feed_id: &str) -> Option<Feed> {
        let inner = self.inner.read().await;
        inner.feeds.iter().find(|feed| feed.id == feed_id).cloned()
    }

    async fn list_feeds(&self) -> Vec<Feed> {
        self.inner.read().await.feeds.clone()
    }

    async fn upsert_feed(&self, feed: Feed) {
        let mut inner = self.inner.write().await;
        match inner.feeds.iter_mut().find(|existing| existing.id == feed.id) {
            Some(existing) => *existing = feed,
            None => inner.feeds.push(feed),
        }
    }

    async fn remove_feed(&self, feed_id: &str) {
        let mut inner = self.inner.write().await;
        inner.feeds.retain(|feed| feed.id != feed_id);
    }

    async fn items(&self, feed_id: &str) -> Vec<Item> {
        let inner = self.inner.read().await;
        inner.items.get(feed_id).cloned().unwrap_or_default()
    }

    async fn put_items(&self, feed_id: &str, items: Vec<Item>) {
        let mut inner = self.inner.write().await;
        inner.items.insert(feed_id.to_owned(), items);
    }

    async fn remove_items(&self, feed_id: &str) {
        let mut inner = self.inner.write().await;
        inner.items.remove(feed_id);
    }
}

/// JSON-file-backed store.
pub struct JsonStore {
    inner: Arc<RwLock<MemoryInner>>,
    feeds_path: PathBuf,
    items_path: PathBuf,
}

impl JsonStore {
    /// Load persisted state from `dir`, creating it if needed. Corrupt or
    /// missing files fall back to the last tmp file, then to empty state.
    pub async fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        if let Err(err) = tokio::fs::create_dir_all(dir).await {
            warn!(error = %err, dir = %dir.display(), "failed to create store dir");
        }
        let feeds_path = dir.join("feeds.json");
        let items_path = dir.join("items.json");

        let feeds: Vec<Feed> = read_json_with_tmp_fallback(&feeds_path).await;
        let items: HashMap<String, Vec<Item>> = read_json_with_tmp_fallback(&items_path).await;
        info!(feeds = feeds.len(), dir = %dir.display(), "loaded feed store");

        Self {
            inner: Arc::new(RwLock::new(MemoryInner { feeds, items })),
            feeds_path,
            items_path,
        }
    }

    async fn persist_feeds(&self) {
        let feeds = self.inner.read().await.feeds.clone();
        write_json_atomic(&self.feeds_path, &feeds).await;
    }

    async fn persist_items(&self) {
        let items = self.inner.read().await.items.clone();
        write_json_atomic(&self.items_path, &items).await;
    }
}

async fn read_json_with_tmp_fallback<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                match tokio::fs::read(&tmp).await {
                    Ok(tmp_bytes) => serde_json::from_slice::<T>(&tmp_bytes).unwrap_or_default(),
                    Err(_) => T::default(),
                }
            }
        },
        Err(_) => T::default(),
    }
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) {
    let bytes = match serde_json::to_vec_pretty(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to serialize store state");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    let tmp = path.with_extension("json.tmp");
    if let Err(err) = tokio::fs::write(&tmp, &bytes).await {
        warn!(error = %err, path = %tmp.display(), "failed to write tmp store file");
        return;
    }
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        warn!(error = %err, path = %path.display(), "failed to persist store file");
    } else {
        debug!(path = %path.display(), bytes = bytes.len(), "persisted store file");
    }
}

#[async_trait]
impl FeedStore for JsonStore {
    async fn get_feed(&self, feed_id: &str) -> Option<Feed> {
        let inner = self.inner.read().await;
        inner.feeds.iter().find(|feed| feed.id == feed_id).cloned()
    }

    async fn list_feeds(&self) -> Vec<Feed> {
        self.inner.read().await.feeds.clone()
    }

    async fn upsert_feed(&self, feed: Feed) {
        {
            let mut inner = self.inner.write().await;
            match inner.feeds.iter_mut().find(|existing| existing.id == feed.id) {
                Some(existing) => *existing = feed,
                None => inner.feeds.push(feed),
            }
        }
        self.persist_feeds().await;
    }

    async fn remove_feed(&self, feed_id: &str) {
        {
            let mut inner = self.inner.write().await;
            inner.feeds.retain(|feed| feed.id != feed_id);
        }
        self.persist_feeds().await;
    }

    async fn items(&self, feed_id: &str) -> Vec<Item> {
        let inner = self.inner.read().await;
        inner.items.get(feed_id).cloned().unwrap_or_default()
    }

    async fn put_items(&self, feed_id: &str, items: Vec<Item>) {
        {
            let mut inner = self.inner.write().await;
            inner.items.insert(feed_id.to_owned(), items);
        }
        self.persist_items().await;
    }

    async fn remove_items(&self, feed_id: &str) {
        {
            let mut inner = self.inner.write().await;
            inner.items.remove(feed_id);
        }
        self.persist_items().await;
    }
}
