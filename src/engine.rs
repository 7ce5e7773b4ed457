//! One fetch→parse→merge→persist→notify cycle, plus the on-demand check
//! entry points.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::fetcher::FeedFetcher;
use crate::ingest;
use crate::model::Feed;
use crate::parser;
use crate::store::{FeedStore, Notifier};

/// User-facing outcome of an on-demand check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Success { new_count: usize, total_count: usize },
    /// Fetch and parse succeeded but the document held no entries.
    Empty,
    /// Network, transport or non-2xx failure. Detail is in the log.
    FetchError,
    /// The feed URL is not well-formed; nothing was attempted.
    InvalidUrl,
}

pub struct IngestEngine {
    store: Arc<dyn FeedStore>,
    notifier: Arc<dyn Notifier>,
    fetcher: FeedFetcher,
}

impl IngestEngine {
    pub fn new(config: &EngineConfig, store: Arc<dyn FeedStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            fetcher: FeedFetcher::new(config),
        }
    }

    pub fn store(&self) -> &Arc<dyn FeedStore> {
        &self.store
    }

    /// Run one full cycle for `feed` right now, bypassing any schedule.
    pub async fn check_feed(&self, feed: &Feed) -> CheckOutcome {
        info!(feed = %feed.name, url = %feed.url, "checking feed");

        let body = match self.fetcher.fetch(feed).await {
            Ok(body) => body,
            Err(err) if err.is_invalid_url() => return CheckOutcome::InvalidUrl,
            Err(err) => {
                warn!(feed = %feed.name, error = %err, "fetch failed");
                return CheckOutcome::FetchError;
            }
        };

        let candidates = parser::parse(&body);
        if candidates.is_empty() {
            warn!(feed = %feed.name, "feed is empty (no item/entry)");
            return CheckOutcome::Empty;
        }

        let existing = self.store.items(&feed.id).await;
        let outcome = ingest::merge(&feed.id, existing, candidates);
        info!(
            feed = %feed.name,
            fresh = outcome.fresh.len(),
            total = outcome.items.len(),
            first_fetch = outcome.first_fetch,
            "merged candidates"
        );

        if !outcome.fresh.is_empty() {
            self.store.put_items(&feed.id, outcome.items.clone()).await;
            for item in outcome.notifiable() {
                self.notifier
                    .deliver(&feed.name, &item.title, &item.link)
                    .await;
            }
        }

        CheckOutcome::Success {
            new_count: outcome.fresh.len(),
            total_count: outcome.items.len(),
        }
    }

    /// Check every enabled feed once, sequentially, reporting per-feed
    /// outcomes.
    pub async fn check_all(&self) -> Vec<(String, CheckOutcome)> {
        let mut results = Vec::new();
        for feed in self.store.list_feeds().await {
            if !feed.enabled {
                continue;
            }
            let outcome = self.check_feed(&feed).await;
            results.push((feed.id, outcome));
        }
        results
    }

    /// Drop a subscription: its configuration and its stored items go
    /// together. The scheduler cancels the feed's loop separately.
    pub async fn remove_feed(&self, feed_id: &str) {
        self.store.remove_feed(feed_id).await;
        self.store.remove_items(feed_id).await;
        info!(feed_id = %feed_id, "removed feed and its items");
    }
}
