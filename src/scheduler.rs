//! Independent, cancellable polling loop per feed.
//!
//! Each loop re-reads its feed's enabled flag and interval from the store at
//! the top of every iteration, so configuration edits take effect without a
//! restart, and terminates itself when the feed disappears. Cancellation is
//! cooperative: the in-flight cycle is raced against the cancel channel, so
//! once cancellation is observed no merge/persist/notify side effect runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::IngestEngine;

struct LoopHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

pub struct PollScheduler {
    engine: Arc<IngestEngine>,
    loops: Mutex<HashMap<String, LoopHandle>>,
}

impl PollScheduler {
    pub fn new(engine: Arc<IngestEngine>) -> Self {
        Self {
            engine,
            loops: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<IngestEngine> {
        &self.engine
    }

    /// Spawn one loop for every enabled feed. Any loops already running are
    /// cancelled first.
    pub async fn start(&self) {
        self.stop().await;
        let feeds = self.engine.store().list_feeds().await;
        let mut loops = self.loops.lock().await;
        for feed in feeds.into_iter().filter(|feed| feed.enabled) {
            info!(feed = %feed.name, minutes = feed.effective_interval_minutes(), "polling started");
            loops.insert(feed.id.clone(), self.spawn_loop(feed.id));
        }
    }

    /// Cancel every loop and wait for each to wind down.
    pub async fn stop(&self) {
        let handles: Vec<LoopHandle> = {
            let mut loops = self.loops.lock().await;
            loops.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            let _ = handle.cancel_tx.send(());
            if let Err(err) = handle.join.await {
                warn!(error = %err, "poll loop panicked during shutdown");
            }
        }
    }

    /// Equivalent to `stop` then `start`; for global setting changes.
    pub async fn restart_all(&self) {
        self.start().await;
    }

    /// Cancel one feed's loop and, if the feed still exists and is enabled,
    /// spawn a fresh one. Other feeds' schedules are untouched.
    pub async fn restart(&self, feed_id: &str) {
        self.cancel_one(feed_id).await;
        let enabled = self
            .engine
            .store()
            .get_feed(feed_id)
            .await
            .map(|feed| feed.enabled)
            .unwrap_or(false);
        if enabled {
            let mut loops = self.loops.lock().await;
            loops.insert(feed_id.to_owned(), self.spawn_loop(feed_id.to_owned()));
        }
    }

    /// Delete a subscription: cancel its loop, then drop its configuration
    /// and stored items.
    pub async fn remove_feed(&self, feed_id: &str) {
        self.cancel_one(feed_id).await;
        self.engine.remove_feed(feed_id).await;
    }

    /// Whether a loop is currently registered for this feed.
    pub async fn is_polling(&self, feed_id: &str) -> bool {
        self.loops.lock().await.contains_key(feed_id)
    }

    async fn cancel_one(&self, feed_id: &str) {
        let handle = self.loops.lock().await.remove(feed_id);
        if let Some(handle) = handle {
            let _ = handle.cancel_tx.send(());
            if let Err(err) = handle.join.await {
                warn!(error = %err, feed_id = %feed_id, "poll loop panicked during restart");
            }
        }
    }

    fn spawn_loop(&self, feed_id: String) -> LoopHandle {
        let (cancel_tx, cancel_rx) = broadcast::channel(1);
        let engine = self.engine.clone();
        let join = tokio::spawn(run_loop(engine, feed_id, cancel_rx));
        LoopHandle { cancel_tx, join }
    }
}

async fn run_loop(
    engine: Arc<IngestEngine>,
    feed_id: String,
    mut cancel_rx: broadcast::Receiver<()>,
) {
    loop {
        // Always act on the feed's current state, never a snapshot.
        let Some(feed) = engine.store().get_feed(&feed_id).await else {
            info!(feed_id = %feed_id, "feed no longer exists, loop terminating");
            break;
        };

        if feed.enabled {
            tokio::select! {
                _ = cancel_rx.recv() => break,
                outcome = engine.check_feed(&feed) => {
                    // Background loops log and carry on; a feed that is down
                    // resumes on its own once reachable again.
                    debug!(feed = %feed.name, ?outcome, "scheduled check finished");
                }
            }
        } else {
            debug!(feed = %feed.name, "feed disabled, skipping this iteration");
        }

        let minutes = feed.effective_interval_minutes();
        debug!(feed = %feed.name, minutes, "sleeping until next check");
        tokio::select! {
            _ = cancel_rx.recv() => break,
            _ = tokio::time::sleep(Duration::from_secs(minutes * 60)) => {}
        }
    }
}
