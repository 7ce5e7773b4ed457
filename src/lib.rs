//! Feed ingestion engine.
//!
//! Periodically fetches RSS 2.0 and Atom feeds, normalizes entries into one
//! item model, deduplicates against stored history, caps per-feed retention
//! and gates "new item" notifications. The persistent store and the
//! notification sink are injected trait objects; see [`store`].

pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod scheduler;
pub mod store;

pub use config::EngineConfig;
pub use engine::{CheckOutcome, IngestEngine};
pub use error::FetchError;
pub use fetcher::FeedFetcher;
pub use ingest::{merge, MergeOutcome, MAX_ITEMS_PER_FEED, NOTIFY_LIMIT};
pub use model::{Candidate, Feed, Item, DEFAULT_INTERVAL_MINUTES};
pub use parser::parse;
pub use scheduler::PollScheduler;
pub use store::{FeedStore, JsonStore, LogNotifier, MemoryStore, Notifier};
