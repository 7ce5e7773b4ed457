use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subscribed syndication source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feed {
    /// Opaque identifier, assigned at creation and never changed.
    pub id: String,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    /// Minutes between polls. Clamped to >= 1 before use.
    pub interval_minutes: u64,
}

pub const DEFAULT_INTERVAL_MINUTES: u64 = 10;

impl Feed {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            url: url.into(),
            enabled: true,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }

    pub fn effective_interval_minutes(&self) -> u64 {
        self.interval_minutes.max(1)
    }
}

/// A deduplicated, stored entry belonging to a feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Dedup identifier: guid, or MD5 of link, or MD5 of title.
    pub id: String,
    pub feed_id: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub favorite: bool,
}

/// A parsed-but-not-yet-deduplicated entry from one fetch.
///
/// The parser produces these without a feed id; the caller attaches it when
/// turning a candidate into an [`Item`].
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn into_item(self, feed_id: &str) -> Item {
        Item {
            id: self.id,
            feed_id: feed_id.to_owned(),
            title: self.title,
            link: self.link,
            summary: self.summary,
            published_at: self.published_at,
            read: false,
            favorite: false,
        }
    }
}
