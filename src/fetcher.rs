//! One-shot HTTP fetch for a feed.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::EngineConfig;
use crate::error::FetchError;
use crate::model::Feed;

#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(config: &EngineConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// Perform a single GET for the feed and return the raw body.
    ///
    /// The body is returned unconditionally on a 2xx response, even when
    /// empty; parsing happens downstream. A syntactically bad URL fails
    /// without any network I/O.
    pub async fn fetch(&self, feed: &Feed) -> Result<Bytes, FetchError> {
        if Url::parse(&feed.url).is_err() {
            warn!(feed = %feed.name, url = %feed.url, "feed url is not well-formed");
            return Err(FetchError::InvalidUrl(feed.url.clone()));
        }

        let response = self.client.get(&feed.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(feed = %feed.name, status = status.as_u16(), "non-success status from feed");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!(feed = %feed.name, bytes = body.len(), "fetched feed body");
        Ok(body)
    }
}
