use thiserror::Error;

/// Failures on the fetch path. Transport errors and non-2xx statuses are
/// deliberately folded together; callers only need "the fetch did not
/// produce a body", the detail goes to the log.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid feed url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("http status {0}")]
    Status(u16),
}

impl FetchError {
    /// True when the URL never left the process.
    pub fn is_invalid_url(&self) -> bool {
        matches!(self, FetchError::InvalidUrl(_))
    }
}
