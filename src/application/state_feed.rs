// Feed trait for live aircraft state vectors
use crate::domain::flight::RawStateVector;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Why a feed request produced no payload
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),

    #[error("feed transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("feed returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed feed payload: {0}")]
    Malformed(String),
}

impl FeedError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(timeout)
        } else if err.is_decode() {
            FeedError::Malformed(err.to_string())
        } else {
            FeedError::Transport(err)
        }
    }
}

#[async_trait]
pub trait StateFeed: Send + Sync {
    /// Fetch the current state vectors. A payload without a `states` list is an
    /// empty `Ok`, not an error.
    async fn fetch_states(&self) -> Result<Vec<RawStateVector>, FeedError>;
}
