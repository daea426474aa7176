// OpenSky Network state vector feed
use crate::application::state_feed::{FeedError, StateFeed};
use crate::domain::flight::RawStateVector;
use crate::infrastructure::config::{BoundingBox, FeedSettings};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct OpenSkyFeed {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Deserialize)]
struct StatesResponse {
    // null when no aircraft matched
    #[serde(default)]
    states: Option<Vec<RawStateVector>>,
}

impl OpenSkyFeed {
    pub fn new(client: reqwest::Client, url: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
            bounding_box: None,
        }
    }

    pub fn from_settings(client: reqwest::Client, settings: &FeedSettings) -> Self {
        let feed = Self::new(client, settings.url.clone(), settings.timeout());
        match settings.bounding_box {
            Some(bbox) => feed.with_bounding_box(bbox),
            None => feed,
        }
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    fn parse_states(body: &[u8]) -> Result<Vec<RawStateVector>, FeedError> {
        let payload: StatesResponse =
            serde_json::from_slice(body).map_err(|e| FeedError::Malformed(e.to_string()))?;
        Ok(payload.states.unwrap_or_default())
    }
}

#[async_trait]
impl StateFeed for OpenSkyFeed {
    async fn fetch_states(&self) -> Result<Vec<RawStateVector>, FeedError> {
        let mut request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout);
        if let Some(bbox) = &self.bounding_box {
            request = request.query(&bbox.query_pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FeedError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(FeedError::Status { status, body });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::from_reqwest(e, self.timeout))?;
        let states = Self::parse_states(&body)?;

        tracing::debug!("Received {} state vectors from {}", states.len(), self.url);
        Ok(states)
    }
}
