// Similar-crash backend client
use crate::application::case_study_service::CaseStudySource;
use crate::domain::case_study::CaseStudy;
use crate::infrastructure::config::CaseStudySettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CaseStudyClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SimilarCrashesResponse {
    #[serde(default)]
    results: Option<Vec<CaseStudy>>,
}

impl CaseStudyClient {
    pub fn new(client: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_settings(client: reqwest::Client, settings: &CaseStudySettings) -> Self {
        Self::new(client, settings.backend_url.clone(), settings.timeout())
    }

    fn build_query_url(&self, query: &str) -> String {
        format!(
            "{}/similar_crashes?query={}",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl CaseStudySource for CaseStudyClient {
    async fn similar_crashes(&self, query: &str) -> Result<Vec<CaseStudy>> {
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .context("Failed to send request to case study backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Case study query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<SimilarCrashesResponse>()
            .await
            .context("Failed to parse case study response")?;

        let studies = data.results.unwrap_or_default();
        tracing::debug!("Fetched {} case studies for query '{}'", studies.len(), query);
        Ok(studies)
    }
}
