//! SerpAPI (Google engine) search provider.

use crate::client::{SearchHit, SearchRequest, WebSearchClient};
use serde::Deserialize;
use std::time::Duration;
use veritas_core::{AppError, AppResult};

const SERPAPI_URL: &str = "https://serpapi.com/search";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<SerpResult>,
}

#[derive(Debug, Deserialize)]
struct SerpResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// SerpAPI client.
pub struct SerpApiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl SerpApiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: SERPAPI_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    fn convert(response: SerpResponse, max_results: usize) -> Vec<SearchHit> {
        response
            .organic_results
            .into_iter()
            .filter_map(|r| {
                let url = r.link?;
                Some((url, r.title, r.snippet))
            })
            .take(max_results)
            .enumerate()
            .map(|(rank, (url, title, snippet))| SearchHit {
                title: title.unwrap_or_else(|| url.clone()),
                url,
                snippet: snippet.unwrap_or_default(),
                score: None,
                rank: rank as u32,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl WebSearchClient for SerpApiClient {
    fn provider_name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchHit>> {
        tracing::debug!(query = %request.query, "Querying SerpAPI");

        let num = request.max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("engine", "google"),
                ("q", request.query.as_str()),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Search(format!("SerpAPI request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Search(format!(
                "SerpAPI returned status {}",
                response.status()
            )));
        }

        let body: SerpResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse SerpAPI response: {}", e)))?;

        Ok(Self::convert(body, request.max_results))
    }
}
