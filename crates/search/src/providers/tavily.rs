//! Tavily search provider.

use crate::client::{SearchHit, SearchRequest, WebSearchClient};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use veritas_core::{AppError, AppResult};

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f32>,
}

/// Tavily client.
pub struct TavilyClient {
    api_key: String,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    fn convert(response: TavilyResponse, max_results: usize) -> Vec<SearchHit> {
        response
            .results
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(rank, r)| SearchHit {
                title: if r.title.is_empty() {
                    r.url.clone()
                } else {
                    r.title
                },
                url: r.url,
                snippet: r.content,
                score: r.score,
                rank: rank as u32,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl WebSearchClient for TavilyClient {
    fn provider_name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchHit>> {
        tracing::debug!(query = %request.query, "Querying Tavily");

        let body = TavilyRequest {
            query: &request.query,
            max_results: request.max_results,
            search_depth: "basic",
        };

        let response = self
            .client
            .post(TAVILY_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Search(format!(
                "Tavily returned status {}",
                response.status()
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse Tavily response: {}", e)))?;

        Ok(Self::convert(parsed, request.max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_keeps_provider_scores() {
        let raw = r#"{"results":[
            {"title":"Acme Corp quote","url":"https://quotes.example/acme","content":"Acme trades at $41.20","score":0.93},
            {"title":"","url":"https://blog.example/acme","content":"Opinion piece"}
        ]}"#;
        let parsed: TavilyResponse = serde_json::from_str(raw).unwrap();
        let hits = TavilyClient::convert(parsed, 5);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score, Some(0.93));
        assert_eq!(hits[1].title, "https://blog.example/acme");
        assert_eq!(hits[1].score, None);
        assert_eq!(hits[1].rank, 1);
    }
}
