//! Web search capability abstraction.

use serde::{Deserialize, Serialize};
use veritas_core::AppResult;

/// A web search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text
    pub query: String,

    /// Maximum number of hits to return
    pub max_results: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
        }
    }
}

/// A single search hit as returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title
    #[serde(default)]
    pub title: String,

    /// Result URL
    pub url: String,

    /// Snippet or extracted page content
    #[serde(default)]
    pub snippet: String,

    /// Provider relevance score, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// 0-based position in the provider's ranking
    #[serde(default)]
    pub rank: u32,
}

/// Trait for web search backends.
#[async_trait::async_trait]
pub trait WebSearchClient: Send + Sync {
    /// Provider name (e.g., "serpapi", "tavily").
    fn provider_name(&self) -> &str;

    /// Run a search and return hits in provider rank order.
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchHit>>;
}
