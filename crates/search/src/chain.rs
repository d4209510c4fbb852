//! Ordered provider fallback.

use crate::client::{SearchHit, SearchRequest, WebSearchClient};
use std::sync::Arc;
use veritas_core::{AppError, AppResult};

/// Tries each provider in order and returns the first non-empty result.
///
/// A provider that errors or returns nothing hands over to the next one.
/// If every provider errored, the last error is returned; if at least one
/// answered with an empty list, the result is empty.
pub struct FallbackSearch {
    providers: Vec<Arc<dyn WebSearchClient>>,
}

impl FallbackSearch {
    pub fn new(providers: Vec<Arc<dyn WebSearchClient>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait::async_trait]
impl WebSearchClient for FallbackSearch {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchHit>> {
        let mut last_error = None;
        let mut answered = false;

        for provider in &self.providers {
            match provider.search(request).await {
                Ok(hits) if !hits.is_empty() => {
                    tracing::debug!(
                        provider = provider.provider_name(),
                        hits = hits.len(),
                        "Search provider answered"
                    );
                    return Ok(hits);
                }
                Ok(_) => {
                    answered = true;
                    tracing::debug!(provider = provider.provider_name(), "No hits, trying next");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.provider_name(), "Search failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ if self.providers.is_empty() => Err(AppError::Search(
                "No web search provider configured".to_string(),
            )),
            _ => Ok(Vec::new()),
        }
    }
}
