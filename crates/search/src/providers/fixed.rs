//! Static search provider.
//!
//! Serves a fixed list of hits, optionally loaded from a JSON fixture file.
//! Handy for offline runs and as a test double: it can also be told to fail
//! or to stall.

use crate::client::{SearchHit, SearchRequest, WebSearchClient};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use veritas_core::{AppError, AppResult};

/// Search client returning a fixed set of hits.
#[derive(Debug, Default)]
pub struct StaticSearchClient {
    hits: Vec<SearchHit>,
    delay: Option<Duration>,
    failure: Option<String>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl StaticSearchClient {
    /// Serve these hits for every query.
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    /// Load hits from a JSON array of [`SearchHit`] objects.
    pub fn from_fixture(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Search(format!("Failed to read search fixture {:?}: {}", path, e))
        })?;
        let hits: Vec<SearchHit> = serde_json::from_str(&contents).map_err(|e| {
            AppError::Search(format!("Failed to parse search fixture {:?}: {}", path, e))
        })?;
        tracing::debug!("Loaded {} search hits from {:?}", hits.len(), path);
        Ok(Self::new(hits))
    }

    /// A client whose every search fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of searches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of searches that ran past their delay.
    pub fn completions(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WebSearchClient for StaticSearchClient {
    fn provider_name(&self) -> &str {
        "static"
    }

    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        if let Some(ref message) = self.failure {
            return Err(AppError::Search(message.clone()));
        }

        Ok(self.hits.iter().take(request.max_results).cloned().collect())
    }
}
