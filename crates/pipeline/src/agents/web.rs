//! Web retrieval agent.

use crate::types::{EvidenceItem, Query};
use std::collections::HashSet;
use std::sync::Arc;
use veritas_core::{AppResult, SourceKind};
use veritas_search::{SearchHit, SearchRequest, WebSearchClient};

/// Longest snippet kept as evidence text, in characters.
pub const MAX_SNIPPET_CHARS: usize = 500;

/// Condenses web search hits into evidence spans.
pub struct WebAgent {
    client: Arc<dyn WebSearchClient>,
}

impl WebAgent {
    pub fn new(client: Arc<dyn WebSearchClient>) -> Self {
        Self { client }
    }

    pub async fn retrieve(&self, query: &Query, top_k: usize) -> AppResult<Vec<EvidenceItem>> {
        let hits = self
            .client
            .search(&SearchRequest::new(query.text.clone(), top_k))
            .await?;
        let total = hits.len();

        let mut seen_urls = HashSet::new();
        let mut items: Vec<EvidenceItem> = hits
            .into_iter()
            .enumerate()
            .filter(|(_, hit)| seen_urls.insert(hit.url.clone()))
            .filter_map(|(position, hit)| hit_to_evidence(position, hit))
            .collect();

        super::rank(&mut items, top_k);

        tracing::debug!(
            "Web agent kept {} of {} hits from {}",
            items.len(),
            total,
            self.client.provider_name()
        );
        Ok(items)
    }
}

/// Score for a hit: the provider's own score when reported, otherwise a
/// decay over the position in the provider's ranking.
pub fn hit_score(position: usize, provider_score: Option<f32>) -> f32 {
    match provider_score {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => (0.8 - 0.05 * position as f32).max(0.1),
    }
}

/// Collapse whitespace and cap the length at [`MAX_SNIPPET_CHARS`].
pub fn normalize_snippet(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_SNIPPET_CHARS) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}

fn hit_to_evidence(position: usize, hit: SearchHit) -> Option<EvidenceItem> {
    let mut text = normalize_snippet(&hit.snippet);
    if text.is_empty() {
        text = normalize_snippet(&hit.title);
    }
    if text.is_empty() || hit.url.trim().is_empty() {
        return None;
    }

    Some(EvidenceItem::new(
        text,
        hit.url,
        hit_score(position, hit.score),
        SourceKind::Web,
    ))
}
