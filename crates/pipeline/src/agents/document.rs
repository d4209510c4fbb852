//! Document retrieval agent.

use crate::types::{EvidenceItem, Query};
use std::sync::Arc;
use veritas_core::{AppError, AppResult, RetrievalSettings, SourceKind};
use veritas_knowledge::DocumentIndex;

/// Retrieves chunks from the document index as evidence.
///
/// Scores are the index's cosine similarity clamped to [0, 1]; chunks below
/// the configured minimum are dropped. Source ids are `<document>#<chunk>`.
pub struct DocumentAgent {
    index: Arc<dyn DocumentIndex>,
    min_score: f32,
}

impl DocumentAgent {
    pub fn new(index: Arc<dyn DocumentIndex>, settings: &RetrievalSettings) -> Self {
        Self {
            index,
            min_score: settings.min_document_score,
        }
    }

    /// Whether the underlying index has anything to search.
    pub fn has_documents(&self) -> bool {
        !self.index.is_empty()
    }

    pub async fn retrieve(&self, query: &Query, top_k: usize) -> AppResult<Vec<EvidenceItem>> {
        if self.index.is_empty() {
            return Err(AppError::Retrieval(format!(
                "document index '{}' is empty",
                self.index.name()
            )));
        }

        let scored = self.index.search(&query.text, top_k).await?;
        let total = scored.len();

        let mut items: Vec<EvidenceItem> = scored
            .into_iter()
            .filter(|s| s.score >= self.min_score)
            .map(|s| {
                EvidenceItem::new(
                    s.chunk.text.trim(),
                    s.chunk.source_id(),
                    s.score,
                    SourceKind::Document,
                )
            })
            .filter(|item| !item.text.is_empty())
            .collect();

        super::rank(&mut items, top_k);

        tracing::debug!(
            "Document agent kept {} of {} chunks from '{}' (min score {:.2})",
            items.len(),
            total,
            self.index.name(),
            self.min_score
        );
        Ok(items)
    }
}
