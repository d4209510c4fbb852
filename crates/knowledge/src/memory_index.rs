//! In-memory cosine index.

use crate::embeddings::cosine_similarity;
use crate::types::{DocumentChunk, ScoredChunk};
use crate::vector_index::VectorIndex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use veritas_core::{AppError, AppResult};

/// Brute-force vector index keyed by chunk source id.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    chunks: BTreeMap<String, DocumentChunk>,
    dimensions: Option<usize>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct documents represented in the index.
    pub fn documents_count(&self) -> usize {
        self.chunks
            .values()
            .map(|c| c.document_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

impl VectorIndex for MemoryIndex {
    fn upsert_chunk(&mut self, chunk: DocumentChunk) -> AppResult<()> {
        let dims = match chunk.embedding {
            Some(ref embedding) => embedding.len(),
            None => {
                return Err(AppError::Knowledge(format!(
                    "Chunk {} has no embedding",
                    chunk.source_id()
                )))
            }
        };

        match self.dimensions {
            Some(expected) if expected != dims => {
                return Err(AppError::Knowledge(format!(
                    "Embedding dimension mismatch for {}: expected {}, got {}",
                    chunk.source_id(),
                    expected,
                    dims
                )))
            }
            _ => self.dimensions = Some(dims),
        }

        self.chunks.insert(chunk.source_id(), chunk);
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        if let Some(expected) = self.dimensions {
            if expected != query_embedding.len() {
                return Err(AppError::Knowledge(format!(
                    "Query embedding has {} dimensions, index has {}",
                    query_embedding.len(),
                    expected
                )));
            }
        }

        // BTreeMap iteration is ordered by source id, and the sort is stable
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .values()
            .filter_map(|chunk| {
                chunk.embedding.as_ref().map(|embedding| ScoredChunk {
                    score: cosine_similarity(query_embedding, embedding),
                    chunk: chunk.clone(),
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        tracing::trace!("Memory index returned {} of {} chunks", scored.len(), self.len());
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn reset(&mut self) {
        self.chunks.clear();
        self.dimensions = None;
    }
}
