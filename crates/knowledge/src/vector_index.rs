//! Vector index abstraction for document chunks.

use crate::types::{DocumentChunk, ScoredChunk};
use veritas_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Upserting chunks that carry an embedding
/// - Searching for the top-k most similar chunks
/// - Resetting the index
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a chunk keyed by its source id.
    fn upsert_chunk(&mut self, chunk: DocumentChunk) -> AppResult<()>;

    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending similarity. Equal scores are
    /// ordered by source id so results do not depend on insertion order.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>>;

    /// Number of chunks held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all chunks.
    fn reset(&mut self);
}
