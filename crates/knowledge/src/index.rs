//! Searchable document index.

use crate::embeddings::{EmbeddingProvider, TrigramProvider};
use crate::memory_index::MemoryIndex;
use crate::store::ChunkStore;
use crate::types::{DocumentChunk, ScoredChunk};
use crate::vector_index::VectorIndex;
use std::path::Path;
use std::sync::Arc;
use veritas_core::AppResult;

/// Read side of a document collection, as consumed by retrieval.
#[async_trait::async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Name of the collection, used in logs.
    fn name(&self) -> &str;

    /// Whether there is anything to search.
    fn is_empty(&self) -> bool;

    /// The `top_k` chunks most similar to `query`, best first.
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<ScoredChunk>>;
}

/// A knowledge base loaded into memory.
#[derive(Debug)]
pub struct KnowledgeBase {
    name: String,
    provider: Arc<dyn EmbeddingProvider>,
    index: MemoryIndex,
}

impl KnowledgeBase {
    /// Load `.veritas/knowledge/<base>/chunks.jsonl` into an index.
    ///
    /// A missing store yields an empty base rather than an error.
    pub async fn open(workspace: &Path, base_name: &str) -> AppResult<Self> {
        let chunks = ChunkStore::new(workspace, base_name).load()?;
        let base = Self::from_chunks(base_name, chunks).await?;
        tracing::info!(
            "Opened knowledge base '{}' ({} chunks)",
            base.name,
            base.index.len()
        );
        Ok(base)
    }

    /// Build a base from chunks, embedding those that arrive without one.
    pub async fn from_chunks(
        name: impl Into<String>,
        chunks: Vec<DocumentChunk>,
    ) -> AppResult<Self> {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::default());
        let chunks = embed_missing(provider.as_ref(), chunks).await?;

        let mut index = MemoryIndex::new();
        for chunk in chunks {
            index.upsert_chunk(chunk)?;
        }

        Ok(Self {
            name: name.into(),
            provider,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn documents_count(&self) -> usize {
        self.index.documents_count()
    }
}

#[async_trait::async_trait]
impl DocumentIndex for KnowledgeBase {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        if self.index.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.provider.embed(query).await?;
        self.index.search(&embedding, top_k)
    }
}

/// Fill in embeddings for chunks that have none, or whose width does not
/// match the provider.
pub(crate) async fn embed_missing(
    provider: &dyn EmbeddingProvider,
    mut chunks: Vec<DocumentChunk>,
) -> AppResult<Vec<DocumentChunk>> {
    let pending: Vec<usize> = chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.embedding
                .as_ref()
                .map_or(true, |e| e.len() != provider.dimensions())
        })
        .map(|(i, _)| i)
        .collect();

    if pending.is_empty() {
        return Ok(chunks);
    }

    let texts: Vec<String> = pending.iter().map(|&i| chunks[i].text.clone()).collect();
    let embeddings = provider.embed_batch(&texts).await?;
    for (i, embedding) in pending.into_iter().zip(embeddings) {
        chunks[i].embedding = Some(embedding);
    }

    Ok(chunks)
}
