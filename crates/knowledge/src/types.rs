//! Knowledge base type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A retrievable span of a document.
///
/// Chunks arrive pre-split: the knowledge base stores and searches them but
/// does not parse source files beyond plain text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    /// Identifier of the document the chunk belongs to
    pub document_id: String,

    /// Identifier of the chunk within its document
    pub chunk_id: String,

    /// Text content
    pub text: String,

    /// Where the document came from (file path, upload name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,

    /// Normalized embedding, filled in on import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl DocumentChunk {
    pub fn new(
        document_id: impl Into<String>,
        chunk_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            chunk_id: chunk_id.into(),
            text: text.into(),
            source: None,
            metadata: serde_json::Value::Null,
            embedding: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Stable identifier of the chunk across the base: `<document>#<chunk>`.
    pub fn source_id(&self) -> String {
        format!("{}#{}", self.document_id, self.chunk_id)
    }
}

/// A chunk returned by a search along with its cosine similarity.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Statistics from an import operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    /// Files read
    pub files_read: u32,

    /// Chunks appended to the store
    pub chunks_imported: u32,

    /// Records skipped (blank text, duplicate ids)
    pub skipped: u32,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    /// Base name
    pub base_name: String,

    /// Number of distinct documents
    pub documents_count: u32,

    /// Number of chunks
    pub chunks_count: u32,

    /// Chunk store size in bytes
    pub store_size_bytes: u64,

    /// Last import timestamp
    pub last_import_at: Option<DateTime<Utc>>,
}
