//! Document knowledge bases.
//!
//! A knowledge base is a set of pre-split document chunks stored as JSONL
//! under `.veritas/knowledge/<base>/`, embedded with an offline trigram
//! provider and searched by cosine similarity in memory.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod memory_index;
pub mod store;
pub mod types;
pub mod vector_index;

pub use embeddings::{EmbeddingProvider, TrigramProvider};
pub use index::{DocumentIndex, KnowledgeBase};
pub use store::ChunkStore;
pub use types::{BaseStats, DocumentChunk, ImportStats, ScoredChunk};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use veritas_core::{AppError, AppResult};
use walkdir::WalkDir;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// Options for the import operation.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Knowledge base name
    pub base_name: String,

    /// Files or directories to import
    pub paths: Vec<PathBuf>,

    /// Maximum characters per chunk for plain-text files
    pub max_chunk_chars: usize,

    /// Clean the base before importing
    pub reset: bool,
}

impl ImportOptions {
    pub fn new(base_name: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            base_name: base_name.into(),
            paths,
            max_chunk_chars: chunker::DEFAULT_CHUNK_CHARS,
            reset: false,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportLog {
    last_import_at: Option<DateTime<Utc>>,
}

/// Import chunks into a knowledge base.
///
/// `.jsonl` files hold one [`DocumentChunk`] per line. `.txt`/`.md` files are
/// split with [`chunker::chunk_text`], the document id being the file path
/// relative to the imported directory. Other files are skipped. Chunks whose
/// source id already exists in the base, or whose text is blank, are skipped.
pub async fn import(workspace: &Path, options: ImportOptions) -> AppResult<ImportStats> {
    let start = Instant::now();
    tracing::info!("Importing into knowledge base '{}'", options.base_name);

    if options.reset {
        clean(workspace, &options.base_name)?;
    }

    let store = ChunkStore::new(workspace, &options.base_name);
    let mut seen: HashSet<String> = store.load()?.iter().map(|c| c.source_id()).collect();

    let mut stats = ImportStats::default();
    let mut fresh = Vec::new();

    for root in &options.paths {
        if !root.exists() {
            return Err(AppError::Knowledge(format!(
                "Import path does not exist: {:?}",
                root
            )));
        }

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let chunks = match read_chunks(root, path, options.max_chunk_chars)? {
                Some(chunks) => chunks,
                None => {
                    tracing::debug!("Skipping unsupported file {:?}", path);
                    continue;
                }
            };
            stats.files_read += 1;

            for chunk in chunks {
                if chunk.text.trim().is_empty() || !seen.insert(chunk.source_id()) {
                    stats.skipped += 1;
                    continue;
                }
                fresh.push(chunk);
            }
        }
    }

    let provider = TrigramProvider::default();
    let fresh = index::embed_missing(&provider, fresh).await?;
    store.append(&fresh)?;
    stats.chunks_imported = fresh.len() as u32;

    write_import_log(workspace, &options.base_name)?;

    stats.duration_secs = start.elapsed().as_secs_f64();
    tracing::info!(
        "Import completed: {} files, {} chunks, {} skipped in {:.2}s",
        stats.files_read,
        stats.chunks_imported,
        stats.skipped,
        stats.duration_secs
    );
    Ok(stats)
}

fn read_chunks(
    root: &Path,
    path: &Path,
    max_chunk_chars: usize,
) -> AppResult<Option<Vec<DocumentChunk>>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if extension == "jsonl" {
        let records = ChunkStore::from_path(path.to_path_buf()).load()?;
        return Ok(Some(records));
    }

    if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(None);
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    let relative = path.strip_prefix(root).unwrap_or(path);
    let document_id = match relative.to_string_lossy().as_ref() {
        "" => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned()),
        rel => rel.replace('\\', "/"),
    };
    let source = path.to_string_lossy().into_owned();

    Ok(Some(
        chunker::chunk_text(&document_id, &text, max_chunk_chars)
            .into_iter()
            .map(|chunk| chunk.with_source(source.clone()))
            .collect(),
    ))
}

fn write_import_log(workspace: &Path, base_name: &str) -> AppResult<()> {
    let path = config::get_stats_path(workspace, base_name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log = ImportLog {
        last_import_at: Some(Utc::now()),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&log)?)?;
    Ok(())
}

/// Get statistics for a knowledge base.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    let store = ChunkStore::new(workspace, base_name);
    let chunks = store.load()?;

    let documents: HashSet<&str> = chunks.iter().map(|c| c.document_id.as_str()).collect();
    let stats_path = config::get_stats_path(workspace, base_name);
    let last_import_at = if stats_path.exists() {
        let contents = std::fs::read_to_string(&stats_path)?;
        serde_json::from_str::<ImportLog>(&contents)?.last_import_at
    } else {
        None
    };

    Ok(BaseStats {
        base_name: base_name.to_string(),
        documents_count: documents.len() as u32,
        chunks_count: chunks.len() as u32,
        store_size_bytes: store.size_bytes(),
        last_import_at,
    })
}

/// Remove a knowledge base from the workspace. Returns whether it existed.
pub fn clean(workspace: &Path, base_name: &str) -> AppResult<bool> {
    let base_dir = config::get_base_dir(workspace, base_name);
    if !base_dir.exists() {
        return Ok(false);
    }

    std::fs::remove_dir_all(&base_dir).map_err(|e| {
        AppError::Knowledge(format!("Failed to remove {:?}: {}", base_dir, e))
    })?;
    tracing::info!("Cleaned knowledge base '{}'", base_name);
    Ok(true)
}

#[cfg(test)]
mod tests;
