//! Persistent chunk store.
//!
//! Chunks are kept one JSON object per line in `chunks.jsonl`. Appends are
//! synced before returning; a later record with the same source id wins when
//! the store is loaded into an index.

use crate::config;
use crate::types::DocumentChunk;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use veritas_core::{AppError, AppResult};

/// Reads and appends the JSONL chunk file of one knowledge base.
pub struct ChunkStore {
    path: PathBuf,
}

impl ChunkStore {
    pub fn new(workspace: &Path, base_name: &str) -> Self {
        Self {
            path: config::get_chunks_path(workspace, base_name),
        }
    }

    /// A store at an arbitrary path, such as a JSONL file being imported.
    pub fn from_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append chunks to the store.
    pub fn append(&self, chunks: &[DocumentChunk]) -> AppResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open chunk store: {}", e)))?;

        for chunk in chunks {
            let line = serde_json::to_string(chunk)
                .map_err(|e| AppError::Knowledge(format!("Failed to serialize chunk: {}", e)))?;
            writeln!(file, "{}", line)
                .map_err(|e| AppError::Knowledge(format!("Failed to write chunk store: {}", e)))?;
        }

        file.sync_all()
            .map_err(|e| AppError::Knowledge(format!("Failed to sync chunk store: {}", e)))?;

        tracing::debug!("Appended {} chunks to {:?}", chunks.len(), self.path);
        Ok(())
    }

    /// Load every stored chunk in file order.
    pub fn load(&self) -> AppResult<Vec<DocumentChunk>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open chunk store: {}", e)))?;

        let mut chunks = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                AppError::Knowledge(format!("Failed to read line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let chunk: DocumentChunk = serde_json::from_str(&line).map_err(|e| {
                AppError::Knowledge(format!(
                    "Failed to parse line {} of {:?}: {}",
                    line_num + 1,
                    self.path,
                    e
                ))
            })?;
            chunks.push(chunk);
        }

        tracing::debug!("Loaded {} chunks from {:?}", chunks.len(), self.path);
        Ok(chunks)
    }

    /// Size of the store file in bytes, zero when absent.
    pub fn size_bytes(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}
