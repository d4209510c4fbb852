//! On-disk layout of a knowledge base.
//!
//! Every base lives in `.veritas/knowledge/<base>/` inside the workspace.

use std::path::{Path, PathBuf};

/// Get the base directory for a knowledge base.
pub fn get_base_dir(workspace: &Path, base_name: &str) -> PathBuf {
    workspace
        .join(".veritas")
        .join("knowledge")
        .join(base_name)
}

/// Get the chunk store path for a base.
pub fn get_chunks_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("chunks.jsonl")
}

/// Get the import bookkeeping path for a base.
pub fn get_stats_path(workspace: &Path, base_name: &str) -> PathBuf {
    get_base_dir(workspace, base_name).join("stats.json")
}
