//! Knowledge command handler.
//!
//! Manages the document knowledge bases the document agent searches.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use veritas_core::{config::AppConfig, AppResult};
use veritas_knowledge::ImportOptions;

/// Document knowledge base management
#[derive(Args, Debug)]
pub struct KnowledgeCommand {
    #[command(subcommand)]
    pub action: KnowledgeAction,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeAction {
    /// Import text, markdown or JSONL chunk files
    Import(KnowledgeImportCommand),
    /// Show knowledge base statistics
    Stats(KnowledgeStatsCommand),
    /// Delete a knowledge base
    Clean(KnowledgeCleanCommand),
}

/// Import documents into a base
#[derive(Args, Debug)]
pub struct KnowledgeImportCommand {
    /// Files or directories to import
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Knowledge base name (default: retrieval.knowledge_base)
    #[arg(short, long)]
    pub base: Option<String>,

    /// Maximum characters per chunk for text files
    #[arg(long)]
    pub max_chunk_chars: Option<usize>,

    /// Reset base before importing
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeImportCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let base = base_name(&self.base, config);
        tracing::info!("Executing knowledge import command for base '{}'", base);

        let mut options = ImportOptions::new(base.clone(), self.paths.clone());
        options.reset = self.reset;
        if let Some(max) = self.max_chunk_chars {
            options.max_chunk_chars = max;
        }

        let stats = veritas_knowledge::import(&config.workspace, options).await?;

        if self.json {
            return super::print_json(&stats);
        }
        println!(
            "Imported {} chunks from {} files into '{}' ({} skipped) in {:.2}s",
            stats.chunks_imported, stats.files_read, base, stats.skipped, stats.duration_secs
        );
        Ok(())
    }
}

/// Show knowledge base stats
#[derive(Args, Debug)]
pub struct KnowledgeStatsCommand {
    /// Knowledge base name (default: retrieval.knowledge_base)
    #[arg(short, long)]
    pub base: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeStatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let base = base_name(&self.base, config);
        tracing::info!("Executing knowledge stats command for base '{}'", base);

        let stats = veritas_knowledge::stats(&config.workspace, &base)?;

        if self.json {
            return super::print_json(&stats);
        }
        println!("Knowledge base: {}", stats.base_name);
        println!("  Documents: {}", stats.documents_count);
        println!("  Chunks: {}", stats.chunks_count);
        println!("  Store size: {} bytes", stats.store_size_bytes);
        if let Some(last_import) = stats.last_import_at {
            println!("  Last import: {}", last_import);
        }
        Ok(())
    }
}

/// Clean knowledge base
#[derive(Args, Debug)]
pub struct KnowledgeCleanCommand {
    /// Knowledge base name (default: retrieval.knowledge_base)
    #[arg(short, long)]
    pub base: Option<String>,
}

impl KnowledgeCleanCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let base = base_name(&self.base, config);
        tracing::info!("Executing knowledge clean command for base '{}'", base);

        if veritas_knowledge::clean(&config.workspace, &base)? {
            println!("Knowledge base '{}' cleaned", base);
        } else {
            println!("Knowledge base '{}' does not exist", base);
        }
        Ok(())
    }
}

fn base_name(base: &Option<String>, config: &AppConfig) -> String {
    base.clone()
        .unwrap_or_else(|| config.retrieval.knowledge_base.clone())
}

impl KnowledgeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            KnowledgeAction::Import(cmd) => cmd.execute(config).await,
            KnowledgeAction::Stats(cmd) => cmd.execute(config),
            KnowledgeAction::Clean(cmd) => cmd.execute(config),
        }
    }
}
