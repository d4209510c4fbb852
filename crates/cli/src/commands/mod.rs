//! Command handlers for the Veritas CLI.

pub mod ask;
pub mod knowledge;
pub mod prompts;
pub mod route;

pub use ask::AskCommand;
pub use knowledge::KnowledgeCommand;
pub use prompts::PromptsCommand;
pub use route::RouteCommand;

use veritas_core::{AppError, AppResult};

/// Pretty-print `value` as JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(format!("JSON output failed: {}", e)))?;
    println!("{}", output);
    Ok(())
}
