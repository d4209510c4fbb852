//! Veritas Core Library
//!
//! Foundational utilities shared by every Veritas crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (`AppConfig` and its sections)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{
    AppConfig, ConfigOverrides, FusionSettings, LlmSettings, RetrievalSettings, SearchSettings,
    SourceKind,
};
pub use error::{AppError, AppResult};
