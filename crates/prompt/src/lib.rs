//! Prompt system for Veritas.
//!
//! This crate provides:
//! - YAML-based prompt definitions, with workspace overrides
//! - A built-in grounded-answer prompt
//! - Handlebars template rendering over a query and numbered evidence

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt, GROUNDED_ANSWER_PROMPT};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptContext, PromptDefinition,
    PromptEvidence, PromptOutputSpec,
};
