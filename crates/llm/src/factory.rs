//! LLM provider factory.
//!
//! Resolves the configured provider name to a concrete [`LlmClient`],
//! injecting endpoint and API key.

use crate::client::LlmClient;
use crate::providers::gemini::GEMINI_URL;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::openai_compat::{OPENAI_URL, OPENROUTER_URL};
use crate::providers::{GeminiClient, MockClient, OllamaClient, OpenAiCompatClient};
use std::sync::Arc;
use veritas_core::{AppError, AppResult, LlmSettings};

/// Create an LLM client from the generation settings.
///
/// # Arguments
/// * `settings` - Provider, model and endpoint configuration
/// * `api_key` - API key for providers that require one
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required key
/// is missing.
pub fn create_client(
    settings: &LlmSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let endpoint = settings.endpoint.as_deref();

    match settings.provider.to_lowercase().as_str() {
        "ollama" => {
            let client = OllamaClient::with_base_url(endpoint.unwrap_or(DEFAULT_OLLAMA_URL));
            Ok(Arc::new(client))
        }
        "openrouter" => {
            let key = require_key("OpenRouter", api_key)?;
            let client =
                OpenAiCompatClient::new("openrouter", endpoint.unwrap_or(OPENROUTER_URL), key);
            Ok(Arc::new(client))
        }
        "openai" => {
            let key = require_key("OpenAI", api_key)?;
            let client = OpenAiCompatClient::new("openai", endpoint.unwrap_or(OPENAI_URL), key);
            Ok(Arc::new(client))
        }
        "gemini" => {
            let key = require_key("Gemini", api_key)?;
            Ok(Arc::new(GeminiClient::new(endpoint.unwrap_or(GEMINI_URL), key)))
        }
        "mock" => Ok(Arc::new(MockClient::new())),
        _ => Err(AppError::Config(format!(
            "Unknown provider: {}",
            settings.provider
        ))),
    }
}

fn require_key<'a>(provider: &str, api_key: Option<&'a str>) -> AppResult<&'a str> {
    api_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::Config(format!("{} provider requires API key", provider)))
}
