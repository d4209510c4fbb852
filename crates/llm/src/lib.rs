//! Generation capability for Veritas.
//!
//! A provider-agnostic abstraction over text generation. The pipeline sees
//! only [`LlmClient::complete`]; provider wire protocols live in
//! [`providers`].
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenRouter / OpenAI**: OpenAI-compatible chat completions
//! - **Mock**: Offline extractive or scripted responses
//!
//! # Example
//! ```no_run
//! use veritas_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{MockBehavior, MockClient, OllamaClient, OpenAiCompatClient};
