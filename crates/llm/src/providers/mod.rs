//! Generation backend implementations.

pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai_compat;

pub use gemini::GeminiClient;
pub use mock::{MockBehavior, MockClient};
pub use ollama::OllamaClient;
pub use openai_compat::OpenAiCompatClient;
