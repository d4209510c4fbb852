//! Web search capability for Veritas.
//!
//! Mirrors the shape of `veritas-llm`: one trait ([`WebSearchClient`]), a set
//! of provider implementations, and a factory that turns configuration into a
//! ready client.
//!
//! # Providers
//! - **SerpAPI**: Google results via serpapi.com
//! - **Tavily**: Tavily search API with relevance scores
//! - **Static**: Fixed hits from a JSON fixture (offline runs, tests)

pub mod chain;
pub mod client;
pub mod factory;
pub mod providers;

pub use chain::FallbackSearch;
pub use client::{SearchHit, SearchRequest, WebSearchClient};
pub use factory::create_search_client;
pub use providers::{SerpApiClient, StaticSearchClient, TavilyClient};
