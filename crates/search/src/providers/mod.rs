//! Web search backend implementations.

pub mod duckduckgo;
pub mod fixed;
pub mod serpapi;
pub mod tavily;

pub use duckduckgo::DuckDuckGoClient;
pub use fixed::StaticSearchClient;
pub use serpapi::SerpApiClient;
pub use tavily::TavilyClient;
