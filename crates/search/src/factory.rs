//! Web search provider factory.

use crate::chain::FallbackSearch;
use crate::client::WebSearchClient;
use crate::providers::{DuckDuckGoClient, SerpApiClient, StaticSearchClient, TavilyClient};
use std::sync::Arc;
use std::time::Duration;
use veritas_core::{AppError, AppResult, SearchSettings};

/// Build the web search client described by `settings`.
///
/// Providers are chained in the configured order. Providers whose API key is
/// not set in the environment are skipped, as is "static" without a fixture.
/// "duckduckgo" needs no key and is always usable.
/// Returns `Ok(None)` when no provider is usable, which means the web source
/// is unavailable for routing.
pub fn create_search_client(
    settings: &SearchSettings,
) -> AppResult<Option<Arc<dyn WebSearchClient>>> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let mut providers: Vec<Arc<dyn WebSearchClient>> = Vec::new();

    for name in &settings.providers {
        match name.to_lowercase().as_str() {
            "serpapi" => match std::env::var(&settings.serpapi_key_env) {
                Ok(key) if !key.is_empty() => {
                    providers.push(Arc::new(SerpApiClient::new(key, timeout)));
                }
                _ => tracing::debug!(
                    "Skipping serpapi: {} is not set",
                    settings.serpapi_key_env
                ),
            },
            "tavily" => match std::env::var(&settings.tavily_key_env) {
                Ok(key) if !key.is_empty() => {
                    providers.push(Arc::new(TavilyClient::new(key, timeout)));
                }
                _ => tracing::debug!("Skipping tavily: {} is not set", settings.tavily_key_env),
            },
            "duckduckgo" => providers.push(Arc::new(DuckDuckGoClient::new(timeout))),
            "static" => match settings.fixture {
                Some(ref path) => {
                    providers.push(Arc::new(StaticSearchClient::from_fixture(path)?));
                }
                None => tracing::debug!("Skipping static search: no fixture configured"),
            },
            other => {
                return Err(AppError::Config(format!(
                    "Unknown search provider: {}",
                    other
                )))
            }
        }
    }

    match providers.len() {
        0 => {
            tracing::info!("No web search provider available");
            Ok(None)
        }
        1 => Ok(providers.pop()),
        _ => Ok(Some(Arc::new(FallbackSearch::new(providers)))),
    }
}
