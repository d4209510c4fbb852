//! DuckDuckGo HTML search provider.
//!
//! Needs no API key: queries the HTML endpoint and scrapes the result list.
//! Scores are not available, so ranks alone order the hits.

use crate::client::{SearchHit, SearchRequest, WebSearchClient};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use veritas_core::{AppError, AppResult};

const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = concat!("veritas/", env!("CARGO_PKG_VERSION"));

static RESULT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result").expect("result selector is valid"));
static RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("link selector is valid"));
static RESULT_SNIPPET: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result__snippet").expect("snippet selector is valid"));

/// Keyless DuckDuckGo client.
pub struct DuckDuckGoClient {
    base_url: String,
    client: reqwest::Client,
}

impl DuckDuckGoClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            base_url: DUCKDUCKGO_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Extract up to `max_results` hits from a result page.
    fn parse_results(page: &str, max_results: usize) -> Vec<SearchHit> {
        let document = Html::parse_document(page);

        document
            .select(&RESULT)
            .filter_map(|result| {
                let link = result.select(&RESULT_LINK).next()?;
                let url = resolve_link(link.value().attr("href")?)?;
                let title = element_text(link);
                let snippet = result
                    .select(&RESULT_SNIPPET)
                    .next()
                    .map(element_text)
                    .unwrap_or_default();
                Some((url, title, snippet))
            })
            .take(max_results)
            .enumerate()
            .map(|(rank, (url, title, snippet))| SearchHit {
                title: if title.is_empty() { url.clone() } else { title },
                url,
                snippet,
                score: None,
                rank: rank as u32,
            })
            .collect()
    }
}

/// Result links go through a `/l/?uddg=<target>` redirect; unwrap it.
fn resolve_link(href: &str) -> Option<String> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let url = base.join(href).ok()?;

    if url.path().starts_with("/l/") {
        return url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned());
    }

    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait::async_trait]
impl WebSearchClient for DuckDuckGoClient {
    fn provider_name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchHit>> {
        tracing::debug!(query = %request.query, "Querying DuckDuckGo");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", request.query.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Search(format!("DuckDuckGo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Search(format!(
                "DuckDuckGo returned status {}",
                response.status()
            )));
        }

        let page = response
            .text()
            .await
            .map_err(|e| AppError::Search(format!("Failed to read DuckDuckGo response: {}", e)))?;

        Ok(Self::parse_results(&page, request.max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html><body><div id="links">
        <div class="result results_links web-result">
          <h2 class="result__title">
            <a rel="nofollow" class="result__a"
               href="//duckduckgo.com/l/?uddg=https%3A%2F%2Facme.example%2Fir%3Fq%3D3&amp;rut=abc">Acme <b>Investor</b> Relations</a>
          </h2>
          <a class="result__snippet" href="#">Acme Corp. reported   Q3 revenue.</a>
        </div>
        <div class="result results_links web-result">
          <a rel="nofollow" class="result__a" href="https://news.example/acme"></a>
        </div>
        <div class="result result--ad">
          <span>Sponsored, no link</span>
        </div>
        <div class="result">
          <a class="result__a" href="javascript:void(0)">Broken</a>
        </div>
      </div></body></html>"##;

    #[test]
    fn test_parse_results() {
        let hits = DuckDuckGoClient::parse_results(PAGE, 10);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://acme.example/ir?q=3");
        assert_eq!(hits[0].title, "Acme Investor Relations");
        assert_eq!(hits[0].snippet, "Acme Corp. reported Q3 revenue.");
        assert_eq!(hits[0].score, None);
        assert_eq!(hits[1].url, "https://news.example/acme");
        assert_eq!(hits[1].title, "https://news.example/acme");
        assert_eq!(hits[1].snippet, "");
        assert_eq!(hits[1].rank, 1);
    }

    #[test]
    fn test_parse_results_respects_max_results() {
        assert_eq!(DuckDuckGoClient::parse_results(PAGE, 1).len(), 1);
        assert!(DuckDuckGoClient::parse_results("<html></html>", 5).is_empty());
    }
}
