//! Offline mock provider.
//!
//! Used for local runs without a model server and as a scripted double in
//! tests. The default behavior is extractive: it reads the numbered evidence
//! lines out of the prompt and returns the first few of them, each with its
//! citation marker.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use veritas_core::{AppError, AppResult};

/// Number of evidence lines the extractive mode cites.
const EXTRACTIVE_CLAIMS: usize = 3;

/// What the mock does when asked for a completion.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Quote the first numbered evidence lines with their markers
    Extractive,
    /// Always return this text
    Reply(String),
    /// Always fail with this message
    Fail(String),
}

/// Scripted LLM client.
#[derive(Debug)]
pub struct MockClient {
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockClient {
    /// Create a mock with the extractive behavior.
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Extractive)
    }

    /// Create a mock with an explicit behavior.
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that always answers with `text`.
    pub fn reply(text: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Reply(text.into()))
    }

    /// Mock that always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Fail(message.into()))
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = match &self.behavior {
            MockBehavior::Extractive => extractive_answer(&request.prompt),
            MockBehavior::Reply(text) => text.clone(),
            MockBehavior::Fail(message) => return Err(AppError::Llm(message.clone())),
        };

        let prompt_tokens = request.prompt.split_whitespace().count() as u32;
        let completion_tokens = content.split_whitespace().count() as u32;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(prompt_tokens, completion_tokens),
        })
    }
}

/// Build an answer out of `[n] ...` evidence lines found in the prompt.
fn extractive_answer(prompt: &str) -> String {
    let claims: Vec<String> = prompt
        .lines()
        .filter_map(parse_evidence_line)
        .take(EXTRACTIVE_CLAIMS)
        .map(|(marker, claim)| format!("{} [{}].", claim, marker))
        .collect();

    if claims.is_empty() {
        "No evidence lines were provided.".to_string()
    } else {
        claims.join(" ")
    }
}

/// Parse `[n] (kind) text` into the marker and the first sentence of text.
fn parse_evidence_line(line: &str) -> Option<(u32, String)> {
    let rest = line.trim().strip_prefix('[')?;
    let (number, rest) = rest.split_once(']')?;
    let marker: u32 = number.trim().parse().ok()?;

    let mut text = rest.trim();
    if text.starts_with('(') {
        text = text.split_once(')').map(|(_, t)| t.trim()).unwrap_or(text);
    }

    let sentence = text
        .split_terminator(['.', '!', '?'])
        .next()
        .unwrap_or("")
        .trim();

    if sentence.is_empty() {
        None
    } else {
        Some((marker, sentence.to_string()))
    }
}
