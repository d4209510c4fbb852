//! End-to-end pipeline tests with scripted backends.

mod concurrency;
mod scenarios;

use crate::agents::{AgentSet, DocumentAgent, WebAgent};
use crate::fusion::FusionEngine;
use crate::generator::AnswerGenerator;
use crate::orchestrator::{Orchestrator, PipelineRun};
use crate::router::Router;
use crate::types::AnswerStatus;
use std::sync::Arc;
use std::time::Duration;
use veritas_core::{AppError, AppResult, FusionSettings, LlmSettings, RetrievalSettings};
use veritas_knowledge::{DocumentChunk, DocumentIndex, ScoredChunk};
use veritas_llm::MockClient;
use veritas_prompt::{load_prompt, GROUNDED_ANSWER_PROMPT};
use veritas_search::{SearchHit, StaticSearchClient};

/// Document index returning fixed chunks with fixed scores.
#[derive(Default)]
pub(crate) struct FixedIndex {
    chunks: Vec<ScoredChunk>,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl FixedIndex {
    pub(crate) fn new(chunks: &[(&str, &str, f32)]) -> Self {
        let chunks = chunks
            .iter()
            .map(|&(source_id, text, score)| {
                let (document, chunk) = source_id.split_once('#').unwrap_or((source_id, "0"));
                ScoredChunk {
                    chunk: DocumentChunk::new(document, chunk, text),
                    score,
                }
            })
            .collect();
        Self {
            chunks,
            ..Default::default()
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            chunks: vec![ScoredChunk {
                chunk: DocumentChunk::new("unused", "0", "unused"),
                score: 1.0,
            }],
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl DocumentIndex for FixedIndex {
    fn name(&self) -> &str {
        "fixed"
    }

    fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    async fn search(&self, _query: &str, top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(ref message) = self.failure {
            return Err(AppError::Knowledge(message.clone()));
        }
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

pub(crate) fn hit(url: &str, snippet: &str, score: f32) -> SearchHit {
    SearchHit {
        title: url.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
        score: Some(score),
        rank: 0,
    }
}

pub(crate) fn retrieval_settings() -> RetrievalSettings {
    RetrievalSettings {
        top_k: 5,
        agent_timeout_ms: 200,
        min_document_score: 0.0,
        ..Default::default()
    }
}

/// Builds an orchestrator from test doubles.
pub(crate) struct Harness {
    pub document: Option<Arc<dyn DocumentIndex>>,
    pub web: Option<Arc<StaticSearchClient>>,
    pub llm: Arc<MockClient>,
    pub llm_settings: LlmSettings,
    pub retrieval: RetrievalSettings,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            document: None,
            web: None,
            llm: Arc::new(MockClient::new()),
            llm_settings: LlmSettings::default(),
            retrieval: retrieval_settings(),
        }
    }

    pub(crate) fn documents(mut self, index: FixedIndex) -> Self {
        self.document = Some(Arc::new(index));
        self
    }

    pub(crate) fn web(mut self, client: StaticSearchClient) -> Self {
        self.web = Some(Arc::new(client));
        self
    }

    pub(crate) fn llm(mut self, client: MockClient) -> Self {
        self.llm = Arc::new(client);
        self
    }

    pub(crate) fn build(&self) -> Orchestrator {
        let temp = tempfile::TempDir::new().unwrap();
        let prompt = load_prompt(temp.path(), GROUNDED_ANSWER_PROMPT).unwrap();

        let document = self
            .document
            .clone()
            .map(|index| DocumentAgent::new(index, &self.retrieval));
        let web = self.web.clone().map(|client| WebAgent::new(client));

        Orchestrator::new(
            Router::default(),
            AgentSet::new(document, web),
            FusionEngine::new(&FusionSettings::default()),
            AnswerGenerator::new(self.llm.clone(), prompt, &self.llm_settings),
            &self.retrieval,
        )
    }
}

/// Every citation points into the evidence set and every span is cited.
pub(crate) fn assert_grounded(run: &PipelineRun) {
    let answer = &run.answer;
    if answer.status != AnswerStatus::Grounded {
        assert!(answer.citations.is_empty());
        return;
    }

    assert!(!answer.spans.is_empty());
    for citation in &answer.citations {
        assert!(
            run.evidence.iter().any(|e| e.source_id == citation.source_id
                && e.source_type == citation.source_type),
            "citation {} is not in the evidence set",
            citation.source_id
        );
    }
    for span in &answer.spans {
        assert!(!span.markers.is_empty());
        assert!(span.markers.iter().all(|m| answer
            .citations
            .iter()
            .any(|c| c.marker == *m)));
        assert!(span.end <= answer.text.len());
    }
}
