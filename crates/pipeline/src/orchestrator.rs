//! Query orchestration.
//!
//! Drives one query through `Routing -> Retrieving -> Fusing -> Generating`
//! and ends in `Done` or `Failed`. Agents run concurrently, each under its
//! own timeout; a slow or failing agent is recorded as a degraded
//! contribution and never blocks the others. Cancellation aborts
//! outstanding work at any stage and is the only error a run returns once
//! the query has been accepted.

use crate::agents::{Agent, AgentSet, DocumentAgent, WebAgent};
use crate::fusion::FusionEngine;
use crate::generator::AnswerGenerator;
use crate::router::Router;
use crate::types::{AnswerResult, EvidenceItem, EvidenceSet, Query, RoutingDecision};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use veritas_core::{AppConfig, AppError, AppResult, RetrievalSettings, SourceKind};
use veritas_knowledge::KnowledgeBase;
use veritas_llm::create_client;
use veritas_prompt::load_prompt;
use veritas_search::create_search_client;

/// Stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Routing,
    Retrieving,
    Fusing,
    Generating,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Routing => "routing",
            Self::Retrieving => "retrieving",
            Self::Fusing => "fusing",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one agent for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContributionStatus {
    Ok { items: usize },
    TimedOut,
    Failed { error: String },
}

/// What a single source contributed to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContribution {
    pub source: SourceKind,
    pub status: ContributionStatus,
    pub elapsed_ms: u64,
}

impl AgentContribution {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, ContributionStatus::Ok { .. })
    }
}

/// Everything a run produced, for display and inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub query: Query,
    pub decision: RoutingDecision,
    pub contributions: Vec<AgentContribution>,
    pub evidence: EvidenceSet,
    pub state: PipelineState,
    pub answer: AnswerResult,
}

/// Runs queries through routing, retrieval, fusion and generation.
pub struct Orchestrator {
    router: Router,
    agents: AgentSet,
    fusion: FusionEngine,
    generator: AnswerGenerator,
    top_k: usize,
    agent_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        router: Router,
        agents: AgentSet,
        fusion: FusionEngine,
        generator: AnswerGenerator,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            router,
            agents,
            fusion,
            generator,
            top_k: settings.top_k,
            agent_timeout: Duration::from_millis(settings.agent_timeout_ms),
        }
    }

    /// Assemble the full pipeline from configuration.
    ///
    /// Opens the configured knowledge base, builds the generation and web
    /// search clients and loads the answer prompt. A missing web provider
    /// leaves the web source unavailable instead of failing.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let api_key = config.resolve_llm_api_key();
        let llm = create_client(&config.llm, api_key.as_deref())?;
        let prompt = load_prompt(&config.workspace, &config.llm.prompt_id)?;

        let base =
            KnowledgeBase::open(&config.workspace, &config.retrieval.knowledge_base).await?;
        let document = DocumentAgent::new(Arc::new(base), &config.retrieval);
        let web = create_search_client(&config.search)?.map(WebAgent::new);

        Ok(Self::new(
            Router::default(),
            AgentSet::new(Some(document), web),
            FusionEngine::new(&config.fusion),
            AnswerGenerator::new(llm, prompt, &config.llm),
            &config.retrieval,
        ))
    }

    /// Source kinds that can currently produce evidence.
    pub fn available_sources(&self) -> Vec<SourceKind> {
        self.agents.available()
    }

    /// Route `query` without running it.
    pub fn route(&self, query: &Query) -> RoutingDecision {
        self.router.route(query, &self.agents.available())
    }

    /// Answer `query`, returning only the final answer.
    pub async fn answer_query(
        &self,
        query: Query,
        cancel: &CancellationToken,
    ) -> AppResult<AnswerResult> {
        Ok(self.run(query, cancel).await?.answer)
    }

    /// Run `query` through every stage.
    ///
    /// # Errors
    /// Returns `AppError::Cancelled` if `cancel` fires before the run
    /// finishes. Agent and generation failures are absorbed into the
    /// returned run.
    pub async fn run(&self, query: Query, cancel: &CancellationToken) -> AppResult<PipelineRun> {
        let span = tracing::info_span!(
            "pipeline",
            query_id = %query.id,
            session = query.session.as_deref().unwrap_or("-"),
        );
        self.run_stages(query, cancel).instrument(span).await
    }

    async fn run_stages(&self, query: Query, cancel: &CancellationToken) -> AppResult<PipelineRun> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let mut state = PipelineState::Routing;
        tracing::debug!(%state, "Entering stage");
        let decision = self.route(&query);
        tracing::info!("Routed to {}", decision);

        advance(&mut state, PipelineState::Retrieving);
        let (agents, missing) = self.agents.select(&decision);
        let mut contributions: Vec<AgentContribution> = missing
            .into_iter()
            .map(|source| AgentContribution {
                source,
                status: ContributionStatus::Failed {
                    error: format!("no {} agent configured", source),
                },
                elapsed_ms: 0,
            })
            .collect();
        let (retrieved, evidence_lists) = self.retrieve_all(&query, agents, cancel).await?;
        contributions.extend(retrieved);
        contributions.sort_by_key(|c| c.source);

        for contribution in contributions.iter().filter(|c| !c.is_ok()) {
            tracing::warn!(
                source = %contribution.source,
                elapsed_ms = contribution.elapsed_ms,
                "Agent contributed nothing: {:?}",
                contribution.status
            );
        }

        advance(&mut state, PipelineState::Fusing);
        let evidence = self.fusion.fuse(evidence_lists);

        advance(&mut state, PipelineState::Generating);
        let answer = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Query cancelled during generation");
                return Err(AppError::Cancelled);
            }
            answer = self.generator.generate(&query, &evidence) => answer,
        };

        let all_failed = !contributions.is_empty() && contributions.iter().all(|c| !c.is_ok());
        if all_failed && answer.is_degraded() {
            advance(&mut state, PipelineState::Failed);
        } else {
            advance(&mut state, PipelineState::Done);
        }

        tracing::info!(
            evidence = evidence.len(),
            citations = answer.citations.len(),
            "Query finished: {:?}",
            answer.status
        );

        Ok(PipelineRun {
            query,
            decision,
            contributions,
            evidence,
            state,
            answer,
        })
    }

    /// Run `agents` concurrently, each bounded by the agent timeout.
    async fn retrieve_all(
        &self,
        query: &Query,
        agents: Vec<Agent>,
        cancel: &CancellationToken,
    ) -> AppResult<(Vec<AgentContribution>, Vec<Vec<EvidenceItem>>)> {
        let mut pending: Vec<SourceKind> = agents.iter().map(|a| a.kind()).collect();
        let mut tasks = JoinSet::new();

        for agent in agents {
            let query = query.clone();
            let top_k = self.top_k;
            let timeout = self.agent_timeout;
            tasks.spawn(
                async move {
                    let started = Instant::now();
                    let outcome = tokio::time::timeout(timeout, agent.retrieve(&query, top_k)).await;
                    (agent.kind(), outcome, started.elapsed())
                }
                .in_current_span(),
            );
        }

        let mut contributions = Vec::new();
        let mut evidence = Vec::new();

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    tracing::info!("Query cancelled during retrieval");
                    return Err(AppError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };

            let (source, outcome, elapsed) = match joined {
                None => break,
                Some(Ok(finished)) => finished,
                Some(Err(e)) => {
                    tracing::error!("Agent task failed: {}", e);
                    continue;
                }
            };
            pending.retain(|kind| *kind != source);

            let status = match outcome {
                Ok(Ok(items)) => {
                    let status = ContributionStatus::Ok { items: items.len() };
                    evidence.push(items);
                    status
                }
                Ok(Err(e)) => ContributionStatus::Failed {
                    error: e.to_string(),
                },
                Err(_) => ContributionStatus::TimedOut,
            };

            contributions.push(AgentContribution {
                source,
                status,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }

        // Tasks that panicked never reported back
        for source in pending {
            contributions.push(AgentContribution {
                source,
                status: ContributionStatus::Failed {
                    error: "agent task aborted".to_string(),
                },
                elapsed_ms: 0,
            });
        }

        Ok((contributions, evidence))
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    tracing::debug!(from = %state, to = %next, "Stage transition");
    *state = next;
}
