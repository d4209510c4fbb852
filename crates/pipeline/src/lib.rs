//! Hybrid question answering pipeline for Veritas.
//!
//! A query is routed to the document and web sources, the selected
//! retrieval agents run concurrently, their evidence is fused into one
//! ranked set, and an answer is generated that cites that set and nothing
//! else.
//!
//! # Example
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use veritas_core::AppConfig;
//! use veritas_pipeline::{Orchestrator, Query};
//!
//! # async fn demo() -> veritas_core::AppResult<()> {
//! let config = AppConfig::load()?;
//! let orchestrator = Orchestrator::from_config(&config).await?;
//! let answer = orchestrator
//!     .answer_query(Query::new("What was Q3 revenue?")?, &CancellationToken::new())
//!     .await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod fusion;
pub mod generator;
pub mod orchestrator;
pub mod router;
pub mod types;

pub use agents::{Agent, AgentSet, DocumentAgent, WebAgent};
pub use fusion::{text_similarity, FusionEngine};
pub use generator::{ground, AnswerGenerator, GroundedText};
pub use orchestrator::{
    AgentContribution, ContributionStatus, Orchestrator, PipelineRun, PipelineState,
};
pub use router::{Intent, IntentClassifier, KeywordClassifier, Router};
pub use types::{
    AnswerResult, AnswerStatus, Citation, CitedSpan, EvidenceItem, EvidenceSet, Query,
    RoutingDecision, GENERATION_FAILED_TEXT, INSUFFICIENT_EVIDENCE_TEXT,
};

#[cfg(test)]
mod tests;
