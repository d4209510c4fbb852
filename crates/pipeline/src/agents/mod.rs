//! Retrieval agents.
//!
//! The set of sources is fixed: [`Agent`] is a tagged variant over the
//! document and web agents, and [`AgentSet`] holds whichever of them are
//! configured. The orchestrator asks the set for the agents a routing
//! decision names and runs each through the same `retrieve` call.

pub mod document;
pub mod web;

pub use document::DocumentAgent;
pub use web::WebAgent;

use crate::types::{EvidenceItem, Query, RoutingDecision};
use std::cmp::Ordering;
use std::sync::Arc;
use veritas_core::{AppResult, SourceKind};

/// One retrieval agent, dispatched by source kind.
#[derive(Clone)]
pub enum Agent {
    Document(Arc<DocumentAgent>),
    Web(Arc<WebAgent>),
}

impl Agent {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Document(_) => SourceKind::Document,
            Self::Web(_) => SourceKind::Web,
        }
    }

    /// Retrieve at most `top_k` items for `query`, best first.
    pub async fn retrieve(&self, query: &Query, top_k: usize) -> AppResult<Vec<EvidenceItem>> {
        match self {
            Self::Document(agent) => agent.retrieve(query, top_k).await,
            Self::Web(agent) => agent.retrieve(query, top_k).await,
        }
    }
}

/// The configured agents. Either may be absent.
#[derive(Clone, Default)]
pub struct AgentSet {
    document: Option<Arc<DocumentAgent>>,
    web: Option<Arc<WebAgent>>,
}

impl AgentSet {
    pub fn new(document: Option<DocumentAgent>, web: Option<WebAgent>) -> Self {
        Self {
            document: document.map(Arc::new),
            web: web.map(Arc::new),
        }
    }

    /// Source kinds that can currently produce evidence.
    ///
    /// A document agent over an empty index does not count as available.
    pub fn available(&self) -> Vec<SourceKind> {
        let mut kinds = Vec::new();
        if self.document.as_ref().is_some_and(|d| d.has_documents()) {
            kinds.push(SourceKind::Document);
        }
        if self.web.is_some() {
            kinds.push(SourceKind::Web);
        }
        kinds
    }

    /// Agents for the sources named by `decision`.
    ///
    /// A named source with no configured agent is returned as missing so the
    /// caller can record it as a failed contribution.
    pub fn select(&self, decision: &RoutingDecision) -> (Vec<Agent>, Vec<SourceKind>) {
        let mut agents = Vec::new();
        let mut missing = Vec::new();

        for kind in decision.sources() {
            let agent = match kind {
                SourceKind::Document => self.document.clone().map(Agent::Document),
                SourceKind::Web => self.web.clone().map(Agent::Web),
            };
            match agent {
                Some(agent) => agents.push(agent),
                None => missing.push(*kind),
            }
        }

        (agents, missing)
    }
}

/// Sort by score descending, then source id, and keep the first `top_k`.
pub(crate) fn rank(items: &mut Vec<EvidenceItem>, top_k: usize) {
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });
    items.truncate(top_k);
}
