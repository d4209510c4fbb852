//! Values passed between pipeline stages.
//!
//! Every stage consumes the previous stage's output by value or shared
//! reference and produces a new value; nothing here is mutated after
//! construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use veritas_core::{AppError, AppResult, SourceKind};

/// Fixed answer text when no evidence is available.
pub const INSUFFICIENT_EVIDENCE_TEXT: &str =
    "I cannot answer this question from the available evidence.";

/// Fixed answer text when evidence existed but generation did not succeed.
pub const GENERATION_FAILED_TEXT: &str =
    "An answer could not be generated from the retrieved evidence. Please try again.";

/// A user question entering the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl Query {
    /// Create a query, rejecting blank text.
    pub fn new(text: impl Into<String>) -> AppResult<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidQuery(
                "query text must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            text: trimmed.to_string(),
            session: None,
            received_at: Utc::now(),
        })
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }
}

/// Which sources to consult for a query. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    sources: Vec<SourceKind>,
    pub reason: String,
    /// True when the router fell back to every available source
    pub broad_recall: bool,
}

impl RoutingDecision {
    /// Build a decision. An empty source list widens to every source kind.
    pub fn new(sources: impl IntoIterator<Item = SourceKind>, reason: impl Into<String>) -> Self {
        let mut sources: Vec<SourceKind> = sources.into_iter().collect();
        sources.sort();
        sources.dedup();

        let broad_recall = sources.is_empty();
        if broad_recall {
            sources = SourceKind::ALL.to_vec();
        }

        Self {
            sources,
            reason: reason.into(),
            broad_recall,
        }
    }

    /// Decision naming all `sources`, flagged as broad recall.
    pub fn broad(
        sources: impl IntoIterator<Item = SourceKind>,
        reason: impl Into<String>,
    ) -> Self {
        let mut decision = Self::new(sources, reason);
        decision.broad_recall = true;
        decision
    }

    pub fn sources(&self) -> &[SourceKind] {
        &self.sources
    }

    pub fn includes(&self, kind: SourceKind) -> bool {
        self.sources.contains(&kind)
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.as_str()).collect();
        write!(f, "{{{}}} ({})", names.join(", "), self.reason)
    }
}

/// A scored, attributed span of retrieved text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub text: String,
    /// Document id plus chunk id, or a URL
    pub source_id: String,
    /// Relevance in [0, 1]
    pub score: f32,
    pub source_type: SourceKind,
}

impl EvidenceItem {
    /// Create an item, clamping the score into [0, 1]. NaN becomes 0.
    pub fn new(
        text: impl Into<String>,
        source_id: impl Into<String>,
        score: f32,
        source_type: SourceKind,
    ) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        };

        Self {
            text: text.into(),
            source_id: source_id.into(),
            score,
            source_type,
        }
    }
}

/// The deduplicated, ranked, budget-bounded evidence handed to generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSet {
    items: Vec<EvidenceItem>,
}

impl EvidenceSet {
    /// Wrap items that are already fused. Use [`crate::fusion::fuse`] otherwise.
    pub(crate) fn from_ranked(items: Vec<EvidenceItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EvidenceItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<EvidenceItem> {
        self.items
    }
}

impl<'a> IntoIterator for &'a EvidenceSet {
    type Item = &'a EvidenceItem;
    type IntoIter = std::slice::Iter<'a, EvidenceItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A distinct cited source, numbered as it appears in the answer text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub marker: u32,
    pub source_id: String,
    pub source_type: SourceKind,
    pub snippet: String,
}

/// Byte range of a sentence in the answer text and the markers it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedSpan {
    pub start: usize,
    pub end: usize,
    pub markers: Vec<u32>,
}

/// How an answer came about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnswerStatus {
    /// Every sentence cites evidence from the input set
    Grounded,
    /// No evidence was available; generation was not attempted
    InsufficientEvidence,
    /// Evidence existed but the backend failed, timed out or cited nothing valid
    GenerationFailed { reason: String },
}

/// Final answer with its citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub query_id: String,
    pub text: String,
    pub citations: Vec<Citation>,
    pub spans: Vec<CitedSpan>,
    pub status: AnswerStatus,
    pub generated_at: DateTime<Utc>,
}

impl AnswerResult {
    pub fn insufficient_evidence(query_id: impl Into<String>) -> Self {
        Self::degraded(
            query_id,
            INSUFFICIENT_EVIDENCE_TEXT,
            AnswerStatus::InsufficientEvidence,
        )
    }

    pub fn generation_failed(query_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::degraded(
            query_id,
            GENERATION_FAILED_TEXT,
            AnswerStatus::GenerationFailed {
                reason: reason.into(),
            },
        )
    }

    fn degraded(query_id: impl Into<String>, text: &str, status: AnswerStatus) -> Self {
        Self {
            query_id: query_id.into(),
            text: text.to_string(),
            citations: Vec::new(),
            spans: Vec::new(),
            status,
            generated_at: Utc::now(),
        }
    }

    /// Whether the answer signals reduced confidence.
    pub fn is_degraded(&self) -> bool {
        !matches!(self.status, AnswerStatus::Grounded)
    }
}
