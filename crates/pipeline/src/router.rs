//! Query routing.
//!
//! Decides which evidence sources a query should consult. Routing never
//! fails: when intent cannot be determined the router falls back to every
//! available source.

use crate::types::{Query, RoutingDecision};
use regex::Regex;
use std::sync::LazyLock;
use veritas_core::{AppResult, SourceKind};

static DOCUMENT_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(uploaded|upload|documents?|files?|attached|attachments?|pdfs?|spreadsheet|(the|this|my|our) (report|memo|notes|contract|deck)|our|internal|company|confidential)\b",
    )
    .expect("document cue regex is valid")
});
static WEB_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(latest|recent|recently|current|currently|today|tonight|yesterday|this week|news|now|live|stock price|share price|trending|trends?|forecast|weather)\b",
    )
    .expect("web cue regex is valid")
});
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year regex is valid"));

/// Cues found in a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intent {
    /// Phrases pointing at the user's own documents
    pub document_cues: Vec<String>,
    /// Phrases asking for live or recent information
    pub web_cues: Vec<String>,
}

/// Extracts routing cues from query text.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, query: &str) -> AppResult<Intent>;
}

/// Keyword and pattern based classifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, query: &str) -> AppResult<Intent> {
        let lower = query.to_lowercase();
        let matches = |re: &Regex| -> Vec<String> {
            re.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
        };

        let mut web_cues = matches(&WEB_CUES);
        web_cues.extend(matches(&YEAR_RE));

        Ok(Intent {
            document_cues: matches(&DOCUMENT_CUES),
            web_cues,
        })
    }
}

/// Maps a query to the sources worth consulting.
pub struct Router {
    classifier: Box<dyn IntentClassifier>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Box::new(KeywordClassifier))
    }
}

impl Router {
    pub fn new(classifier: Box<dyn IntentClassifier>) -> Self {
        Self { classifier }
    }

    /// Route `query` among the `available` sources.
    ///
    /// The decision is never empty. Documents are only chosen when a document
    /// source is available; a preference for an unavailable source widens to
    /// whatever is available. With nothing available, every kind is named so
    /// that retrieval degrades to empty contributions downstream.
    pub fn route(&self, query: &Query, available: &[SourceKind]) -> RoutingDecision {
        if available.is_empty() {
            return RoutingDecision::broad(SourceKind::ALL, "no sources available");
        }

        let intent = match self.classifier.classify(&query.text) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!("Intent classification failed, using broad recall: {}", e);
                return RoutingDecision::broad(
                    available.iter().copied(),
                    "classifier unavailable",
                );
            }
        };

        let wants_docs = !intent.document_cues.is_empty();
        let wants_web = !intent.web_cues.is_empty();

        let (wanted, reason): (Vec<SourceKind>, String) = match (wants_docs, wants_web) {
            (true, false) => (
                vec![SourceKind::Document],
                format!("document scope ({})", intent.document_cues.join(", ")),
            ),
            (false, true) => (
                vec![SourceKind::Web],
                format!("needs live data ({})", intent.web_cues.join(", ")),
            ),
            (true, true) => (
                vec![SourceKind::Document, SourceKind::Web],
                format!(
                    "document scope ({}) and live data ({})",
                    intent.document_cues.join(", "),
                    intent.web_cues.join(", ")
                ),
            ),
            (false, false) => {
                return RoutingDecision::broad(
                    available.iter().copied(),
                    "ambiguous query, consulting all available sources",
                )
            }
        };

        let usable: Vec<SourceKind> = wanted
            .iter()
            .copied()
            .filter(|kind| available.contains(kind))
            .collect();

        let decision = if usable.is_empty() {
            RoutingDecision::broad(
                available.iter().copied(),
                format!("{}; preferred source unavailable", reason),
            )
        } else if usable.len() < wanted.len() {
            RoutingDecision::new(usable, format!("{}; partially available", reason))
        } else {
            RoutingDecision::new(usable, reason)
        };

        tracing::debug!(query_id = %query.id, "Routed query to {}", decision);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_core::AppError;

    const BOTH: [SourceKind; 2] = SourceKind::ALL;

    fn route(text: &str, available: &[SourceKind]) -> RoutingDecision {
        Router::default().route(&Query::new(text).unwrap(), available)
    }

    struct BrokenClassifier;

    impl IntentClassifier for BrokenClassifier {
        fn classify(&self, _query: &str) -> AppResult<Intent> {
            Err(AppError::Other("model not loaded".to_string()))
        }
    }

    #[test]
    fn test_uploaded_report_routes_to_documents() {
        let decision = route("What does the uploaded report say about Q3 revenue?", &BOTH);
        assert_eq!(decision.sources(), &[SourceKind::Document]);
        assert!(!decision.broad_recall);
    }

    #[test]
    fn test_latest_stock_price_routes_to_web() {
        let decision = route("What's the latest stock price of Acme Corp?", &BOTH);
        assert!(decision.includes(SourceKind::Web));
        assert!(!decision.includes(SourceKind::Document));
    }

    #[test]
    fn test_year_counts_as_web_cue() {
        let decision = route("Who won the 2024 championship?", &BOTH);
        assert_eq!(decision.sources(), &[SourceKind::Web]);
    }

    #[test]
    fn test_mixed_cues_route_to_both() {
        let decision = route("How does our pricing compare to the latest competitor news?", &BOTH);
        assert_eq!(decision.sources(), &BOTH);
        assert!(!decision.broad_recall);
    }

    #[test]
    fn test_ambiguous_query_uses_broad_recall() {
        let decision = route("Explain the revenue numbers", &BOTH);
        assert_eq!(decision.sources(), &BOTH);
        assert!(decision.broad_recall);
    }

    #[test]
    fn test_document_cue_without_documents_falls_back() {
        let decision = route("Summarize our internal policy", &[SourceKind::Web]);
        assert_eq!(decision.sources(), &[SourceKind::Web]);
        assert!(decision.broad_recall);
    }

    #[test]
    fn test_mixed_cues_with_partial_availability() {
        let decision = route("Latest news about our company", &[SourceKind::Web]);
        assert_eq!(decision.sources(), &[SourceKind::Web]);
        assert!(decision.reason.contains("partially available"));
    }

    #[test]
    fn test_classifier_error_falls_back_to_broad_recall() {
        let router = Router::new(Box::new(BrokenClassifier));
        let decision = router.route(&Query::new("anything").unwrap(), &[SourceKind::Document]);

        assert_eq!(decision.sources(), &[SourceKind::Document]);
        assert!(decision.broad_recall);
    }

    #[test]
    fn test_never_empty() {
        let queries = [
            "hi",
            "What does the uploaded report say?",
            "latest",
            "???",
            "our 2025 plan and today's news",
        ];
        let availabilities: [&[SourceKind]; 4] = [
            &[],
            &[SourceKind::Document],
            &[SourceKind::Web],
            &BOTH,
        ];

        for query in queries {
            for available in availabilities {
                assert!(!route(query, available).sources().is_empty(), "{}", query);
            }
        }
    }

    #[test]
    fn test_word_boundaries() {
        let intent = KeywordClassifier.classify("Tour the flower shop").unwrap();
        assert!(intent.document_cues.is_empty());
        assert!(intent.web_cues.is_empty());
    }
}
