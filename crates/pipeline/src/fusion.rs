//! Evidence fusion.
//!
//! Merges per-agent evidence lists into one [`EvidenceSet`]:
//! 1. concatenate;
//! 2. order by score descending, then source precedence, then source id,
//!    then text, which is a total order independent of agent completion order;
//! 3. walk that order keeping an item only if it is not a near-duplicate of
//!    one already kept (same source id, or token-set Jaccard similarity at or
//!    above the threshold);
//! 4. truncate to the evidence budget.
//!
//! Scores pass through unchanged. Because kept items are pairwise distinct
//! and already in order, fusing a fused set returns it unchanged.

use crate::types::{EvidenceItem, EvidenceSet};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use veritas_core::{FusionSettings, SourceKind};

/// Deduplicates and ranks evidence from all agents.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    similarity_threshold: f32,
    max_evidence: usize,
    precedence: Vec<SourceKind>,
}

impl FusionEngine {
    pub fn new(settings: &FusionSettings) -> Self {
        Self {
            similarity_threshold: settings.similarity_threshold,
            max_evidence: settings.max_evidence,
            precedence: settings.source_precedence.clone(),
        }
    }

    /// Fuse evidence lists into a single ranked, deduplicated set.
    pub fn fuse<I>(&self, lists: I) -> EvidenceSet
    where
        I: IntoIterator<Item = Vec<EvidenceItem>>,
    {
        let mut candidates: Vec<EvidenceItem> = lists.into_iter().flatten().collect();
        let total = candidates.len();
        candidates.sort_by(|a, b| self.compare(a, b));

        let mut kept: Vec<(EvidenceItem, BTreeSet<String>)> = Vec::new();
        for item in candidates {
            let tokens = tokenize(&item.text);
            let duplicate = kept.iter().any(|(existing, existing_tokens)| {
                existing.source_id == item.source_id
                    || jaccard(existing_tokens, &tokens) >= self.similarity_threshold
            });

            if duplicate {
                tracing::trace!(
                    "Dropping near-duplicate {} ({}, {:.2})",
                    item.source_id,
                    item.source_type,
                    item.score
                );
                continue;
            }
            kept.push((item, tokens));
        }

        let unique = kept.len();
        kept.truncate(self.max_evidence);

        tracing::debug!(
            "Fused {} items into {} ({} duplicates, {} over budget)",
            total,
            kept.len(),
            total - unique,
            unique - kept.len()
        );

        EvidenceSet::from_ranked(kept.into_iter().map(|(item, _)| item).collect())
    }

    fn precedence_of(&self, kind: SourceKind) -> usize {
        self.precedence
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.precedence.len())
    }

    fn compare(&self, a: &EvidenceItem, b: &EvidenceItem) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then_with(|| {
                self.precedence_of(a.source_type)
                    .cmp(&self.precedence_of(b.source_type))
            })
            .then_with(|| a.source_id.cmp(&b.source_id))
            .then_with(|| a.text.cmp(&b.text))
    }
}

/// Lowercased alphanumeric tokens of `text`.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Token-set Jaccard similarity. Two token-less texts count as identical.
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Similarity of two texts as used for deduplication.
pub fn text_similarity(a: &str, b: &str) -> f32 {
    jaccard(&tokenize(a), &tokenize(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(threshold: f32, budget: usize) -> FusionEngine {
        FusionEngine::new(&FusionSettings {
            similarity_threshold: threshold,
            max_evidence: budget,
            ..Default::default()
        })
    }

    fn doc(text: &str, id: &str, score: f32) -> EvidenceItem {
        EvidenceItem::new(text, id, score, SourceKind::Document)
    }

    fn web(text: &str, id: &str, score: f32) -> EvidenceItem {
        EvidenceItem::new(text, id, score, SourceKind::Web)
    }

    #[test]
    fn test_similarity_ignores_case_and_punctuation() {
        assert_eq!(text_similarity("Revenue rose 12%.", "revenue ROSE 12"), 1.0);
        assert_eq!(text_similarity("alpha beta", "gamma delta"), 0.0);
        assert!((text_similarity("a b c d", "a b c e") - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_higher_scored_duplicate_survives() {
        let fused = engine(0.8, 10).fuse(vec![
            vec![doc("Q3 revenue was $4.2M, up 12%.", "report#3", 0.9)],
            vec![web("Q3 revenue was $4.2M, up 12%", "https://news.example", 0.7)],
        ]);

        assert_eq!(fused.len(), 1);
        assert_eq!(fused.items()[0].source_type, SourceKind::Document);
        assert_eq!(fused.items()[0].score, 0.9);
    }

    #[test]
    fn test_equal_scores_prefer_document() {
        let fused = engine(0.8, 10).fuse(vec![
            vec![web("Acme shares closed at $41", "https://a.example", 0.8)],
            vec![doc("Acme shares closed at $41", "memo#0", 0.8)],
        ]);

        assert_eq!(fused.len(), 1);
        assert_eq!(fused.items()[0].source_id, "memo#0");
    }

    #[test]
    fn test_precedence_is_configurable() {
        let engine = FusionEngine::new(&FusionSettings {
            source_precedence: vec![SourceKind::Web, SourceKind::Document],
            ..Default::default()
        });
        let fused = engine.fuse(vec![
            vec![doc("same claim here", "memo#0", 0.5)],
            vec![web("same claim here", "https://a.example", 0.5)],
        ]);
        assert_eq!(fused.items()[0].source_type, SourceKind::Web);
    }

    #[test]
    fn test_same_source_id_is_duplicate() {
        let fused = engine(0.99, 10).fuse(vec![vec![
            web("first snippet", "https://a.example", 0.6),
            web("a different snippet", "https://a.example", 0.4),
        ]]);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused.items()[0].text, "first snippet");
    }

    #[test]
    fn test_distinct_claims_all_survive() {
        let fused = engine(0.8, 10).fuse(vec![
            vec![
                doc("Revenue rose 12% in Q3", "r#0", 0.9),
                doc("Costs were flat", "r#1", 0.4),
            ],
            vec![web("Acme hired a new CFO", "https://b.example", 0.6)],
        ]);

        let scores: Vec<f32> = fused.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![0.9, 0.6, 0.4]);
    }

    #[test]
    fn test_truncation_drops_lowest_scores() {
        let items: Vec<EvidenceItem> = (0..8)
            .map(|i| web(&format!("claim number {}", i), &format!("u{}", i), i as f32 / 10.0))
            .collect();
        let fused = engine(0.9, 3).fuse(vec![items]);

        assert_eq!(fused.len(), 3);
        let ids: Vec<&str> = fused.iter().map(|i| i.source_id.as_str()).collect();
        assert_eq!(ids, vec!["u7", "u6", "u5"]);
    }

    #[test]
    fn test_order_independent_of_list_order() {
        let a = vec![doc("alpha claim", "d#0", 0.5), doc("beta claim text", "d#1", 0.7)];
        let b = vec![web("gamma news item", "https://g.example", 0.5)];

        let engine = engine(0.8, 10);
        let first = engine.fuse(vec![a.clone(), b.clone()]);
        let second = engine.fuse(vec![b, a]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fusing_fused_set_is_idempotent() {
        let engine = engine(0.6, 4);
        let once = engine.fuse(vec![
            vec![
                doc("Revenue rose 12% in Q3", "r#0", 0.9),
                doc("Revenue rose 12 percent in Q3", "r#5", 0.85),
                doc("Margins improved to 31%", "r#1", 0.6),
            ],
            vec![
                web("Revenue rose 12% in Q3 says Acme", "https://a.example", 0.8),
                web("Acme hired a new CFO", "https://b.example", 0.5),
                web("Acme opened an office in Lisbon", "https://c.example", 0.3),
            ],
        ]);
        let twice = engine.fuse(vec![once.clone().into_items()]);

        assert_eq!(once, twice);
        assert!(once.len() <= 4);
    }

    #[test]
    fn test_empty_input() {
        assert!(engine(0.8, 5).fuse(Vec::<Vec<EvidenceItem>>::new()).is_empty());
    }
}
