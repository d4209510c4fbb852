//! Grounded answer generation.
//!
//! Evidence is numbered `[1]..[n]` in the prompt. The model's reply is then
//! checked sentence by sentence: markers outside `1..=n` are removed, and a
//! sentence left without any valid marker is dropped. Surviving markers are
//! renumbered in order of first appearance so the citation list is compact.

use crate::types::{AnswerResult, AnswerStatus, Citation, CitedSpan, EvidenceSet, Query};
use chrono::Utc;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use veritas_core::{AppError, AppResult, LlmSettings};
use veritas_llm::{LlmClient, LlmRequest};
use veritas_prompt::{build_prompt, PromptContext, PromptDefinition, PromptEvidence};

/// Lowercased abbreviations whose trailing period is not a sentence end.
const ABBREVIATIONS: &[&str] = &[
    "corp", "inc", "ltd", "llc", "co", "vs", "e.g", "i.e", "mr", "mrs", "ms", "dr", "prof",
    "st", "jr", "sr", "approx", "u.s", "u.k", "e.u",
];

/// Longest evidence snippet carried in a citation, in characters.
const CITATION_SNIPPET_CHARS: usize = 240;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*(\d+(?:\s*,\s*\d+)*)\s*\]").expect("marker regex is valid")
});
static LEADING_MARKERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\[\s*\d+(?:\s*,\s*\d+)*\s*\])+").expect("leading marker regex is valid")
});
static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.!?,;:])").expect("punctuation regex is valid"));
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("space regex is valid"));

/// Produces cited answers from fused evidence.
pub struct AnswerGenerator {
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompt: PromptDefinition, settings: &LlmSettings) -> Self {
        Self {
            llm,
            prompt,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Override the generation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer `query` from `evidence`.
    ///
    /// Never fails: empty evidence yields the insufficient-evidence answer
    /// without calling the model, and any backend error, timeout, or reply
    /// without a single valid citation yields a generation-failure answer.
    pub async fn generate(&self, query: &Query, evidence: &EvidenceSet) -> AnswerResult {
        if evidence.is_empty() {
            tracing::info!("No evidence available, skipping generation");
            return AnswerResult::insufficient_evidence(&query.id);
        }

        let request = match self.build_request(query, evidence) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("Failed to build answer prompt: {}", e);
                return AnswerResult::generation_failed(&query.id, e.to_string());
            }
        };

        match self.complete_grounded(&request, evidence).await {
            Ok(grounded) => AnswerResult {
                query_id: query.id.clone(),
                text: grounded.text,
                citations: grounded.citations,
                spans: grounded.spans,
                status: AnswerStatus::Grounded,
                generated_at: Utc::now(),
            },
            Err(e) => {
                tracing::warn!("Generation failed: {}", e);
                AnswerResult::generation_failed(&query.id, e.to_string())
            }
        }
    }

    async fn complete_grounded(
        &self,
        request: &LlmRequest,
        evidence: &EvidenceSet,
    ) -> AppResult<GroundedText> {
        tracing::debug!(
            provider = self.llm.provider_name(),
            model = %self.model,
            evidence = evidence.len(),
            "Requesting answer"
        );

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "generation timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })??;

        ground(&response.content, evidence).ok_or_else(|| {
            AppError::Generation("answer contained no valid citations".to_string())
        })
    }

    fn build_request(&self, query: &Query, evidence: &EvidenceSet) -> AppResult<LlmRequest> {
        let context = PromptContext {
            query: query.text.clone(),
            evidence: evidence
                .iter()
                .enumerate()
                .map(|(i, item)| PromptEvidence {
                    marker: i as u32 + 1,
                    source_type: item.source_type.to_string(),
                    source_id: item.source_id.clone(),
                    text: item.text.clone(),
                })
                .collect(),
        };

        let built = build_prompt(&self.prompt, &context)?;
        let mut request = LlmRequest::new(built.user, self.model.clone())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }
}

/// A reply reduced to its cited sentences.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedText {
    pub text: String,
    pub citations: Vec<Citation>,
    pub spans: Vec<CitedSpan>,
}

/// Keep only the sentences of `reply` that cite evidence in `evidence`.
///
/// Returns `None` when no sentence survives.
pub fn ground(reply: &str, evidence: &EvidenceSet) -> Option<GroundedText> {
    let items = evidence.items();
    let valid = 1..=items.len();

    // original marker -> renumbered marker
    let mut renumbered: BTreeMap<usize, u32> = BTreeMap::new();
    let mut order: Vec<usize> = Vec::new();
    let mut text = String::new();
    let mut spans = Vec::new();

    for sentence in split_sentences(reply) {
        let mut markers: Vec<u32> = Vec::new();
        let rewritten = MARKER_RE.replace_all(sentence, |caps: &Captures| {
            let mut out = String::new();
            for number in caps[1].split(',') {
                let Ok(original) = number.trim().parse::<usize>() else {
                    continue;
                };
                if !valid.contains(&original) {
                    tracing::debug!("Dropping citation [{}] outside 1..={}", original, items.len());
                    continue;
                }
                let next = renumbered.len() as u32 + 1;
                let marker = *renumbered.entry(original).or_insert_with(|| {
                    order.push(original);
                    next
                });
                if !markers.contains(&marker) {
                    markers.push(marker);
                    out.push_str(&format!("[{}]", marker));
                }
            }
            out
        });

        if markers.is_empty() {
            tracing::debug!("Dropping uncited sentence: {}", sentence);
            continue;
        }

        let cleaned = MULTI_SPACE_RE.replace_all(&rewritten, " ");
        let cleaned = SPACE_BEFORE_PUNCT_RE.replace_all(&cleaned, "$1");
        let cleaned = cleaned.trim();

        if !text.is_empty() {
            text.push(' ');
        }
        let start = text.len();
        text.push_str(cleaned);
        spans.push(CitedSpan {
            start,
            end: text.len(),
            markers,
        });
    }

    if spans.is_empty() {
        return None;
    }

    let citations = order
        .iter()
        .map(|&original| {
            let item = &items[original - 1];
            Citation {
                marker: renumbered[&original],
                source_id: item.source_id.clone(),
                source_type: item.source_type,
                snippet: truncate_chars(&item.text, CITATION_SNIPPET_CHARS),
            }
        })
        .collect();

    Some(GroundedText {
        text,
        citations,
        spans,
    })
}

/// Split text into sentences at `.`, `!` or `?` followed by whitespace or end
/// of line. Citation markers directly after the terminator stay with the
/// sentence they follow. Line breaks always end a sentence. A period after a
/// common abbreviation or a single initial, or one followed by a lowercase
/// word, does not end a sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let mut start = 0;
        let mut cursor = 0;

        while let Some(offset) = line[cursor..].find(['.', '!', '?']) {
            let terminator = cursor + offset;
            let mut end = terminator + 1;
            while line[end..].starts_with(['.', '!', '?']) {
                end += 1;
            }

            let rest = &line[end..];
            if let Some(m) = LEADING_MARKERS_RE.find(rest) {
                end += m.end();
            } else if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                // "4.2", "U.S": not a boundary
                cursor = end;
                continue;
            } else if end - terminator == 1
                && line[terminator..].starts_with('.')
                && !rest.is_empty()
                && !is_sentence_end(&line[start..terminator], rest)
            {
                cursor = end;
                continue;
            }

            let sentence = line[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
            cursor = end;
        }

        let tail = line[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }
    }

    sentences
}

/// Whether a `.` closing `before` and followed by `after` ends a sentence.
fn is_sentence_end(before: &str, after: &str) -> bool {
    let token = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '"', '\'']);

    let lower = token.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return false;
    }

    // Single initial, as in "John F. Kennedy"
    let mut chars = token.chars();
    if matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase()) {
        return false;
    }

    !after
        .trim_start()
        .starts_with(|c: char| c.is_lowercase())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::FusionEngine;
    use crate::types::EvidenceItem;
    use veritas_core::{FusionSettings, SourceKind};
    use veritas_llm::MockClient;
    use veritas_prompt::{load_prompt, GROUNDED_ANSWER_PROMPT};

    fn evidence() -> EvidenceSet {
        FusionEngine::new(&FusionSettings::default()).fuse(vec![vec![
            EvidenceItem::new("Q3 revenue was $4.2M.", "q3#0", 0.9, SourceKind::Document),
            EvidenceItem::new("Margins improved to 31%.", "q3#1", 0.8, SourceKind::Document),
            EvidenceItem::new("Acme hired a CFO.", "https://n.example", 0.7, SourceKind::Web),
        ]])
    }

    fn generator(client: MockClient) -> AnswerGenerator {
        let temp = tempfile::TempDir::new().unwrap();
        let prompt = load_prompt(temp.path(), GROUNDED_ANSWER_PROMPT).unwrap();
        AnswerGenerator::new(Arc::new(client), prompt, &LlmSettings::default())
    }

    #[test]
    fn test_split_sentences() {
        let parts = split_sentences("Revenue was $4.2M [1]. Margins rose. [2] Done!\nNext line");
        assert_eq!(
            parts,
            vec!["Revenue was $4.2M [1].", "Margins rose. [2]", "Done!", "Next line"]
        );
    }

    #[test]
    fn test_split_sentences_keeps_abbreviations() {
        assert_eq!(
            split_sentences("Acme Corp. shares closed at $41 today [1]. Margins held [2]."),
            vec!["Acme Corp. shares closed at $41 today [1].", "Margins held [2]."]
        );
        assert_eq!(
            split_sentences("Sales grew in the U.S. and Europe, e.g. in Spain [2]. J. Smith agreed [1]."),
            vec!["Sales grew in the U.S. and Europe, e.g. in Spain [2].", "J. Smith agreed [1]."]
        );
        assert_eq!(split_sentences("A rose [1]. B fell [2]."), vec!["A rose [1].", "B fell [2]."]);
    }

    #[test]
    fn test_ground_keeps_sentence_with_abbreviation() {
        let grounded = ground("Acme Corp. shares closed at $41 today [1].", &evidence()).unwrap();
        assert_eq!(grounded.text, "Acme Corp. shares closed at $41 today [1].");

        let grounded = ground("Revenue rose 12% vs. last year [1].", &evidence()).unwrap();
        assert_eq!(grounded.text, "Revenue rose 12% vs. last year [1].");
        assert_eq!(grounded.spans.len(), 1);
    }

    #[test]
    fn test_ground_renumbers_by_first_appearance() {
        let grounded = ground("Margins improved [2]. Revenue hit $4.2M [1][2].", &evidence()).unwrap();

        assert_eq!(grounded.text, "Margins improved [1]. Revenue hit $4.2M [2][1].");
        assert_eq!(grounded.citations.len(), 2);
        assert_eq!(grounded.citations[0].marker, 1);
        assert_eq!(grounded.citations[0].source_id, "q3#1");
        assert_eq!(grounded.citations[1].source_id, "q3#0");
        assert_eq!(grounded.spans[1].markers, vec![2, 1]);
    }

    #[test]
    fn test_ground_drops_invented_citations_and_uncited_sentences() {
        let reply = "Revenue hit $4.2M [1][7]. The CEO resigned [9]. Analysts were pleased.";
        let grounded = ground(reply, &evidence()).unwrap();

        assert_eq!(grounded.text, "Revenue hit $4.2M [1].");
        assert_eq!(grounded.citations.len(), 1);
        assert_eq!(grounded.spans.len(), 1);
    }

    #[test]
    fn test_ground_accepts_comma_lists() {
        let grounded = ground("Both improved [1, 2].", &evidence()).unwrap();
        assert_eq!(grounded.text, "Both improved [1][2].");
    }

    #[test]
    fn test_ground_spans_index_answer_text() {
        let grounded = ground("First claim [3]. Second claim [1].", &evidence()).unwrap();
        for span in &grounded.spans {
            let sentence = &grounded.text[span.start..span.end];
            assert!(sentence.ends_with('.'));
        }
        assert_eq!(&grounded.text[grounded.spans[1].start..grounded.spans[1].end], "Second claim [2].");
    }

    #[test]
    fn test_ground_nothing_cited() {
        assert!(ground("I could not find anything.", &evidence()).is_none());
        assert!(ground("Made up [4].", &evidence()).is_none());
    }

    #[tokio::test]
    async fn test_empty_evidence_skips_backend() {
        let client = Arc::new(MockClient::new());
        let temp = tempfile::TempDir::new().unwrap();
        let prompt = load_prompt(temp.path(), GROUNDED_ANSWER_PROMPT).unwrap();
        let generator = AnswerGenerator::new(client.clone(), prompt, &LlmSettings::default());

        let answer = generator
            .generate(&Query::new("q").unwrap(), &EvidenceSet::default())
            .await;

        assert_eq!(answer.status, AnswerStatus::InsufficientEvidence);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_extractive_mock_produces_grounded_answer() {
        let answer = generator(MockClient::new())
            .generate(&Query::new("How did Q3 go?").unwrap(), &evidence())
            .await;

        assert_eq!(answer.status, AnswerStatus::Grounded);
        assert_eq!(answer.citations.len(), 3);
        let ids: Vec<&str> = answer.citations.iter().map(|c| c.source_id.as_str()).collect();
        assert!(evidence().iter().all(|e| ids.contains(&e.source_id.as_str())));
    }

    #[tokio::test]
    async fn test_backend_error_is_generation_failure() {
        let answer = generator(MockClient::failing("connection refused"))
            .generate(&Query::new("q").unwrap(), &evidence())
            .await;

        match answer.status {
            AnswerStatus::GenerationFailed { reason } => assert!(reason.contains("connection refused")),
            other => panic!("expected generation failure, got {:?}", other),
        }
        assert!(answer.citations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_generation_failure() {
        let answer = generator(MockClient::new().with_delay(Duration::from_secs(60)))
            .with_timeout(Duration::from_secs(5))
            .generate(&Query::new("q").unwrap(), &evidence())
            .await;

        match answer.status {
            AnswerStatus::GenerationFailed { reason } => {
                assert_eq!(reason, "Generation error: generation timed out after 5000ms")
            }
            other => panic!("expected generation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_uncited_reply_is_generation_failure() {
        let answer = generator(MockClient::reply("Everything went great."))
            .generate(&Query::new("q").unwrap(), &evidence())
            .await;

        assert_eq!(
            answer.status,
            AnswerStatus::GenerationFailed {
                reason: "Generation error: answer contained no valid citations".to_string()
            }
        );
        assert!(answer.citations.is_empty());
    }
}
