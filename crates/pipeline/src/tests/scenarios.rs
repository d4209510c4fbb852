use super::{assert_grounded, hit, FixedIndex, Harness};
use crate::orchestrator::{ContributionStatus, PipelineState};
use crate::types::{AnswerStatus, Query, INSUFFICIENT_EVIDENCE_TEXT};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use veritas_core::SourceKind;
use veritas_llm::MockClient;
use veritas_search::StaticSearchClient;

fn quarterly_report() -> FixedIndex {
    FixedIndex::new(&[
        ("q3#0", "Q3 revenue was 42 million dollars, up 12 percent.", 0.82),
        ("q3#1", "Operating margin improved to 31 percent.", 0.55),
    ])
}

fn news() -> StaticSearchClient {
    StaticSearchClient::new(vec![
        hit("https://news.example/acme", "Acme shares closed at 41 dollars today.", 0.9),
        hit("https://markets.example/acme", "Analysts expect Acme to raise guidance.", 0.7),
    ])
}

#[tokio::test]
async fn test_document_question_cites_only_documents() {
    let harness = Harness::new().documents(quarterly_report()).web(news());
    let orchestrator = harness.build();

    let run = orchestrator
        .run(
            Query::new("What does our Q3 report say about revenue?").unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(run.decision.sources(), &[SourceKind::Document]);
    assert_eq!(harness.web.as_ref().unwrap().calls(), 0);
    assert_eq!(run.state, PipelineState::Done);
    assert_eq!(run.answer.status, AnswerStatus::Grounded);
    assert!(!run.answer.citations.is_empty());
    assert!(run
        .answer
        .citations
        .iter()
        .all(|c| c.source_type == SourceKind::Document));
    assert_grounded(&run);
}

#[tokio::test(start_paused = true)]
async fn test_web_question_with_web_timeout_is_insufficient() {
    let harness = Harness::new()
        .documents(quarterly_report())
        .web(news().with_delay(Duration::from_secs(10)));
    let orchestrator = harness.build();

    let run = orchestrator
        .run(
            Query::new("What is Acme's stock price today?").unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(run.decision.sources(), &[SourceKind::Web]);
    assert_eq!(run.contributions.len(), 1);
    assert_eq!(run.contributions[0].status, ContributionStatus::TimedOut);
    assert_eq!(run.answer.status, AnswerStatus::InsufficientEvidence);
    assert_eq!(run.answer.text, INSUFFICIENT_EVIDENCE_TEXT);
    assert_eq!(harness.llm.calls(), 0);
    assert_eq!(run.state, PipelineState::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_question_with_web_timeout_answers_from_documents() {
    let harness = Harness::new()
        .documents(quarterly_report())
        .web(news().with_delay(Duration::from_secs(10)));

    let run = harness
        .build()
        .run(
            Query::new("How does our Q3 revenue compare with the latest news?").unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(run.decision.sources(), &SourceKind::ALL);
    assert_eq!(run.state, PipelineState::Done);
    assert_eq!(run.answer.status, AnswerStatus::Grounded);
    assert!(run
        .evidence
        .iter()
        .all(|e| e.source_type == SourceKind::Document));
    assert!(run
        .contributions
        .iter()
        .any(|c| c.source == SourceKind::Web && c.status == ContributionStatus::TimedOut));
    assert_grounded(&run);
}

#[tokio::test]
async fn test_duplicate_claim_keeps_document_copy() {
    let harness = Harness::new()
        .documents(FixedIndex::new(&[(
            "q3#0",
            "Acme Q3 revenue was 42 million dollars.",
            0.8,
        )]))
        .web(StaticSearchClient::new(vec![
            hit("https://news.example/acme", "Acme Q3 revenue was 42 million dollars", 0.8),
            hit("https://news.example/cfo", "Acme hired a new chief financial officer.", 0.6),
        ]));

    let run = harness
        .build()
        .run(
            Query::new("Compare our revenue with the latest coverage").unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(run.evidence.len(), 2);
    assert_eq!(run.evidence.items()[0].source_id, "q3#0");
    assert!(run
        .evidence
        .iter()
        .all(|e| e.source_id != "https://news.example/acme"));
    assert!(run.answer.citations.iter().any(|c| c.source_id == "q3#0"));
    assert_grounded(&run);
}

#[tokio::test(start_paused = true)]
async fn test_generation_timeout_reports_failure() {
    let mut harness = Harness::new()
        .documents(quarterly_report())
        .llm(MockClient::new().with_delay(Duration::from_secs(60)));
    harness.llm_settings.timeout_secs = 1;

    let run = harness
        .build()
        .run(
            Query::new("What does our report say about margins?").unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!run.evidence.is_empty());
    assert!(run.answer.citations.is_empty());
    match run.answer.status {
        AnswerStatus::GenerationFailed { ref reason } => assert!(reason.contains("timed out")),
        ref other => panic!("expected generation failure, got {:?}", other),
    }
    assert_eq!(run.state, PipelineState::Done);
}

#[tokio::test]
async fn test_invented_citations_are_removed() {
    let harness = Harness::new().documents(quarterly_report()).llm(MockClient::reply(
        "Revenue was 42 million dollars [1]. The CEO resigned [9]. Margins improved [2].",
    ));

    let run = harness
        .build()
        .run(
            Query::new("Summarize our Q3 report").unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        run.answer.text,
        "Revenue was 42 million dollars [1]. Margins improved [2]."
    );
    assert_eq!(run.answer.citations.len(), 2);
    assert_grounded(&run);
}

#[tokio::test]
async fn test_reply_without_citations_is_generation_failure() {
    let harness = Harness::new()
        .documents(quarterly_report())
        .llm(MockClient::reply("Things went well this quarter."));

    let run = harness
        .build()
        .run(Query::new("Summarize our Q3 report").unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(run.answer.status, AnswerStatus::GenerationFailed { .. }));
    assert_eq!(run.state, PipelineState::Done);
    assert_grounded(&run);
}

#[tokio::test]
async fn test_all_agents_failing_ends_in_failed_state() {
    let harness = Harness::new()
        .documents(FixedIndex::failing("index corrupted"))
        .web(StaticSearchClient::failing("quota exceeded"));

    let run = harness
        .build()
        .run(
            Query::new("How does our revenue compare with the latest news?").unwrap(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(run.contributions.len(), 2);
    assert!(run
        .contributions
        .iter()
        .all(|c| matches!(c.status, ContributionStatus::Failed { .. })));
    assert_eq!(run.answer.status, AnswerStatus::InsufficientEvidence);
    assert_eq!(run.state, PipelineState::Failed);
    assert_eq!(harness.llm.calls(), 0);
}

#[tokio::test]
async fn test_no_configured_sources_degrades() {
    let run = Harness::new()
        .build()
        .run(Query::new("anything at all").unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(run.decision.broad_recall);
    assert_eq!(run.contributions.len(), 2);
    assert!(run.contributions.iter().all(|c| !c.is_ok()));
    assert_eq!(run.answer.status, AnswerStatus::InsufficientEvidence);
    assert_eq!(run.state, PipelineState::Failed);
}

#[tokio::test]
async fn test_run_serializes_for_display() {
    let run = Harness::new()
        .documents(quarterly_report())
        .build()
        .run(Query::new("What is in our report?").unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    let value = serde_json::to_value(&run).unwrap();
    assert_eq!(value["state"], "done");
    assert_eq!(value["answer"]["status"]["kind"], "grounded");
    assert_eq!(value["contributions"][0]["status"]["kind"], "ok");
    assert_eq!(value["decision"]["sources"][0], "document");
}
