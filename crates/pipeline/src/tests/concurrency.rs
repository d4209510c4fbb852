use super::{hit, FixedIndex, Harness};
use crate::orchestrator::ContributionStatus;
use crate::types::Query;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use veritas_core::{AppError, SourceKind};
use veritas_llm::MockClient;
use veritas_search::StaticSearchClient;

const MIXED_QUERY: &str = "How does our Q3 revenue compare with the latest news?";

fn report() -> FixedIndex {
    FixedIndex::new(&[
        ("q3#0", "Q3 revenue was 42 million dollars.", 0.7),
        ("q3#1", "Headcount grew to 180 people.", 0.4),
    ])
}

fn coverage() -> StaticSearchClient {
    StaticSearchClient::new(vec![
        hit("https://news.example/a", "Acme beat revenue estimates this quarter.", 0.7),
        hit("https://news.example/b", "Acme opened an office in Lisbon.", 0.5),
    ])
}

#[tokio::test(start_paused = true)]
async fn test_slow_agent_does_not_delay_past_timeout() {
    let harness = Harness::new()
        .documents(report())
        .web(coverage().with_delay(Duration::from_secs(30)));
    let orchestrator = harness.build();

    let started = Instant::now();
    let run = orchestrator
        .run(Query::new(MIXED_QUERY).unwrap(), &CancellationToken::new())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(1));
    let document = run
        .contributions
        .iter()
        .find(|c| c.source == SourceKind::Document)
        .unwrap();
    assert_eq!(document.status, ContributionStatus::Ok { items: 2 });
}

#[tokio::test(start_paused = true)]
async fn test_agents_run_concurrently() {
    let harness = Harness::new()
        .documents(report().with_delay(Duration::from_millis(150)))
        .web(coverage().with_delay(Duration::from_millis(150)));

    let started = Instant::now();
    let run = harness
        .build()
        .run(Query::new(MIXED_QUERY).unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(200));
    assert!(run.contributions.iter().all(|c| c.is_ok()));
}

#[tokio::test(start_paused = true)]
async fn test_result_independent_of_completion_order() {
    let documents_last = Harness::new()
        .documents(report().with_delay(Duration::from_millis(80)))
        .web(coverage())
        .build()
        .run(Query::new(MIXED_QUERY).unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    let web_last = Harness::new()
        .documents(report())
        .web(coverage().with_delay(Duration::from_millis(80)))
        .build()
        .run(Query::new(MIXED_QUERY).unwrap(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(documents_last.evidence, web_last.evidence);
    assert_eq!(documents_last.answer.text, web_last.answer.text);
    let sources = |run: &crate::orchestrator::PipelineRun| -> Vec<SourceKind> {
        run.contributions.iter().map(|c| c.source).collect()
    };
    assert_eq!(sources(&documents_last), sources(&web_last));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_retrieval() {
    let mut harness = Harness::new()
        .documents(report())
        .web(coverage().with_delay(Duration::from_secs(5)));
    // Only cancellation, not the agent timeout, can stop the web search
    harness.retrieval.agent_timeout_ms = 60_000;
    let orchestrator = harness.build();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = orchestrator.run(Query::new(MIXED_QUERY).unwrap(), &cancel).await;

    assert!(result.is_err_and(|e| e.is_cancelled()));
    assert_eq!(harness.llm.calls(), 0);

    // The aborted web task must not run to completion in the background
    tokio::time::sleep(Duration::from_secs(10)).await;
    let web = harness.web.as_ref().unwrap();
    assert_eq!(web.calls(), 1);
    assert_eq!(web.completions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_generation() {
    let harness = Harness::new()
        .documents(report())
        .llm(MockClient::new().with_delay(Duration::from_secs(10)));
    let orchestrator = harness.build();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = orchestrator
        .answer_query(Query::new("Summarize our report").unwrap(), &cancel)
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(harness.llm.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let harness = Harness::new().documents(report()).web(coverage());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = harness
        .build()
        .run(Query::new(MIXED_QUERY).unwrap(), &cancel)
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(harness.web.as_ref().unwrap().calls(), 0);
}
