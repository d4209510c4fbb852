//! Ask command handler.
//!
//! Runs a question through the full pipeline and prints the cited answer.
//! Ctrl-C cancels the query in flight.

use clap::Args;
use tokio_util::sync::CancellationToken;
use veritas_core::{config::AppConfig, AppResult};
use veritas_pipeline::{AnswerStatus, ContributionStatus, Orchestrator, PipelineRun, Query};

/// Ask a question and get a cited answer
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Session identifier attached to logs
    #[arg(long)]
    pub session: Option<String>,

    /// Evidence items requested from each source
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Per-source retrieval timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print routing, per-source outcomes and the evidence set
    #[arg(long)]
    pub show_evidence: bool,

    /// Output the full run as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let mut config = config.clone();
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.retrieval.agent_timeout_ms = timeout_ms;
        }
        config.validate()?;

        let mut query = Query::new(self.question.join(" "))?;
        if let Some(ref session) = self.session {
            query = query.with_session(session.clone());
        }

        let orchestrator = Orchestrator::from_config(&config).await?;

        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, cancelling query");
                    cancel.cancel();
                }
            })
        };

        let result = orchestrator.run(query, &cancel).await;
        interrupt.abort();
        let run = result?;

        if self.json {
            return super::print_json(&run);
        }

        if self.show_evidence {
            print_diagnostics(&run);
        }
        print_answer(&run);
        Ok(())
    }
}

fn print_answer(run: &PipelineRun) {
    let answer = &run.answer;
    println!("{}", answer.text);

    match answer.status {
        AnswerStatus::Grounded => {
            println!();
            println!("Sources:");
            for citation in &answer.citations {
                println!(
                    "[{}] ({}) {}",
                    citation.marker, citation.source_type, citation.source_id
                );
            }
        }
        AnswerStatus::InsufficientEvidence => {
            eprintln!("(no evidence was found for this question)");
        }
        AnswerStatus::GenerationFailed { ref reason } => {
            eprintln!("(answer generation failed: {})", reason);
        }
    }
}

fn print_diagnostics(run: &PipelineRun) {
    println!("Routing: {}", run.decision);
    for contribution in &run.contributions {
        let outcome = match contribution.status {
            ContributionStatus::Ok { items } => format!("{} items", items),
            ContributionStatus::TimedOut => "timed out".to_string(),
            ContributionStatus::Failed { ref error } => format!("failed: {}", error),
        };
        println!(
            "  {:<8} {} ({}ms)",
            contribution.source.as_str(),
            outcome,
            contribution.elapsed_ms
        );
    }

    println!("Evidence:");
    for (i, item) in run.evidence.iter().enumerate() {
        println!(
            "  [{}] {:.2} ({}) {}",
            i + 1,
            item.score,
            item.source_type,
            item.source_id
        );
    }
    println!();
}
