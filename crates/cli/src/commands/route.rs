//! Route command handler.

use clap::Args;
use veritas_core::{config::AppConfig, AppResult};
use veritas_pipeline::{Orchestrator, Query};

/// Show which sources a question would be routed to
#[derive(Args, Debug)]
pub struct RouteCommand {
    /// The question to route
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RouteCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing route command");

        let query = Query::new(self.question.join(" "))?;
        let orchestrator = Orchestrator::from_config(config).await?;
        let available = orchestrator.available_sources();
        let decision = orchestrator.route(&query);

        if self.json {
            return super::print_json(&serde_json::json!({
                "available": available,
                "decision": decision,
            }));
        }

        let names: Vec<&str> = available.iter().map(|s| s.as_str()).collect();
        println!("Available: {}", names.join(", "));
        println!("Route: {}", decision);
        if decision.broad_recall {
            println!("(broad recall)");
        }
        Ok(())
    }
}
