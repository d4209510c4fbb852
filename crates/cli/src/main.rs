//! Veritas CLI
//!
//! Main entry point for the veritas command-line tool: ask questions
//! answered from local documents and the web, with citations.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, KnowledgeCommand, PromptsCommand, RouteCommand};
use std::path::PathBuf;
use veritas_core::{
    config::{AppConfig, ConfigOverrides},
    logging::{self, LogFormat},
    AppError, AppResult,
};

/// Veritas - cited answers from your documents and the web
#[derive(Parser, Debug)]
#[command(name = "veritas")]
#[command(about = "Cited answers from your documents and the web", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "VERITAS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "VERITAS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long, global = true, env = "VERITAS_LOG_FORMAT")]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai, openrouter, gemini, mock)
    #[arg(short, long, global = true, env = "VERITAS_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "VERITAS_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question and get a cited answer
    Ask(AskCommand),

    /// Show which sources a question would be routed to
    Route(RouteCommand),

    /// Document knowledge base management
    Knowledge(KnowledgeCommand),

    /// List or show answer prompts
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;
    let config = config.with_overrides(ConfigOverrides {
        workspace: cli.workspace,
        config_file: cli.config,
        provider: cli.provider,
        model: cli.model,
        log_level: cli.log_level,
        log_format: cli.log_format,
        verbose: cli.verbose,
        no_color: cli.no_color,
        ..Default::default()
    });

    let log_format = LogFormat::parse(&config.log_format).ok_or_else(|| {
        AppError::Config(format!("Unknown log format: {}", config.log_format))
    })?;
    logging::init_logging(config.log_level.as_deref(), config.no_color, log_format)?;

    tracing::info!("Veritas CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.llm.provider, config.llm.model);

    config.validate()?;
    config.ensure_veritas_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Route(_) => "route",
        Commands::Knowledge(_) => "knowledge",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Route(cmd) => cmd.execute(&config).await,
        Commands::Knowledge(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) if e.is_cancelled() => tracing::warn!("Command cancelled"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_collects_question_words() {
        let cli = Cli::try_parse_from([
            "veritas", "ask", "What", "changed?", "--session", "s1", "-k", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.question.join(" "), "What changed?");
                assert_eq!(cmd.session.as_deref(), Some("s1"));
                assert_eq!(cmd.top_k, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["veritas", "ask"]).is_err());
    }
}
