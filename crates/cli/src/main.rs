//! PolicyLens CLI
//!
//! Fetches website privacy policies, answers questions about them and
//! scores their privacy risk.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AnalyzeCommand, AskCommand, ListCommand, ScoreCommand};
use policylens_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// PolicyLens - question answering over website privacy policies
#[derive(Parser, Debug)]
#[command(name = "policylens")]
#[command(about = "Ask questions about website privacy policies", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "POLICYLENS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.policylens/config.yaml)
    #[arg(short, long, global = true, env = "POLICYLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Embedding provider (trigram, ollama)
    #[arg(long, global = true)]
    embedding_provider: Option<String>,

    /// Answer extractor (lexical, http)
    #[arg(long, global = true)]
    extractor_provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a site's privacy policy, answer the major questions and score it
    Analyze(AnalyzeCommand),

    /// Answer one question about a saved or local policy
    Ask(AskCommand),

    /// Risk score of a saved or local policy
    Score(ScoreCommand),

    /// List saved policies
    List(ListCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // File and environment first, then command-line flags
    let config = AppConfig::load_from(cli.workspace, cli.config)?.with_overrides(
        cli.embedding_provider,
        cli.extractor_provider,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("PolicyLens starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {}/{}, extractor: {}/{}",
        config.embedding.provider,
        config.embedding.model,
        config.extractor.provider,
        config.extractor.model
    );

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Analyze(_) => "analyze",
        Commands::Ask(_) => "ask",
        Commands::Score(_) => "score",
        Commands::List(_) => "list",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Analyze(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Score(cmd) => cmd.execute(&config).await,
        Commands::List(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
