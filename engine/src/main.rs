// CommitLens
// Main entry point for the commitlens binary

use clap::Parser;
use commitlens_engine::cli::{Cli, Command};
use commitlens_engine::config::Config;
use commitlens_engine::handlers::{
    error_hint, handle_ask, handle_check_sql, handle_plan, handle_serve, OutputFormat,
};
use commitlens_engine::telemetry::init_telemetry_with_level;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(hint) = error_hint(&e) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)
    } else {
        Config::load_or_create()
    }?;

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("CommitLens v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Ask { question } => {
            tracing::debug!("Answering question");
            handle_ask(question, &config, format).await
        }

        Command::Plan { question } => handle_plan(question, &config, format).await,

        Command::CheckSql { sql } => handle_check_sql(sql, format),

        Command::Serve { bind } => {
            tracing::info!("Starting API server...");
            handle_serve(bind, &config).await
        }
    }
}
