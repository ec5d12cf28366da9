//! Command handlers for CLI operations
//!
//! - ask: answer a question end to end
//! - plan: show the plan the planner picks
//! - check-sql: run the safety gate on a statement
//! - serve: start the HTTP API

use anyhow::{Context, Result};
use sdk::{AnswerEnvelope, CommitLensErrorExt, EngineError};
use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{CommitStore, Database};
use crate::orchestrator::Orchestrator;
use crate::safety::SqlSafetyGate;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

async fn build_orchestrator(config: &Config) -> Result<(Orchestrator, Arc<Database>)> {
    let database = Arc::new(Database::connect(&config.database).await?);
    let store: Arc<dyn CommitStore> = Arc::clone(&database) as Arc<dyn CommitStore>;
    let orchestrator = Orchestrator::from_config(config, store)?;
    Ok((orchestrator, database))
}

/// Hint for the first [`EngineError`] in an error chain
pub fn error_hint(err: &anyhow::Error) -> Option<&str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EngineError>())
        .map(|e| e.user_hint())
}

/// Human-readable rendering of an answer
pub fn render_envelope(envelope: &AnswerEnvelope) -> String {
    let mut out = String::new();

    if envelope.error {
        let _ = writeln!(out, "Error: {}", envelope.answer);
        return out;
    }

    let _ = writeln!(out, "{}", envelope.answer);

    if let Some(source) = envelope.source_type {
        let _ = writeln!(out, "\nSource: {}", source);
    }

    if let Some(sources) = envelope.sources.as_ref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "Commits:");
        for citation in sources {
            match citation.score {
                Some(score) => {
                    let _ = writeln!(
                        out,
                        "  {}  {}  ({:.3})",
                        citation.commit_hash, citation.author, score
                    );
                }
                None => {
                    let _ = writeln!(out, "  {}  {}", citation.commit_hash, citation.author);
                }
            }
        }
    }

    out
}

/// Answer a question
pub async fn handle_ask(question: String, config: &Config, format: OutputFormat) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        return Err(EngineError::InvalidInput("Message cannot be empty".to_string()).into());
    }

    let (orchestrator, database) = build_orchestrator(config).await?;
    let envelope = orchestrator.answer(question).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envelope)?),
        OutputFormat::Text => print!("{}", render_envelope(&envelope)),
    }

    drop(orchestrator);
    if let Ok(database) = Arc::try_unwrap(database) {
        database.close().await;
    }

    if envelope.error {
        anyhow::bail!("The question could not be answered");
    }
    Ok(())
}

/// Show the plan for a question
pub async fn handle_plan(question: String, config: &Config, format: OutputFormat) -> Result<()> {
    let (orchestrator, _database) = build_orchestrator(config).await?;
    let plan = orchestrator.plan(question.trim()).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan.to_json())?),
        OutputFormat::Text => {
            println!("Action: {}", plan.action());
            if let Some(fields) = plan.to_json().as_object() {
                for (key, value) in fields.iter().filter(|(k, v)| *k != "action" && !v.is_null()) {
                    match value.as_str() {
                        Some(s) => println!("  {}: {}", key, s),
                        None => println!("  {}: {}", key, value),
                    }
                }
            }
        }
    }

    Ok(())
}

/// Check a statement against the safety gate
pub fn handle_check_sql(sql: String, format: OutputFormat) -> Result<()> {
    let violation = SqlSafetyGate::new().check(&sql);

    match format {
        OutputFormat::Json => {
            let report = json!({
                "sql": sql,
                "safe": violation.is_none(),
                "reason": violation.as_ref().map(|v| v.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => match &violation {
            None => println!("SAFE: statement may be executed"),
            Some(v) => println!("REJECTED: {}", v),
        },
    }

    Ok(())
}

/// Start the HTTP API
pub async fn handle_serve(bind: Option<String>, config: &Config) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let (orchestrator, _database) = build_orchestrator(config).await?;

    api_server::serve(&bind, Arc::new(orchestrator))
        .await
        .with_context(|| format!("API server on {} failed", bind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::{Citation, SourceType};

    #[test]
    fn test_render_error_envelope() {
        let envelope = AnswerEnvelope::failure("No SQL query provided");
        assert_eq!(render_envelope(&envelope), "Error: No SQL query provided\n");
    }

    #[test]
    fn test_render_answer_with_sources() {
        let envelope = AnswerEnvelope::answered("Alice fixed it.", SourceType::Semantic)
            .with_sources(vec![Citation {
                commit_hash: "abc123".to_string(),
                author: "Alice".to_string(),
                score: Some(0.8766),
            }]);

        let text = render_envelope(&envelope);
        assert!(text.starts_with("Alice fixed it.\n\nSource: semantic\n"));
        assert!(text.contains("  abc123  Alice  (0.877)"));
    }

    #[tokio::test]
    async fn test_blank_question_is_invalid_input() {
        let err = handle_ask("  \n ".to_string(), &Config::default(), OutputFormat::Text)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidInput(_))
        ));
        assert_eq!(err.to_string(), "Invalid input: Message cannot be empty");
    }

    #[test]
    fn test_error_hint_found_under_context() {
        let err = anyhow::Error::from(EngineError::Database("refused".to_string()))
            .context("Failed to start");
        assert_eq!(
            error_hint(&err),
            Some(EngineError::Database(String::new()).user_hint())
        );

        assert_eq!(error_hint(&anyhow::anyhow!("plain failure")), None);
    }

    #[test]
    fn test_render_answer_without_sources() {
        let envelope = AnswerEnvelope::answered("3 commits", SourceType::Sql);
        assert_eq!(render_envelope(&envelope), "3 commits\n\nSource: sql\n");
    }
}
