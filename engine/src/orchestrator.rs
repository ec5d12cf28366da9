//! Question-answering pipeline
//!
//! One call to [`Orchestrator::answer`] runs plan → retrieve → synthesize for
//! a single question. Requests share only the collaborator clients, so any
//! number of them can run concurrently on one `Arc<Orchestrator>`.
//!
//! Nothing escapes this boundary: errors and panics raised anywhere in the
//! pipeline come back as an error [`AnswerEnvelope`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::FutureExt;
use sdk::{AnswerEnvelope, Answerer, EngineError, SourceType};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::CommitStore;
use crate::embedding::HttpEmbeddingClient;
use crate::llm::openai::OpenAICompatibleProvider;
use crate::llm::CompletionProvider;
use crate::mcp::McpClient;
use crate::planner::{ActionPlan, PlanGenerator};
use crate::retrieval::{RetrievalError, RetrievalExecutor, Strategy, HYBRID_LIMIT, SEMANTIC_LIMIT};
use crate::safety::SqlSafetyGate;
use crate::settings::{DatabaseSettings, LlmSettings, SettingsSource, StaticSettings};
use crate::synthesizer::AnswerSynthesizer;

pub const SAFETY_REJECTION: &str =
    "Query rejected for safety reasons. Only SELECT queries are allowed.";
pub const NO_SQL: &str = "No SQL query provided";
pub const NO_COMMIT_HASH: &str = "No commit hash provided";

/// Longest accepted commit hash prefix (full SHA-1)
const MAX_HASH_LEN: usize = 40;

/// Whether `hash` can be interpolated into the commit lookup query
pub fn is_commit_hash_prefix(hash: &str) -> bool {
    !hash.is_empty() && hash.len() <= MAX_HASH_LEN && hash.chars().all(|c| c.is_ascii_hexdigit())
}

/// Trusted single-commit lookup by hash prefix
///
/// Callers must check [`is_commit_hash_prefix`] first.
pub fn retrieve_commit_sql(hash: &str) -> String {
    format!(
        "SELECT commit_hash, author, committed_date, message, summary_text, feedback, diff_text \
         FROM commit WHERE commit_hash LIKE '{}%' LIMIT 1",
        hash.to_ascii_lowercase()
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}

pub struct Orchestrator {
    settings: Arc<dyn SettingsSource>,
    planner: PlanGenerator,
    retrieval: RetrievalExecutor,
    synthesizer: AnswerSynthesizer,
    gate: SqlSafetyGate,
}

impl Orchestrator {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        planner: PlanGenerator,
        retrieval: RetrievalExecutor,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            settings,
            planner,
            retrieval,
            synthesizer,
            gate: SqlSafetyGate::new(),
        }
    }

    /// Wire the production collaborators from configuration
    pub fn from_config(config: &Config, store: Arc<dyn CommitStore>) -> Result<Self> {
        let llm: Arc<dyn CompletionProvider> = Arc::new(
            OpenAICompatibleProvider::new(Duration::from_secs(config.llm.timeout_secs))
                .map_err(|e| EngineError::LLMProvider(format!("failed to build client: {}", e)))?,
        );
        let embedder = Arc::new(
            HttpEmbeddingClient::new(&config.embedding)
                .map_err(|e| EngineError::Embedding(format!("failed to build client: {}", e)))?,
        );
        let proxy = Arc::new(McpClient::new(&config.mcp));

        let file_settings = LlmSettings::from(&config.llm);
        let settings: Arc<dyn SettingsSource> = if config.database.settings_from_db {
            Arc::new(DatabaseSettings::new(Arc::clone(&store), file_settings))
        } else {
            Arc::new(StaticSettings::new(file_settings))
        };

        Ok(Self::new(
            settings,
            PlanGenerator::new(
                Arc::clone(&llm),
                config.llm.planner_temperature,
                config.llm.planner_max_tokens,
            ),
            RetrievalExecutor::new(store, embedder, proxy),
            AnswerSynthesizer::new(
                llm,
                config.llm.answer_temperature,
                config.llm.answer_max_tokens,
            ),
        ))
    }

    /// Plan a question without executing it
    pub async fn plan(&self, question: &str) -> Result<ActionPlan> {
        let settings = self
            .settings
            .resolve()
            .await
            .context("Failed to resolve LLM settings")?;
        Ok(self.planner.plan(&settings, question).await)
    }

    /// Answer a question; never fails
    pub async fn answer(&self, question: &str) -> AnswerEnvelope {
        match AssertUnwindSafe(self.run(question)).catch_unwind().await {
            Ok(Ok(envelope)) => envelope,
            Ok(Err(e)) => {
                error!("Pipeline error: {:#}", e);
                Self::fault(&format!("{:#}", e))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Pipeline panicked: {}", message);
                Self::fault(&message)
            }
        }
    }

    fn fault(message: &str) -> AnswerEnvelope {
        AnswerEnvelope::failure(format!(
            "Sorry, I encountered an error processing your question: {}",
            message
        ))
    }

    async fn run(&self, question: &str) -> Result<AnswerEnvelope> {
        let settings = self
            .settings
            .resolve()
            .await
            .context("Failed to resolve LLM settings")?;

        let plan = self.planner.plan(&settings, question).await;
        Ok(self.execute_plan(&settings, question, plan).await)
    }

    /// Dispatch one plan
    pub async fn execute_plan(
        &self,
        settings: &LlmSettings,
        question: &str,
        plan: ActionPlan,
    ) -> AnswerEnvelope {
        info!("Executing plan: {}", plan.action());

        match plan {
            ActionPlan::ExecuteSql { sql } => {
                let Some(sql) = non_blank(sql.as_deref()) else {
                    return AnswerEnvelope::failure(NO_SQL);
                };
                if !self.gate.is_safe(sql) {
                    return AnswerEnvelope::failure(SAFETY_REJECTION);
                }
                self.structured(settings, question, sql, SourceType::Sql).await
            }

            ActionPlan::SemanticSearch { query, .. } => {
                let query = non_blank(query.as_deref()).unwrap_or(question);
                let strategy = Strategy::Vector {
                    query,
                    limit: SEMANTIC_LIMIT,
                };
                self.ranked(settings, question, strategy, SourceType::Semantic)
                    .await
            }

            ActionPlan::RetrieveCommit { commit_hash } => {
                let Some(hash) = non_blank(commit_hash.as_deref()) else {
                    return AnswerEnvelope::failure(NO_COMMIT_HASH);
                };
                if !is_commit_hash_prefix(hash) {
                    warn!("Rejected commit hash {:?}", hash);
                    return AnswerEnvelope::failure(format!("Invalid commit hash: {}", hash));
                }
                let sql = retrieve_commit_sql(hash);
                self.structured(settings, question, &sql, SourceType::Commit)
                    .await
            }

            ActionPlan::HybridSearch { sql, query } => {
                let strategy = Strategy::Hybrid {
                    sql: non_blank(sql.as_deref()),
                    query: non_blank(query.as_deref()).unwrap_or(question),
                    limit: HYBRID_LIMIT,
                };
                self.ranked(settings, question, strategy, SourceType::Hybrid)
                    .await
            }

            ActionPlan::Unsupported { action } => {
                AnswerEnvelope::failure(format!("Unsupported action: {}", action))
            }
        }
    }

    async fn structured(
        &self,
        settings: &LlmSettings,
        question: &str,
        sql: &str,
        source: SourceType,
    ) -> AnswerEnvelope {
        let evidence = self.retrieval.structured(sql).await;
        self.synthesizer
            .synthesize(settings, question, &evidence.text, Some(source), None)
            .await
    }

    async fn ranked(
        &self,
        settings: &LlmSettings,
        question: &str,
        strategy: Strategy<'_>,
        source: SourceType,
    ) -> AnswerEnvelope {
        match self.retrieval.execute(strategy).await {
            Ok(evidence) => {
                self.synthesizer
                    .synthesize(
                        settings,
                        question,
                        &evidence.text,
                        Some(source),
                        evidence.rows.as_deref(),
                    )
                    .await
            }
            Err(RetrievalError::EmbeddingUnavailable) => {
                AnswerEnvelope::failure(RetrievalError::EmbeddingUnavailable.to_string())
            }
            Err(e) => {
                let label = if source == SourceType::Hybrid {
                    "hybrid"
                } else {
                    "semantic"
                };
                AnswerEnvelope::failure(format!("Error performing {} search: {}", label, e))
            }
        }
    }
}

#[async_trait]
impl Answerer for Orchestrator {
    fn name(&self) -> &str {
        "commitlens"
    }

    async fn answer(&self, question: &str) -> AnswerEnvelope {
        Orchestrator::answer(self, question).await
    }
}
