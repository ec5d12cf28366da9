//! Query Planner
//!
//! Asks the completion service to turn a free-text question into exactly one
//! [`ActionPlan`]. Planning never fails: transport errors, malformed JSON and
//! a missing `action` key all yield [`ActionPlan::fallback`], a semantic
//! search over the raw question.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::llm::{strip_code_fences, CompletionProvider, CompletionRequest};
use crate::settings::LlmSettings;

mod prompt;

pub use prompt::{build_planner_prompt, PLANNER_SYSTEM_PROMPT};

/// Column searched when the plan does not name one
pub const DEFAULT_FIELD: &str = "summary_text";

/// Action literals understood by the orchestrator
pub const EXECUTE_SQL: &str = "execute_sql";
pub const SEMANTIC_SEARCH: &str = "semantic_search";
pub const RETRIEVE_COMMIT: &str = "retrieve_commit";
pub const HYBRID_SEARCH: &str = "hybrid_search";

/// One retrieval decision for a question
///
/// Values the model left out are `None`; only the fields of the chosen
/// variant exist at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPlan {
    ExecuteSql {
        sql: Option<String>,
    },
    SemanticSearch {
        /// Informational only; every commit carries a single embedding
        field: String,
        query: Option<String>,
    },
    RetrieveCommit {
        commit_hash: Option<String>,
    },
    HybridSearch {
        sql: Option<String>,
        query: Option<String>,
    },
    /// An action literal the pipeline does not know, kept verbatim
    Unsupported {
        action: String,
    },
}

impl ActionPlan {
    /// Build a plan from the model's JSON object
    ///
    /// Returns `None` only when `action` is missing or not a string.
    /// Non-string values for the other keys are treated as absent.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let action = map.get("action")?.as_str()?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        let plan = match action {
            EXECUTE_SQL => ActionPlan::ExecuteSql { sql: text("sql") },
            SEMANTIC_SEARCH => ActionPlan::SemanticSearch {
                field: text("field").unwrap_or_else(|| DEFAULT_FIELD.to_string()),
                query: text("query"),
            },
            RETRIEVE_COMMIT => ActionPlan::RetrieveCommit {
                commit_hash: text("commit_hash"),
            },
            HYBRID_SEARCH => ActionPlan::HybridSearch {
                sql: text("sql"),
                query: text("query").or_else(|| text("semantic_query")),
            },
            other => ActionPlan::Unsupported {
                action: other.to_string(),
            },
        };

        Some(plan)
    }

    /// Plan used whenever the model's answer cannot be used
    pub fn fallback(question: &str) -> Self {
        ActionPlan::SemanticSearch {
            field: DEFAULT_FIELD.to_string(),
            query: Some(question.to_string()),
        }
    }

    /// The action literal of this plan
    pub fn action(&self) -> &str {
        match self {
            ActionPlan::ExecuteSql { .. } => EXECUTE_SQL,
            ActionPlan::SemanticSearch { .. } => SEMANTIC_SEARCH,
            ActionPlan::RetrieveCommit { .. } => RETRIEVE_COMMIT,
            ActionPlan::HybridSearch { .. } => HYBRID_SEARCH,
            ActionPlan::Unsupported { action } => action,
        }
    }

    /// JSON rendering in the model's own vocabulary
    pub fn to_json(&self) -> Value {
        match self {
            ActionPlan::ExecuteSql { sql } => json!({ "action": EXECUTE_SQL, "sql": sql }),
            ActionPlan::SemanticSearch { field, query } => {
                json!({ "action": SEMANTIC_SEARCH, "field": field, "query": query })
            }
            ActionPlan::RetrieveCommit { commit_hash } => {
                json!({ "action": RETRIEVE_COMMIT, "commit_hash": commit_hash })
            }
            ActionPlan::HybridSearch { sql, query } => {
                json!({ "action": HYBRID_SEARCH, "sql": sql, "query": query })
            }
            ActionPlan::Unsupported { action } => json!({ "action": action }),
        }
    }
}

/// Parse a raw model response into a plan
///
/// Code fences around the JSON are tolerated.
pub fn parse_plan(content: &str) -> Result<ActionPlan> {
    let body = strip_code_fences(content);
    let map: Map<String, Value> =
        serde_json::from_str(body).context("Planner response is not a JSON object")?;

    ActionPlan::from_map(&map).context("Planner response has no action")
}

/// Turns questions into plans through the completion service
pub struct PlanGenerator {
    llm: Arc<dyn CompletionProvider>,
    temperature: f64,
    max_tokens: u32,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn CompletionProvider>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            llm,
            temperature,
            max_tokens,
        }
    }

    /// Plan a question; falls back to semantic search on any failure
    pub async fn plan(&self, settings: &LlmSettings, question: &str) -> ActionPlan {
        match self.request_plan(settings, question).await {
            Ok(plan) => {
                info!("Planner chose action: {}", plan.action());
                plan
            }
            Err(e) => {
                warn!("Planner failed, falling back to semantic search: {:#}", e);
                ActionPlan::fallback(question)
            }
        }
    }

    async fn request_plan(&self, settings: &LlmSettings, question: &str) -> Result<ActionPlan> {
        let request = CompletionRequest::new(
            PLANNER_SYSTEM_PROMPT,
            build_planner_prompt(question),
            self.temperature,
            self.max_tokens,
        );

        let content = self
            .llm
            .complete(settings, &request)
            .await
            .with_context(|| format!("{} completion failed", self.llm.name()))?;

        debug!("Planner raw response: {} chars", content.len());
        parse_plan(&content)
    }
}
