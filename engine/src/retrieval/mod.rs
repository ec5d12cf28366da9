//! Retrieval strategies
//!
//! Structured, vector and hybrid retrieval share one contract: a
//! [`Strategy`] goes in, [`Evidence`] comes out. Evidence text is what the
//! synthesizer reads; the vector-ranked rows travel alongside only to build
//! citations.
//!
//! Fallbacks are explicit:
//! - structured queries go to the tool-call proxy first and to the database
//!   when the proxy answers with an error
//! - a hybrid query whose composed predicate fails is retried as a plain
//!   vector query with the same embedding and limit

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{CommitStore, NearestQuery, RetrievedCommit};
use crate::embedding::EmbeddingProvider;
use crate::mcp::{ToolCallOutcome, ToolCallProxy};
use crate::safety::SqlSafetyGate;

pub mod format;
pub mod predicate;

pub use format::{format_commits, render_rows, MAX_DISPLAY_ROWS, NO_RESULTS};
pub use predicate::{extract_where_clause, TAUTOLOGY};

/// Result count for plain semantic search
pub const SEMANTIC_LIMIT: i64 = 10;

/// Result count for hybrid search
pub const HYBRID_LIMIT: i64 = 20;

/// How to retrieve evidence for one question
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy<'a> {
    /// Run a SQL statement that already passed the safety gate
    Structured { sql: &'a str },

    /// Rank commits by similarity to `query`
    Vector { query: &'a str, limit: i64 },

    /// Vector ranking restricted by the filter of a planner SQL statement
    Hybrid {
        sql: Option<&'a str>,
        query: &'a str,
        limit: i64,
    },
}

/// Retrieved data in the shape the synthesizer consumes
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub text: String,

    /// Vector-ranked rows, kept for citations
    pub rows: Option<Vec<RetrievedCommit>>,
}

impl Evidence {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: None,
        }
    }

    fn ranked(rows: Vec<RetrievedCommit>) -> Self {
        Self {
            text: format_commits(&rows),
            rows: Some(rows),
        }
    }
}

/// Failures a strategy cannot recover from
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Failed to generate embedding for the query")]
    EmbeddingUnavailable,

    #[error("{0:#}")]
    Datastore(anyhow::Error),
}

/// Executes retrieval strategies against the collaborators
pub struct RetrievalExecutor {
    store: Arc<dyn CommitStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    proxy: Arc<dyn ToolCallProxy>,
    gate: SqlSafetyGate,
}

impl RetrievalExecutor {
    pub fn new(
        store: Arc<dyn CommitStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        proxy: Arc<dyn ToolCallProxy>,
    ) -> Self {
        Self {
            store,
            embedder,
            proxy,
            gate: SqlSafetyGate::new(),
        }
    }

    pub async fn execute(&self, strategy: Strategy<'_>) -> Result<Evidence, RetrievalError> {
        match strategy {
            Strategy::Structured { sql } => Ok(self.structured(sql).await),
            Strategy::Vector { query, limit } => self.vector(query, limit).await,
            Strategy::Hybrid { sql, query, limit } => self.hybrid(sql, query, limit).await,
        }
    }

    /// Structured query; proxy first, then the database
    ///
    /// Never fails: a database error is rendered into the evidence text.
    pub async fn structured(&self, sql: &str) -> Evidence {
        let response = self.proxy.execute_sql(sql).await;

        match ToolCallOutcome::from_response(&response) {
            ToolCallOutcome::Rows(rows) => Evidence::text(render_rows(&rows)),
            ToolCallOutcome::Text(text) | ToolCallOutcome::Raw(text) => Evidence::text(text),
            ToolCallOutcome::Failed(reason) => {
                debug!("Tool-call proxy unavailable ({}), querying database directly", reason);
                self.direct(sql).await
            }
        }
    }

    async fn direct(&self, sql: &str) -> Evidence {
        match self.store.fetch_rows(sql).await {
            Ok(rows) => Evidence::text(render_rows(&rows)),
            Err(e) => {
                warn!("Direct SQL execution failed: {:#}", e);
                Evidence::text(format!("Error executing SQL: {:#}", e))
            }
        }
    }

    async fn embed(&self, query: &str) -> Result<Vec<f32>, RetrievalError> {
        let embedding = self.embedder.embed(query).await;
        if embedding.is_empty() {
            return Err(RetrievalError::EmbeddingUnavailable);
        }
        Ok(embedding)
    }

    async fn nearest(
        &self,
        embedding: &[f32],
        predicate: Option<&str>,
        limit: i64,
    ) -> anyhow::Result<Vec<RetrievedCommit>> {
        self.store
            .nearest_commits(&NearestQuery {
                embedding,
                predicate,
                limit,
            })
            .await
    }

    async fn vector(&self, query: &str, limit: i64) -> Result<Evidence, RetrievalError> {
        let embedding = self.embed(query).await?;

        let rows = self
            .nearest(&embedding, None, limit)
            .await
            .map_err(RetrievalError::Datastore)?;

        info!("Semantic search returned {} commits", rows.len());
        Ok(Evidence::ranked(rows))
    }

    async fn hybrid(
        &self,
        sql: Option<&str>,
        query: &str,
        limit: i64,
    ) -> Result<Evidence, RetrievalError> {
        let embedding = self.embed(query).await?;

        let predicate = match sql {
            Some(sql) if self.gate.is_safe(sql) => Some(extract_where_clause(sql)),
            Some(_) => {
                warn!("Hybrid filter rejected by safety gate, ranking without it");
                None
            }
            None => None,
        };

        let rows = match predicate {
            Some(predicate) => match self.nearest(&embedding, Some(&predicate), limit).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Hybrid query failed, falling back to plain vector search: {:#}", e);
                    self.nearest(&embedding, None, limit)
                        .await
                        .map_err(RetrievalError::Datastore)?
                }
            },
            None => self
                .nearest(&embedding, None, limit)
                .await
                .map_err(RetrievalError::Datastore)?,
        };

        info!("Hybrid search returned {} commits", rows.len());
        Ok(Evidence::ranked(rows))
    }
}
