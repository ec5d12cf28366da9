/// Database module for the commit knowledge base
///
/// Commits live in Postgres with the pgvector extension. Schema ownership and
/// ingestion belong to other services; this module only reads. Every query
/// runs inside a `READ ONLY` transaction so that text produced by a model can
/// never write, even if it slips past the lexical safety gate.
use anyhow::{Context, Result};
use async_trait::async_trait;
use sdk::EngineError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{ConnectOptions, Row};
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::settings::StoredLlmSettings;

pub mod commits;
pub mod rows;

// Re-export commonly used types
pub use commits::{nearest_commits_sql, vector_literal, NearestQuery, RetrievedCommit};
pub use rows::SqlRow;

/// Read access to the commit knowledge base
///
/// Implemented by [`Database`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait CommitStore: Send + Sync {
    /// Execute a read-only statement and return every row, column order preserved
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<SqlRow>>;

    /// Nearest-neighbour search over commits that have an embedding
    async fn nearest_commits(&self, query: &NearestQuery<'_>) -> Result<Vec<RetrievedCommit>>;

    /// Most recent LLM settings row, if any
    async fn latest_llm_settings(&self) -> Result<Option<StoredLlmSettings>>;
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to Postgres
    ///
    /// The pool is shared by all concurrent requests.
    pub async fn connect(config: &DatabaseConfig) -> std::result::Result<Self, EngineError> {
        info!("Connecting to commit database");

        let options = PgConnectOptions::from_str(&config.url)
            .map_err(|e| EngineError::Database(format!("invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| EngineError::Database(format!("failed to connect: {}", e)))?;

        debug!("Database connection established");

        Ok(Self { pool })
    }

    /// Close the database connection
    pub async fn close(self) {
        info!("Closing database connection");
        self.pool.close().await;
    }
}

#[async_trait]
impl CommitStore for Database {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<SqlRow>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin read-only transaction")?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .context("Failed to mark transaction read-only")?;

        let rows = sqlx::query(sql)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to execute query")?;

        tx.rollback().await.ok();

        debug!("Direct query returned {} rows", rows.len());
        Ok(rows.iter().map(SqlRow::from_pg_row).collect())
    }

    async fn nearest_commits(&self, query: &NearestQuery<'_>) -> Result<Vec<RetrievedCommit>> {
        let sql = nearest_commits_sql(query.predicate);
        let vector = vector_literal(query.embedding);

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin read-only transaction")?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .context("Failed to mark transaction read-only")?;

        let rows = sqlx::query(&sql)
            .bind(vector)
            .bind(query.limit)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to execute vector search")?;

        tx.rollback().await.ok();

        let mut commits = Vec::with_capacity(rows.len());
        for row in rows {
            commits.push(RetrievedCommit {
                commit_hash: row.try_get("commit_hash")?,
                author: row.try_get("author")?,
                committed_date: row.try_get("committed_date")?,
                message: row.try_get("message")?,
                summary_text: row.try_get("summary_text")?,
                feedback: row.try_get("feedback")?,
                score: row.try_get("score")?,
            });
        }

        Ok(commits)
    }

    async fn latest_llm_settings(&self) -> Result<Option<StoredLlmSettings>> {
        let row = sqlx::query(
            r#"
            SELECT llm_summarizer_url, llm_model, llm_api_key
            FROM configs
            ORDER BY created_at DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read latest configs row")?;

        Ok(row.map(|row| StoredLlmSettings {
            completions_url: row.try_get::<Option<String>, _>("llm_summarizer_url").ok().flatten(),
            model: row.try_get::<Option<String>, _>("llm_model").ok().flatten(),
            api_key: row.try_get::<Option<String>, _>("llm_api_key").ok().flatten(),
        }))
    }
}
