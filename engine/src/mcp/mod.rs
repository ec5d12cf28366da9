//! Tool-call proxy client
//!
//! Structured queries are first sent to an MCP-style proxy as
//! `{"method": "tools/call", "params": {"name", "arguments"}}`. The proxy
//! answers with an arbitrary JSON object; an `error` key means the call
//! failed and the caller falls back to direct execution.
//!
//! Transport failures are folded into an `{"error": ...}` object so that the
//! proxy contract is a plain JSON map in every case.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::config::McpConfig;
use crate::db::SqlRow;

/// JSON object returned by the proxy
pub type ToolCallResponse = Map<String, Value>;

/// Generic tool-call proxy
#[async_trait]
pub trait ToolCallProxy: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResponse;

    /// Execute SQL through the proxy's SQL tool
    async fn execute_sql(&self, sql: &str) -> ToolCallResponse;
}

/// Interpretation of a proxy response
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallOutcome {
    /// Tabular rows under `result`
    Rows(Vec<SqlRow>),

    /// Text items under `content`, or a scalar `result`
    Text(String),

    /// Unrecognised shape, kept as serialized JSON
    Raw(String),

    /// The response carried an `error` key
    Failed(String),
}

impl ToolCallOutcome {
    pub fn from_response(response: &ToolCallResponse) -> Self {
        if let Some(error) = response.get("error") {
            let reason = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return ToolCallOutcome::Failed(reason);
        }

        if let Some(Value::Array(items)) = response.get("content") {
            let text: String = items
                .iter()
                .filter_map(|item| item.get("text"))
                .map(|t| match t {
                    Value::String(s) => format!("{}\n", s),
                    other => format!("{}\n", other),
                })
                .collect();
            return ToolCallOutcome::Text(text);
        }

        match response.get("result") {
            Some(Value::Array(rows)) => {
                ToolCallOutcome::Rows(rows.iter().map(SqlRow::from_json).collect())
            }
            Some(Value::String(s)) => ToolCallOutcome::Text(s.clone()),
            Some(other) => ToolCallOutcome::Text(other.to_string()),
            None => ToolCallOutcome::Raw(Value::Object(response.clone()).to_string()),
        }
    }
}

/// HTTP client for the MCP proxy
pub struct McpClient {
    enabled: bool,
    base_url: String,
    sql_tool: String,
    client: reqwest::Client,
}

impl McpClient {
    pub fn new(config: &McpConfig) -> Self {
        Self {
            enabled: config.enabled,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sql_tool: config.sql_tool.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn error_response(message: impl Into<String>) -> ToolCallResponse {
        let mut map = Map::new();
        map.insert("error".to_string(), Value::String(message.into()));
        map
    }

    async fn post(&self, payload: &Value) -> Result<ToolCallResponse, reqwest::Error> {
        self.client
            .post(format!("{}/message", self.base_url))
            .json(payload)
            .send()
            .await?
            .error_for_status()?
            .json::<ToolCallResponse>()
            .await
    }
}

#[async_trait]
impl ToolCallProxy for McpClient {
    async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResponse {
        if !self.enabled {
            return Self::error_response("MCP is disabled");
        }

        let payload = json!({
            "method": "tools/call",
            "params": {
                "name": name,
                "arguments": arguments,
            }
        });

        match self.post(&payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("MCP callTool({}) error: {}", name, e);
                Self::error_response(e.to_string())
            }
        }
    }

    async fn execute_sql(&self, sql: &str) -> ToolCallResponse {
        self.call_tool(&self.sql_tool, json!({ "sql": sql })).await
    }
}
