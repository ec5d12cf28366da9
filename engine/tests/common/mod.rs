//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use commitlens_engine::db::{CommitStore, NearestQuery, RetrievedCommit, SqlRow};
use commitlens_engine::embedding::EmbeddingProvider;
use commitlens_engine::llm::{self, CompletionProvider, CompletionRequest, LLMError};
use commitlens_engine::mcp::{ToolCallProxy, ToolCallResponse};
use commitlens_engine::planner::PlanGenerator;
use commitlens_engine::retrieval::RetrievalExecutor;
use commitlens_engine::settings::{LlmSettings, SettingsSource, StaticSettings};
use commitlens_engine::synthesizer::AnswerSynthesizer;
use commitlens_engine::orchestrator::Orchestrator;

pub fn settings() -> LlmSettings {
    LlmSettings {
        completions_url: "http://llm.invalid/v1/chat/completions".to_string(),
        model: "test-model".to_string(),
        api_key: "test-key".to_string(),
    }
}

pub fn commit(i: usize) -> RetrievedCommit {
    RetrievedCommit {
        commit_hash: format!("{:07x}", 0xabc0000 + i),
        author: format!("author{}", i),
        committed_date: None,
        message: format!("message {}", i),
        summary_text: Some(format!("summary {}", i)),
        feedback: None,
        score: Some(0.9 - i as f64 / 100.0),
    }
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {}", other),
    }
}

/// Datastore fake that records every call
#[derive(Default)]
pub struct FakeStore {
    pub rows: Vec<SqlRow>,
    pub commits: Vec<RetrievedCommit>,

    /// Fail any nearest query that carries a predicate
    pub reject_predicates: bool,

    /// Fail every call
    pub fail_all: bool,

    /// Panic inside `fetch_rows`
    pub panic_on_fetch: bool,

    pub fetch_calls: AtomicUsize,
    pub nearest_calls: AtomicUsize,
    pub fetched_sql: Mutex<Vec<String>>,
    pub predicates: Mutex<Vec<Option<String>>>,
    pub limits: Mutex<Vec<i64>>,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<SqlRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn with_commits(commits: Vec<RetrievedCommit>) -> Self {
        Self {
            commits,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst) + self.nearest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommitStore for FakeStore {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<SqlRow>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_sql.lock().unwrap().push(sql.to_string());

        if self.panic_on_fetch {
            panic!("connection pool poisoned");
        }
        if self.fail_all {
            return Err(anyhow!("relation \"commits\" does not exist"));
        }
        Ok(self.rows.clone())
    }

    async fn nearest_commits(&self, query: &NearestQuery<'_>) -> Result<Vec<RetrievedCommit>> {
        self.nearest_calls.fetch_add(1, Ordering::SeqCst);
        self.predicates
            .lock()
            .unwrap()
            .push(query.predicate.map(str::to_string));
        self.limits.lock().unwrap().push(query.limit);

        if self.fail_all || (self.reject_predicates && query.predicate.is_some()) {
            return Err(anyhow!("syntax error at or near \"LIKE\""));
        }

        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(self.commits.iter().take(limit).cloned().collect())
    }

    async fn latest_llm_settings(&self) -> Result<Option<commitlens_engine::settings::StoredLlmSettings>> {
        Ok(None)
    }
}

/// Embedding fake returning a fixed vector, or empty to signal failure
pub struct FakeEmbedder {
    pub vector: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn working() -> Self {
        Self {
            vector: vec![0.1; 384],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            vector: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Vec<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vector.clone()
    }
}

/// Tool-call proxy fake with a canned response
pub struct FakeProxy {
    pub response: Map<String, Value>,
    pub calls: AtomicUsize,
    pub sql: Mutex<Vec<String>>,
}

impl FakeProxy {
    pub fn responding(response: Value) -> Self {
        Self {
            response: object(response),
            calls: AtomicUsize::new(0),
            sql: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::responding(serde_json::json!({"error": "MCP is disabled"}))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolCallProxy for FakeProxy {
    async fn call_tool(&self, _name: &str, _arguments: Value) -> ToolCallResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }

    async fn execute_sql(&self, sql: &str) -> ToolCallResponse {
        self.sql.lock().unwrap().push(sql.to_string());
        self.call_tool("execute_sql", serde_json::json!({ "sql": sql }))
            .await
    }
}

/// Completion fake replaying scripted responses in order
///
/// Once the script is exhausted every call fails with `EmptyResponse`.
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<llm::Result<String>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<llm::Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A planner reply followed by an answer reply
    pub fn plan_then_answer(plan: Value, answer: &str) -> Self {
        Self::new(vec![Ok(plan.to_string()), Ok(answer.to_string())])
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _settings: &LlmSettings,
        request: &CompletionRequest,
    ) -> llm::Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::EmptyResponse("script exhausted".to_string())))
    }
}

/// Settings source that always fails
pub struct BrokenSettings;

#[async_trait]
impl SettingsSource for BrokenSettings {
    async fn resolve(&self) -> Result<LlmSettings> {
        Err(anyhow!("configs table unreachable"))
    }
}

/// Test harness wiring fakes into an orchestrator
pub struct Harness {
    pub llm: Arc<ScriptedLlm>,
    pub store: Arc<FakeStore>,
    pub embedder: Arc<FakeEmbedder>,
    pub proxy: Arc<FakeProxy>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(llm: ScriptedLlm, store: FakeStore, embedder: FakeEmbedder, proxy: FakeProxy) -> Self {
        Self::with_settings(
            llm,
            store,
            embedder,
            proxy,
            Arc::new(StaticSettings::new(settings())),
        )
    }

    pub fn with_settings(
        llm: ScriptedLlm,
        store: FakeStore,
        embedder: FakeEmbedder,
        proxy: FakeProxy,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        let llm = Arc::new(llm);
        let store = Arc::new(store);
        let embedder = Arc::new(embedder);
        let proxy = Arc::new(proxy);

        let orchestrator = Orchestrator::new(
            settings,
            PlanGenerator::new(Arc::clone(&llm) as Arc<dyn CompletionProvider>, 0.1, 500),
            RetrievalExecutor::new(
                Arc::clone(&store) as Arc<dyn CommitStore>,
                Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
                Arc::clone(&proxy) as Arc<dyn ToolCallProxy>,
            ),
            AnswerSynthesizer::new(Arc::clone(&llm) as Arc<dyn CompletionProvider>, 0.3, 800),
        );

        Self {
            llm,
            store,
            embedder,
            proxy,
            orchestrator,
        }
    }
}
