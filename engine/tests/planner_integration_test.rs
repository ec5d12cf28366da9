//! Integration tests for the query planner
//!
//! Drives `PlanGenerator` through the real OpenAI-compatible client against
//! a mock completion endpoint.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use commitlens_engine::llm::openai::OpenAICompatibleProvider;
use commitlens_engine::planner::{ActionPlan, PlanGenerator};
use commitlens_engine::settings::LlmSettings;

fn settings(server: &MockServer) -> LlmSettings {
    LlmSettings {
        completions_url: format!("{}/v1/chat/completions", server.uri()),
        model: "planner-model".to_string(),
        api_key: "sk-test".to_string(),
    }
}

fn planner() -> PlanGenerator {
    let provider = OpenAICompatibleProvider::new(Duration::from_secs(5)).unwrap();
    PlanGenerator::new(Arc::new(provider), 0.1, 500)
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_planner_sends_low_temperature_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "planner-model",
            "temperature": 0.1,
            "max_tokens": 500
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"action":"execute_sql","sql":"SELECT COUNT(*) FROM commit"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let plan = planner()
        .plan(&settings(&server), "How many commits are there?")
        .await;

    assert_eq!(
        plan,
        ActionPlan::ExecuteSql {
            sql: Some("SELECT COUNT(*) FROM commit".to_string())
        }
    );
}

#[tokio::test]
async fn test_planner_prompt_contains_question_and_system_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"action":"semantic_search","query":"login"}"#,
        )))
        .mount(&server)
        .await;

    planner().plan(&settings(&server), "find login work").await;

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();

    assert_eq!(messages[0]["role"], "system");
    assert_eq!(
        messages[0]["content"],
        "You are a database query assistant. Respond ONLY with valid JSON."
    );
    assert_eq!(messages[1]["role"], "user");
    assert!(messages[1]["content"]
        .as_str()
        .unwrap()
        .contains("User question: find login work"));
}

#[tokio::test]
async fn test_planner_strips_code_fences() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"action\":\"retrieve_commit\",\"commit_hash\":\"abc123\"}\n```",
        )))
        .mount(&server)
        .await;

    let plan = planner().plan(&settings(&server), "show abc123").await;

    assert_eq!(
        plan,
        ActionPlan::RetrieveCommit {
            commit_hash: Some("abc123".to_string())
        }
    );
}

#[tokio::test]
async fn test_planner_falls_back_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let plan = planner().plan(&settings(&server), "auth changes").await;

    assert_eq!(plan, ActionPlan::fallback("auth changes"));
}

#[tokio::test]
async fn test_planner_falls_back_on_missing_action() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(r#"{"sql":"SELECT 1"}"#)),
        )
        .mount(&server)
        .await;

    let plan = planner().plan(&settings(&server), "something").await;

    assert_eq!(plan, ActionPlan::fallback("something"));
}

#[tokio::test]
async fn test_planner_falls_back_on_prose_and_empty_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Sure! Let me search for that.")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let planner = planner();
    let settings = settings(&server);

    assert_eq!(planner.plan(&settings, "q1").await, ActionPlan::fallback("q1"));
    assert_eq!(planner.plan(&settings, "q2").await, ActionPlan::fallback("q2"));
}

#[tokio::test]
async fn test_planner_keeps_unknown_action() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(r#"{"action":"drop_table"}"#)),
        )
        .mount(&server)
        .await;

    let plan = planner().plan(&settings(&server), "q").await;

    assert_eq!(
        plan,
        ActionPlan::Unsupported {
            action: "drop_table".to_string()
        }
    );
}
