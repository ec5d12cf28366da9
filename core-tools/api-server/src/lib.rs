//! API Server
//!
//! HTTP surface for the question-answering engine. The server knows nothing
//! about planning or retrieval; it forwards questions to an [`Answerer`] and
//! maps the envelope to a status code.
//!
//! # Endpoints
//!
//! - POST /api/ai/query - Answer `{"message": "..."}`
//! - GET /api/ai/health - Liveness and feature list
//! - GET /api/ai/query-types - Supported question kinds with examples

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sdk::{Answerer, QueryRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state for handlers
#[derive(Clone)]
struct ServerState {
    answerer: Arc<dyn Answerer>,
}

/// Build the router for an answerer
pub fn router(answerer: Arc<dyn Answerer>) -> Router {
    let state = ServerState { answerer };

    Router::new()
        .route("/api/ai/query", post(query_handler))
        .route("/api/ai/health", get(health_handler))
        .route("/api/ai/query-types", get(query_types_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Serve until Ctrl-C
pub async fn serve(bind: &str, answerer: Arc<dyn Answerer>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, router(answerer))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down API server");
        })
        .await?;

    Ok(())
}

async fn query_handler(
    State(state): State<ServerState>,
    Json(request): Json<QueryRequest>,
) -> Response {
    let Some(question) = request.question() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Message cannot be empty"})),
        )
            .into_response();
    };

    let envelope = state.answerer.answer(question).await;

    let status = if envelope.error {
        tracing::warn!("Answer failed: {}", envelope.answer);
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    (status, Json(envelope)).into_response()
}

async fn health_handler(State(state): State<ServerState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.answerer.name(),
        "features": [
            "Natural language to SQL",
            "Semantic search with embeddings",
            "Hybrid search",
            "Commit retrieval by hash",
        ],
    }))
}

async fn query_types_handler() -> Json<Value> {
    Json(json!({
        "query_types": [
            {
                "type": "execute_sql",
                "description": "Statistics, counts and filters by author or date",
                "examples": [
                    "How many commits did Alice make last week?",
                    "Who made the most commits this month?",
                ],
            },
            {
                "type": "semantic_search",
                "description": "Find commits by meaning or topic",
                "examples": [
                    "Find commits about authentication",
                    "What changes were made to error handling?",
                ],
            },
            {
                "type": "retrieve_commit",
                "description": "Explain one commit by hash",
                "examples": ["What did commit abc123 change?"],
            },
            {
                "type": "hybrid_search",
                "description": "Filter by author or date, then rank by meaning",
                "examples": ["Show bug fixes by Bob from last month"],
            },
        ],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sdk::{AnswerEnvelope, SourceType};
    use tower::ServiceExt;

    struct CannedAnswerer {
        envelope: AnswerEnvelope,
    }

    #[async_trait]
    impl Answerer for CannedAnswerer {
        fn name(&self) -> &str {
            "canned"
        }

        async fn answer(&self, _question: &str) -> AnswerEnvelope {
            self.envelope.clone()
        }
    }

    fn app(envelope: AnswerEnvelope) -> Router {
        router(Arc::new(CannedAnswerer { envelope }))
    }

    fn post_query(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ai/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_envelope() {
        let app = app(AnswerEnvelope::answered("3 commits", SourceType::Sql));

        let response = app
            .oneshot(post_query(r#"{"message":"how many commits?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "3 commits");
        assert_eq!(body["source_type"], "sql");
        assert_eq!(body["error"], false);
    }

    #[tokio::test]
    async fn test_blank_message_is_bad_request() {
        let app = app(AnswerEnvelope::answered("unused", SourceType::Sql));

        let response = app.oneshot(post_query(r#"{"message":"   "}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Message cannot be empty"})
        );
    }

    #[tokio::test]
    async fn test_missing_message_is_bad_request() {
        let app = app(AnswerEnvelope::answered("unused", SourceType::Sql));
        let response = app.oneshot(post_query("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_envelope_is_server_error() {
        let app = app(AnswerEnvelope::failure("Unsupported action: dance"));

        let response = app
            .oneshot(post_query(r#"{"message":"dance for me"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["answer"], "Unsupported action: dance");
    }

    #[tokio::test]
    async fn test_health_names_service() {
        let app = app(AnswerEnvelope::failure("unused"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/ai/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "canned");
    }

    #[tokio::test]
    async fn test_query_types_lists_four_actions() {
        let app = app(AnswerEnvelope::failure("unused"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/ai/query-types")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["query_types"].as_array().map(Vec::len), Some(4));
    }
}
