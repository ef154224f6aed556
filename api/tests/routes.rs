use std::sync::Arc;
use std::time::Duration;

use ai_llm_service::ChatReply;
use api::{AppState, router};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use conversation_log::ConversationLog;
use rag_store::testing::KeywordEmbedder;
use rag_store::{
    Chunk, ChunkMetadata, Embedder, InMemoryIndex, IndexingOptions, RagConfig, Retriever,
    UnconfiguredEmbedder,
};
use responder::testing::{ScriptedModel, Step};
use responder::{LanguageModel, Responder, ResponderConfig};
use serde_json::{Value, json};
use tower::ServiceExt;

const VOCAB: &[&str] = &["react", "skills", "component", "aws", "deployment", "experience", "project", "dashboard"];

fn corpus() -> Vec<Chunk> {
    [
        ("skills:react", "skills", "React skills and component design."),
        ("experience:aws", "experience", "AWS deployment experience at Northwind."),
        ("projects:x", "projects", "Project X analytics dashboard."),
    ]
    .into_iter()
    .map(|(id, category, content)| Chunk {
        id: id.into(),
        content: content.into(),
        metadata: ChunkMetadata::new(category, "doc"),
    })
    .collect()
}

fn indexing() -> IndexingOptions {
    IndexingOptions {
        delay: Duration::ZERO,
        ..IndexingOptions::default()
    }
}

fn app_with(embedder: Arc<dyn Embedder>, model: Option<Arc<dyn LanguageModel>>) -> Router {
    let retriever = Retriever::new(Arc::new(InMemoryIndex::new()), embedder, RagConfig::default());
    let responder = Responder::new(
        retriever,
        model,
        Arc::new(ConversationLog::new()),
        ResponderConfig::default().with_persona("Jordan Avery", "Full-Stack Engineer"),
    );
    router(Arc::new(AppState::new(responder, corpus(), indexing(), None)))
}

fn app() -> Router {
    app_with(Arc::new(KeywordEmbedder::new(VOCAB)), None)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn chat_requires_a_question() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Query or messages are required");

    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({ "query": "x".repeat(1001) }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["details"], "Please enter a question between 1 and 1000 characters");

    let (status, _) = send(&app, "POST", "/api/chat", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn initialize_is_idempotent_and_chat_uses_the_corpus() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/initialize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["indexed"], 3);
    assert_eq!(body["total"], 3);

    let (_, again) = send(&app, "POST", "/api/initialize", Some(json!({}))).await;
    assert_eq!(again["skipped"], true);
    assert_eq!(again["count"], 3);

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "query": "What AWS experience exists?", "sessionId": "s-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!body["response"].as_str().unwrap().is_empty());
    assert_eq!(body["sources"][0]["id"], "experience:aws");
    assert!(body["sources"][0]["relevanceScore"].as_f64().unwrap() > 0.5);
    assert_eq!(body["metadata"]["model"], "rule-based");
    assert_eq!(body["metadata"]["sessionId"], "s-1");

    let (_, logs) = send(&app, "GET", "/api/logs?limit=5", None).await;
    assert_eq!(logs["count"], 1);
    assert_eq!(logs["logs"][0]["status"], "answered");
    let (_, stats) = send(&app, "GET", "/api/logs/stats", None).await;
    assert_eq!(stats["stats"]["total"], 1);
}

#[tokio::test]
async fn initialize_with_documents_and_force_replaces_the_corpus() {
    let app = app();
    send(&app, "POST", "/api/initialize", None).await;

    let docs = json!({
        "force": true,
        "documents": [{ "content": "React component library", "metadata": { "category": "skills" } }]
    });
    let (status, body) = send(&app, "POST", "/api/initialize", Some(docs)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["indexed"], 1);
    assert_eq!(body["count"], 1);

    let (status, body) = send(&app, "POST", "/api/initialize", Some(json!({ "documents": [{ "content": "  " }] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn initialize_without_embedding_provider_is_a_bad_request() {
    let app = app_with(Arc::new(UnconfiguredEmbedder::new("EMBEDDING_MODEL is not set")), None);
    let (status, body) = send(&app, "POST", "/api/initialize", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFIG_ERROR");
    assert!(body["details"].as_str().unwrap().contains("EMBEDDING_MODEL"));
}

#[tokio::test]
async fn chat_with_model_returns_its_answer() {
    let model = Arc::new(ScriptedModel::new(vec![Step::Reply(ChatReply::text("Hi! I'm Jordan."))]));
    let app = app_with(Arc::new(KeywordEmbedder::new(VOCAB)), Some(model));
    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "messages": [{ "role": "user", "content": "hello" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Hi! I'm Jordan.");
    assert_eq!(body["metadata"]["model"], "scripted");
    assert_eq!(body["metadata"]["status"], "answered");
}

#[tokio::test]
async fn search_reset_and_request_ids() {
    let app = app();
    send(&app, "POST", "/api/initialize", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/search",
        Some(json!({ "query": "react skills component", "minScore": 0.5, "filter": { "category": "skills" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], "skills:react");

    let (_, body) = send(&app, "POST", "/api/reset", None).await;
    assert_eq!(body["removed"], 3);
    let (_, health) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(health["index"]["count"], 0);
    assert_eq!(health["backend"], "memory");

    let req = Request::builder()
        .uri("/api/suggestions")
        .header("X-Request-Id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    let res = app
        .oneshot(Request::builder().uri("/api/suggestions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(res.headers()["x-request-id"].to_str().unwrap().starts_with("req-"));
}
