// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header}
};
use llm_sql_writer::{
    config::ServerConfig,
    error::{AppResult, llm_api_error},
    llm::SqlGenerator,
    prompt::GenerationRequest,
    schema::Databases,
    server::{APP_JS_URL, AppState, GENERATE_URL, router}
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Returns a fixed reply and remembers the last request
struct StubGenerator {
    reply: Result<String, String>,
    seen:  Mutex<Option<GenerationRequest>>
}

#[async_trait]
impl SqlGenerator for StubGenerator {
    async fn generate_sql(&self, request: &GenerationRequest) -> AppResult<String> {
        *self.seen.lock().unwrap() = Some(request.clone());
        self.reply.clone().map_err(llm_api_error)
    }
}

fn stub(reply: Result<&str, &str>) -> Arc<StubGenerator> {
    Arc::new(StubGenerator {
        reply: reply.map(str::to_string).map_err(str::to_string),
        seen:  Mutex::new(None)
    })
}

fn app_with(generator: Arc<StubGenerator>, config: &ServerConfig) -> Router {
    let mut databases = Databases::new();
    databases.insert("shop", "/nonexistent/shop.db");
    router(Arc::new(AppState::new(databases, generator)), config)
}

fn app(generator: Arc<StubGenerator>) -> Router {
    app_with(generator, &ServerConfig::default())
}

fn generate_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(GENERATE_URL)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(generate_request(body.to_string()))
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_generate_returns_read_only_sql() {
    let generator = stub(Ok("select * from items limit 10"));
    let (status, body) = post_json(
        app(generator.clone()),
        json!({"db": "shop", "table": "items", "prompt": "show ten items", "history": []})
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"sql": "select * from items limit 10"}));
}

#[tokio::test]
async fn test_generate_passes_history_and_trimmed_prompt() {
    let generator = stub(Ok("SELECT 1"));
    post_json(
        app(generator.clone()),
        json!({
            "db": "shop",
            "prompt": "  now only cheap ones  ",
            "history": [
                {"role": "user", "content": "list items"},
                {"role": "assistant", "content": "SELECT * FROM items"}
            ]
        })
    )
    .await;

    let seen = generator.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.prompt, "now only cheap ones");
    assert_eq!(seen.history.len(), 2);
    assert_eq!(seen.history[1].role, "assistant");
    assert_eq!(seen.schema_text, "");
}

#[tokio::test]
async fn test_generate_rejects_delete() {
    let (status, body) = post_json(
        app(stub(Ok("delete from t"))),
        json!({"db": "shop", "prompt": "clear it"})
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Only read-only SELECT queries are allowed"));
    assert!(error.contains("delete from t"));
    assert_eq!(body["sql"], "delete from t");
}

#[tokio::test]
async fn test_generate_rejects_modifying_cte() {
    let (status, _) = post_json(
        app(stub(Ok("WITH cte AS (SELECT 1) DELETE FROM cte"))),
        json!({"db": "shop", "prompt": "x"})
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_rejects_empty_reply() {
    let (status, body) = post_json(
        app(stub(Ok("   "))),
        json!({"db": "shop", "prompt": "x"})
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Only read-only SELECT")
    );
}

#[tokio::test]
async fn test_generate_invalid_json() {
    let generator = stub(Ok("SELECT 1"));
    let response = app(generator.clone())
        .oneshot(generate_request("{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"error": "Invalid JSON"}));
    assert!(generator.seen.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_generate_missing_db() {
    let (status, body) = post_json(app(stub(Ok("SELECT 1"))), json!({"prompt": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'db'");
}

#[tokio::test]
async fn test_generate_blank_prompt() {
    let (status, body) = post_json(
        app(stub(Ok("SELECT 1"))),
        json!({"db": "shop", "prompt": "   "})
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'prompt'");
}

#[tokio::test]
async fn test_generate_unknown_database() {
    let (status, body) = post_json(
        app(stub(Ok("SELECT 1"))),
        json!({"db": "elsewhere", "prompt": "x"})
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown database 'elsewhere'");
}

#[tokio::test]
async fn test_generate_provider_failure() {
    let (status, body) = post_json(
        app(stub(Err("rate limited"))),
        json!({"db": "shop", "prompt": "x"})
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Generation failed")
    );
}

#[tokio::test]
async fn test_generate_body_too_large() {
    let config = ServerConfig {
        max_body_bytes: 16,
        ..ServerConfig::default()
    };
    let body = json!({"db": "shop", "prompt": "a rather long prompt"}).to_string();
    let response = app_with(stub(Ok("SELECT 1")), &config)
        .oneshot(generate_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_app_js_served() {
    let (status, content_type, body) = get(app(stub(Ok("SELECT 1"))), APP_JS_URL).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("application/javascript"));
    assert!(body.contains(GENERATE_URL));
}

#[tokio::test]
async fn test_table_page_injects_script() {
    let (status, _, body) = get(app(stub(Ok("SELECT 1"))), "/shop/items").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(APP_JS_URL));
    assert!(body.contains("select * from [items] limit 101"));
}

#[tokio::test]
async fn test_table_page_keeps_submitted_sql() {
    let (_, _, body) = get(
        app(stub(Ok("SELECT 1"))),
        "/shop/items?sql=select%20count(*)%20from%20items"
    )
    .await;
    assert!(body.contains("select count(*) from items"));
}

#[tokio::test]
async fn test_table_page_unknown_database() {
    let (status, ..) = get(app(stub(Ok("SELECT 1"))), "/nowhere/items").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(app(stub(Ok("SELECT 1"))), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "llm_sql_writer");
}
