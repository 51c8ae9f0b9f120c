use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response}
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    guard::classify,
    prompt::{ChatMessage, GenerationRequest},
    schema::collect_schema
};

/// Route of the generation endpoint
pub const GENERATE_URL: &str = "/-/llm-sql-writer/generate";

/// Error message returned when the guard rejects generated SQL
pub const READ_ONLY_ERROR: &str = "Only read-only SELECT queries are allowed";

/// Body of `POST /-/llm-sql-writer/generate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub db:      Option<String>,
    /// Table the page was showing; informational only
    pub table:   Option<String>,
    pub prompt:  Option<String>,
    pub history: Option<Vec<ChatMessage>>
}

/// Successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub sql: String
}

/// JSON error envelope: `{"error": ..., "sql": ...}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error:  String,
    /// Rejected SQL, kept for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    sql:    Option<String>
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            sql: None
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    fn rejected(sql: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error:  format!("{} (got: {})", READ_ONLY_ERROR, sql),
            sql:    Some(sql)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(&self)).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Turn a prompt into guarded, read-only SQL.
///
/// The body is parsed by hand so that malformed JSON gets the same
/// `{"error": ...}` envelope as every other failure.
///
/// A `db` that is not registered answers 404 before the model is called.
/// A registered database whose schema cannot be read is still served, with
/// an empty schema in the prompt.
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes
) -> Result<Json<GenerateResponse>, ApiError> {
    let request: GenerateRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;

    let db = request
        .db
        .filter(|db| !db.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'db'"))?;
    let prompt = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'prompt'"))?
        .to_string();
    if !state.databases.contains(&db) {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("Unknown database '{}'", db)
        ));
    }

    log::debug!(
        "Generating SQL for {}/{}: {}",
        db,
        request.table.as_deref().unwrap_or("-"),
        prompt
    );
    let generation = GenerationRequest {
        prompt,
        schema_text: collect_schema(&state.databases, &db).await,
        history: request.history.unwrap_or_default()
    };
    let sql = state
        .generator
        .generate_sql(&generation)
        .await
        .map_err(|e| {
            log::error!("Generation for '{}' failed: {}", db, e);
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Generation failed: {}", e)
            )
        })?;

    let verdict = classify(&sql);
    if !verdict.is_read_only() {
        log::warn!("Rejected generated SQL for '{}' ({:?}): {}", db, verdict, sql);
        return Err(ApiError::rejected(sql));
    }
    Ok(Json(GenerateResponse {
        sql
    }))
}
