//! HTTP surface.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/-/llm-sql-writer/generate` | [`handlers::generate_handler`] |
//! | GET | `/-/static-plugins/llm_sql_writer/app.js` | [`assets::app_js_handler`] |
//! | GET | `/{db}/{table}` | [`assets::table_page_handler`] |
//! | GET | `/health` | [`handlers::health_check`] |
//!
//! Every route shares one immutable [`AppState`].

pub mod assets;
pub mod handlers;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post}
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

pub use self::{
    assets::{APP_JS_URL, extra_js_urls},
    handlers::{GENERATE_URL, GenerateRequest, GenerateResponse, READ_ONLY_ERROR}
};
use crate::{
    config::ServerConfig,
    error::{AppResult, server_error},
    llm::SqlGenerator,
    schema::Databases
};

/// State shared by all handlers
pub struct AppState {
    pub databases: Databases,
    pub generator: Arc<dyn SqlGenerator>
}

impl AppState {
    pub fn new(databases: Databases, generator: Arc<dyn SqlGenerator>) -> Self {
        Self {
            databases,
            generator
        }
    }
}

/// Build the router with body-size and timeout limits applied
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(GENERATE_URL, post(handlers::generate_handler))
        .route(APP_JS_URL, get(assets::app_js_handler))
        .route("/{db}/{table}", get(assets::table_page_handler))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs
        )))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: Arc<AppState>, config: &ServerConfig) -> AppResult<()> {
    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address).await.map_err(|e| {
        server_error(format!("Failed to bind HTTP listener to {}: {}", bind_address, e))
    })?;
    log::info!(
        "Serving {} database(s) on http://{}",
        state.databases.len(),
        bind_address
    );
    for name in state.databases.names() {
        log::info!("  /{}", name);
    }

    axum::serve(listener, router(state, config))
        .await
        .map_err(|e| server_error(format!("HTTP server error: {}", e)))
}
