//! HTTP surface over the batch pipeline.
//!
//! Endpoints:
//!   POST /api/query        → run a batch, returns a shaped response
//!   GET  /api/tables       → user table names
//!   GET  /api/tables/:name → column list + first rows of one table
//!   GET  /api/health       → liveness probe
pub mod auth;
pub mod cors;

use anyhow::Context;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::db::TableDescription;
use crate::error::RunnerError;
use crate::pipeline::{Pipeline, ShapedResponse};
use auth::Principal;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub allow_unauth: bool,
}

impl AppState {
    pub fn new(pipeline: Pipeline, allow_unauth: bool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            allow_unauth,
        }
    }
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/query", post(execute_query))
        .route("/api/tables", get(list_tables))
        .route("/api/tables/:name", get(table_info))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::inspect_bearer,
        ))
        .layer(cors::cors_layer(allowed_origins))
        .with_state(state)
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config.pipeline(), config.allow_unauth);
    let app = router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(
        addr = %config.bind,
        db = %config.db_path.display(),
        split_mode = %config.split_mode,
        "sqlrunner listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

// --- Errors ---

/// Error body: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, err: RunnerError) -> Self {
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

/// Run blocking SQLite work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, RunnerError>
where
    F: FnOnce() -> Result<T, RunnerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RunnerError::Task(e.to_string()))?
}

// --- Handlers ---

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct QueryIn {
    query: String,
}

// POST /api/query
async fn execute_query(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<QueryIn>,
) -> Result<Json<ShapedResponse>, ApiError> {
    debug!(principal = principal.label(), "query submitted");
    let pipeline = state.pipeline.clone();
    blocking(move || pipeline.run_batch(&payload.query))
        .await
        .map(Json)
        .map_err(|err| match err {
            RunnerError::Task(_) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err),
            other => ApiError::new(StatusCode::BAD_REQUEST, other),
        })
}

// GET /api/tables
async fn list_tables(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let pipeline = state.pipeline.clone();
    let tables = blocking(move || pipeline.list_tables())
        .await
        .map_err(|err| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err))?;
    Ok(Json(serde_json::json!({ "tables": tables })))
}

// GET /api/tables/:name
async fn table_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TableDescription>, ApiError> {
    let pipeline = state.pipeline.clone();
    blocking(move || pipeline.describe_table(&name))
        .await
        .map(Json)
        .map_err(|err| match err {
            RunnerError::TableNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err),
            RunnerError::Task(_) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err),
            other => ApiError::new(StatusCode::BAD_REQUEST, other),
        })
}
