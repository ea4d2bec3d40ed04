//! JSON HTTP API.
//!
//! Exposes intent parsing, search and comparison over one shared
//! [`Session`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/tools/parse` | Parse free text into a query intent |
//! | `POST` | `/tools/search` | Parse and run a query |
//! | `POST` | `/tools/compare` | Run a query and compare two of its results |
//! | `POST` | `/tools/ask` | Parse and act (search or compare top two) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `acquisition_failed` (503), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use legislacion_core::{parse_intent, QueryIntent};

use crate::config::Config;
use crate::session::{Answer, CompareOutcome, SearchOutcome, Session};

type AppState = Arc<Session>;

/// Starts the HTTP server on `server.bind`.
pub async fn run_server(config: &Config, session: Arc<Session>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(session);

    println!("HTTP server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The API routes over a session.
pub fn router(session: Arc<Session>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/parse", post(handle_parse))
        .route("/tools/search", post(handle_search))
        .route("/tools/compare", post(handle_compare))
        .route("/tools/ask", post(handle_ask))
        .layer(cors)
        .with_state(session)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn acquisition_failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        code: "acquisition_failed".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map session errors to HTTP errors. Acquisition failures are typed; index
/// errors are recognised by message.
fn classify_error(err: anyhow::Error) -> AppError {
    if let Some(core) = err.downcast_ref::<legislacion_core::Error>() {
        if core.is_acquisition() {
            tracing::warn!(error = %core, "data source unavailable");
            return acquisition_failed(format!("data source unavailable: {}", core));
        }
    }

    let msg = err.to_string();
    if msg.contains("not found") || msg.contains("run a search first") {
        not_found(msg)
    } else {
        tracing::error!(error = %msg, "request failed");
        internal(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /tools/parse ============

#[derive(Deserialize)]
struct ParseRequest {
    text: String,
}

async fn handle_parse(Json(req): Json<ParseRequest>) -> Json<QueryIntent> {
    Json(parse_intent(&req.text))
}

// ============ POST /tools/search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<i64>,
}

async fn handle_search(
    State(session): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let mut intent = parse_intent(&req.query);
    if req.limit.is_some() {
        intent.limit = req.limit;
    }

    let outcome = session.search(&intent).await.map_err(classify_error)?;
    Ok(Json(outcome))
}

// ============ POST /tools/compare ============

#[derive(Deserialize)]
struct CompareRequest {
    query: String,
    a: usize,
    b: usize,
}

async fn handle_compare(
    State(session): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareOutcome>, AppError> {
    if req.a == 0 || req.b == 0 {
        return Err(bad_request("positions a and b are 1-based"));
    }

    let (_, comparison) = session
        .search_and_compare(&parse_intent(&req.query), req.a, req.b)
        .await
        .map_err(classify_error)?;
    Ok(Json(comparison))
}

// ============ POST /tools/ask ============

async fn handle_ask(
    State(session): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<Answer>, AppError> {
    let answer = session.ask(&req.text).await.map_err(classify_error)?;
    Ok(Json(answer))
}
