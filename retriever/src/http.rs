use crate::{Hit, Retriever};
use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use search_core::{DocId, SearchError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub parsed: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<Hit>,
}

pub struct AppConfig {
    pub index_path: PathBuf,
    pub admin_token: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub index_path: PathBuf,
    /// Swapped wholesale on reload; readers clone the inner `Arc` and drop the lock.
    pub retriever: Arc<RwLock<Arc<Retriever>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    fn current(&self) -> Arc<Retriever> {
        self.retriever.read().clone()
    }
}

fn api_error(status: StatusCode, msg: impl ToString) -> ApiError {
    (status, Json(json!({ "error": msg.to_string() })))
}

/// Load the index at `index_path` and build the router. `ADMIN_TOKEN` guards reloads.
pub fn build_app(index_path: impl Into<PathBuf>) -> Result<Router> {
    build_app_with(AppConfig { index_path: index_path.into(), admin_token: std::env::var("ADMIN_TOKEN").ok() })
}

pub fn build_app_with(config: AppConfig) -> Result<Router> {
    let retriever = Retriever::open(&config.index_path)?;
    let state = AppState {
        index_path: config.index_path,
        retriever: Arc::new(RwLock::new(Arc::new(retriever))),
        admin_token: config.admin_token,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let retriever = state.current();
    let expr = retriever.parse(&params.q).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let doc_ids = retriever.evaluate(&expr);

    let k = params.k.clamp(1, 100);
    let total_hits = doc_ids.len();
    let results = retriever.resolve(&doc_ids[..k.min(total_hits)]);

    Ok(Json(SearchResponse {
        query: params.q,
        parsed: expr.to_string(),
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<Hit>, ApiError> {
    state
        .current()
        .resolve(&[doc_id])
        .pop()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("document {doc_id} not found")))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&state, &headers)?;
    let path = state.index_path.clone();
    let loaded = tokio::task::spawn_blocking(move || Retriever::open(path))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    let retriever = match loaded {
        Ok(r) => r,
        Err(e @ SearchError::CorruptIndex(_)) => return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e)),
        Err(e) => return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e)),
    };
    let num_docs = retriever.index().doc_count();
    *state.retriever.write() = Arc::new(retriever);
    tracing::info!(path = %state.index_path.display(), num_docs, "index reloaded");
    Ok(Json(json!({ "reloaded": true, "num_docs": num_docs })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
