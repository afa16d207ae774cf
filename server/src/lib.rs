use anyhow::{Context, Result};
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use search_core::persist::{load_meta, load_snapshot, meta_path};
use search_core::registry::{excerpt_file, read_lossy};
use search_core::{EngineConfig, SearchEngine, SearchMode, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

const OPERATOR_WORDS: [&str; 3] = ["and", "or", "not"];

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_mode() -> String { "simple".to_string() }
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    #[serde(flatten)]
    pub result: SearchResult,
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub snippet: Option<String>,
}

pub struct ServerConfig {
    pub snapshot: PathBuf,
    pub docs: PathBuf,
    pub engine: EngineConfig,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<SearchEngine>>,
    pub snapshot: PathBuf,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": msg.into() })))
}

/// Load the snapshot and document registry, then build the router. A bad snapshot aborts startup.
pub fn build_app(config: ServerConfig) -> Result<Router> {
    let mut engine = SearchEngine::new(config.engine);
    engine
        .load_snapshot(&config.snapshot)
        .with_context(|| format!("loading snapshot {}", config.snapshot.display()))?;
    engine
        .register_documents(&config.docs)
        .with_context(|| format!("scanning documents {}", config.docs.display()))?;
    match load_meta(&meta_path(&config.snapshot)) {
        Ok(meta) => tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, created_at = %meta.created_at, "snapshot metadata"),
        Err(err) => tracing::debug!(error = %err, "no snapshot metadata"),
    }

    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { engine: Arc::new(RwLock::new(engine)), snapshot: config.snapshot, admin_token };
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let mode: SearchMode = params
        .mode
        .parse()
        .map_err(|err: search_core::SearchError| api_error(StatusCode::BAD_REQUEST, err.to_string()))?;
    let k = params.k.clamp(1, 100);

    // Only in-memory work under the read lock; files are read after it is released.
    let (result, targets, max_chars) = {
        let engine = state.engine.read();
        let result = engine.search_with(mode, &params.q);
        let targets: Vec<(String, Option<PathBuf>)> = result
            .matched_ids
            .iter()
            .take(k)
            .map(|doc_id| (doc_id.clone(), engine.registry().path(doc_id).map(|p| p.to_path_buf())))
            .collect();
        (result, targets, engine.config().excerpt_chars)
    };

    let raw_terms: Vec<String> = params
        .q
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|s| !s.is_empty())
        .filter(|s| mode == SearchMode::Simple || !OPERATOR_WORDS.iter().any(|op| s.eq_ignore_ascii_case(op)))
        .map(|s| s.to_string())
        .collect();
    let hits = tokio::task::spawn_blocking(move || build_hits(targets, max_chars, &raw_terms))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "excerpt task failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "excerpt task failed")
        })?;

    let total_hits = result.matched_ids.len();
    Ok(Json(SearchResponse { query: params.q, mode, result, total_hits, hits }))
}

fn build_hits(targets: Vec<(String, Option<PathBuf>)>, max_chars: usize, raw_terms: &[String]) -> Vec<SearchHit> {
    targets
        .into_iter()
        .map(|(doc_id, path)| {
            let snippet = path.and_then(|p| match excerpt_file(&p, max_chars) {
                Ok(text) => Some(highlight_terms(&text, raw_terms)),
                Err(err) => {
                    tracing::warn!(doc_id = %doc_id, error = %err, "excerpt unavailable");
                    None
                }
            });
            SearchHit { doc_id, snippet }
        })
        .collect()
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let path = state
        .engine
        .read()
        .registry()
        .path(&doc_id)
        .map(|p| p.to_path_buf())
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not found"))?;
    let text = tokio::task::spawn_blocking(move || read_lossy(&path))
        .await
        .map_err(|err| api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    match text {
        Ok(text) => Ok(Json(serde_json::json!({ "doc_id": doc_id, "text": text }))),
        Err(err) => {
            tracing::warn!(doc_id = %doc_id, error = %err, "document unreadable");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "document unreadable"))
        }
    }
}

/// Reload the snapshot from disk. The current index keeps serving if the load fails.
async fn reload_handler(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let index = load_snapshot(&state.snapshot).map_err(|err| {
        tracing::error!(error = %err, snapshot = %state.snapshot.display(), "snapshot reload failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })?;
    let (num_docs, num_terms) = (index.num_docs(), index.num_terms());
    state.engine.write().replace_index(index);
    tracing::info!(num_docs, num_terms, "snapshot reloaded");
    Ok(Json(serde_json::json!({ "num_docs": num_docs, "num_terms": num_terms })))
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut s = snippet.to_string();
    for t in terms {
        if t.trim().is_empty() { continue; }
        let Ok(pat) = regex::RegexBuilder::new(&regex::escape(t)).case_insensitive(true).build() else { continue };
        s = pat.replace_all(&s, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).to_string();
    }
    s
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), ApiError> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_case_insensitively() {
        let out = highlight_terms("Rust and rust", &["RUST".to_string()]);
        assert_eq!(out, "<em>Rust</em> and <em>rust</em>");
    }

    #[test]
    fn hits_read_files_and_tolerate_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "Rust everywhere").unwrap();
        let targets = vec![
            ("a".to_string(), Some(path)),
            ("gone".to_string(), Some(dir.path().join("gone.txt"))),
            ("unregistered".to_string(), None),
        ];
        let hits = build_hits(targets, 4, &["rust".to_string()]);
        assert_eq!(hits[0].snippet.as_deref(), Some("<em>Rust</em>..."));
        assert!(hits[1].snippet.is_none());
        assert!(hits[2].snippet.is_none());
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert_eq!(highlight_terms("a+b", &["a+b".to_string()]), "<em>a+b</em>");
    }
}
