use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lexis_core::corpus::{corpus_from_json, load_corpus};
use lexis_core::tokenizer::normalize;
use lexis_core::{DocId, IndexError, SearchEngine, Statistics, TermInfo};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod history;

pub use history::{HistoryEntry, SearchHistory};

pub const MAX_RESULTS: usize = 50;
pub const TERMS_PER_PAGE: usize = 50;
const TOP_TERMS: usize = 10;
const SNIPPET_CHARS: usize = 200;

/// Runtime settings, usually filled from CLI flags and environment.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Corpus to index at startup; the server starts empty without one.
    pub corpus: Option<PathBuf>,
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins; any origin when unset or unparsable.
    pub cors_allow_origin: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub history: Arc<SearchHistory>,
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Boolean,
    #[default]
    Vector,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub snippet: Option<String>,
}

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default = "first_page")]
    pub page: usize,
}
fn first_page() -> usize { 1 }

#[derive(Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}
fn default_history_limit() -> usize { 5 }

#[derive(Serialize)]
pub struct TermsPage {
    pub page: usize,
    pub total_terms: usize,
    pub terms: Vec<TermInfo>,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub text: String,
    pub top_terms: Vec<(String, f64)>,
}

/// Errors returned by handlers, rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DocumentOutOfRange { .. } => ApiError::NotFound(err.to_string()),
            IndexError::InvalidDocument { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub fn build_app(config: AppConfig) -> Result<Router> {
    let engine = Arc::new(SearchEngine::new());
    if let Some(path) = &config.corpus {
        let corpus = load_corpus(path)?;
        engine.build(&corpus);
    }
    let state = AppState {
        engine,
        history: Arc::new(SearchHistory::default()),
        admin_token: config.admin_token.clone(),
    };

    let cors = match config.cors_allow_origin.as_deref() {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/history", get(history_handler))
        .route("/terms", get(terms_handler))
        .route("/terms/:term", get(term_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index", post(index_handler))
        .route("/index/clear", post(clear_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    // One snapshot per request so ranking and snippets come from the same build.
    let snapshot = state.engine.snapshot();
    let scored = match params.mode {
        SearchMode::Boolean => snapshot.search_boolean(&params.q),
        SearchMode::Vector => snapshot.search_vector(&params.q),
    };
    let total_hits = scored.len();
    let k = params.k.clamp(1, MAX_RESULTS);
    state.history.record(&params.q, params.mode, total_hits);

    let raw_terms: Vec<String> = params
        .q
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty() && !matches!(s.to_lowercase().as_str(), "and" | "or"))
        .map(|s| s.to_string())
        .collect();
    let results = scored
        .into_iter()
        .take(k)
        .map(|(doc_id, score)| {
            let snippet =
                snapshot.document(doc_id).ok().map(|text| snippet_from_text(text, &raw_terms));
            SearchHit { doc_id, score, snippet }
        })
        .collect();

    Json(SearchResponse {
        query: params.q,
        mode: params.mode,
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    })
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<Statistics> {
    Json(state.engine.statistics())
}

pub async fn history_handler(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<HistoryEntry>> {
    Json(state.history.recent(params.limit))
}

pub async fn terms_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Json<TermsPage> {
    let snapshot = state.engine.snapshot();
    let page = params.page.max(1);
    let offset = (page - 1).saturating_mul(TERMS_PER_PAGE);
    let terms = snapshot.term_page(offset, TERMS_PER_PAGE);
    Json(TermsPage { page, total_terms: snapshot.index().num_terms(), terms })
}

/// Accepts either an index term or a raw word, which is normalized to its
/// first stem when it is not itself indexed.
pub async fn term_handler(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<TermInfo>, ApiError> {
    let snapshot = state.engine.snapshot();
    snapshot
        .inspect_term(&term)
        .or_else(|| normalize(&term).first().and_then(|stem| snapshot.inspect_term(stem)))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("term {term:?} is not in the index")))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<DocResponse>, ApiError> {
    let snapshot = state.engine.snapshot();
    let text = snapshot.document(doc_id)?.to_string();
    let top_terms = snapshot.top_terms(doc_id, TOP_TERMS)?;
    Ok(Json(DocResponse { doc_id, text, top_terms }))
}

/// Replace the whole index with the posted corpus.
async fn index_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Statistics>, ApiError> {
    authorize(&state, &headers)?;
    let corpus = corpus_from_json(&body)?;
    let engine = Arc::clone(&state.engine);
    let stats = tokio::task::spawn_blocking(move || {
        engine.build(&corpus);
        engine.statistics()
    })
    .await
    .map_err(|e| ApiError::Internal(format!("index build failed: {e}")))?;
    Ok(Json(stats))
}

async fn clear_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Statistics>, ApiError> {
    authorize(&state, &headers)?;
    state.engine.clear();
    Ok(Json(state.engine.statistics()))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(ApiError::Unauthorized("ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("invalid admin token".into()))
    }
}

/// Up to `SNIPPET_CHARS` characters around the first query word found, with
/// every query word wrapped in `<em>`.
pub fn snippet_from_text(text: &str, raw_terms: &[String]) -> String {
    let lowered = text.to_lowercase();
    let first_char = raw_terms
        .iter()
        .filter_map(|t| lowered.find(&t.to_lowercase()))
        .min()
        .filter(|_| lowered.len() == text.len())
        .and_then(|byte| text.get(..byte))
        .map(|prefix| prefix.chars().count())
        .unwrap_or(0);
    let start = first_char.saturating_sub(SNIPPET_CHARS / 2);
    let snippet: String = text.chars().skip(start).take(SNIPPET_CHARS).collect();
    highlight_terms(&snippet, raw_terms)
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut s = snippet.to_string();
    for t in terms {
        if t.trim().is_empty() { continue; }
        let Ok(pat) = regex::RegexBuilder::new(&regex::escape(t)).case_insensitive(true).build()
        else {
            continue;
        };
        s = pat
            .replace_all(&s, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0]))
            .to_string();
    }
    s
}
