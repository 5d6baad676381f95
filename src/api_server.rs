// Axum API Server Module
//
// Purpose: JSON REST API over the organism search index and the
// resistance / breakpoint / ECOFF / group joins

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use anyhow::Context;
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::data::AmrData;
use crate::query_engine::QueryEngine;
use crate::search_index::SearchIndex;

pub const DEFAULT_COMMON_LIMIT: usize = 8;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub query_engine: Arc<QueryEngine>,
    pub search_index: Arc<SearchIndex>,
    pub cache: Cache<String, serde_json::Value>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Load every table from `config.data_dir` and build the indexes
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading AMR datasets...");
        let data = AmrData::load(&config.data_dir)
            .with_context(|| format!("loading datasets from {}", config.data_dir.display()))?;

        Ok(Self::from_data(Arc::new(data), config))
    }

    /// Assemble state around an already loaded dataset
    pub fn from_data(data: Arc<AmrData>, config: ServerConfig) -> Self {
        let query_engine = Arc::new(QueryEngine::new(Arc::clone(&data)));

        tracing::info!("Building search index...");
        let search_index = Arc::new(SearchIndex::build(data));

        tracing::info!("Initializing Moka cache...");
        let cache = Cache::builder()
            .max_capacity(10_000) // 10K entries
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Self {
            query_engine,
            search_index,
            cache,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Organism search
        .route("/api/search", get(search_organisms))

        // Organism endpoints
        .route("/api/bacteria/:mo", get(get_organism))
        .route("/api/bacteria/:mo/resistance", get(get_resistance))
        .route("/api/bacteria/:mo/breakpoints", get(get_breakpoints))
        .route("/api/bacteria/:mo/ecoffs", get(get_ecoffs))
        .route("/api/bacteria/:mo/groups", get(get_groups))

        // Group endpoint
        .route("/api/groups/:group", get(get_group))

        // Dataset overview
        .route("/api/stats", get(get_stats))
        .route("/api/common", get(get_common))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    // Kept as text so a malformed limit falls back instead of rejecting
    limit: Option<String>,
}

async fn search_organisms(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let limit = state.config.clamp_limit(params.limit.as_deref());
    let query = params.q.unwrap_or_default().trim().to_lowercase();

    if query.is_empty() {
        return Ok(Json(serde_json::json!([])));
    }

    let cache_key = format!("search:{}:{}", query, limit);
    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for search {:?}", query);
        return Ok(Json(cached));
    }

    let start = std::time::Instant::now();
    let results = state.search_index.search(&query, limit);
    tracing::debug!("Search {:?} -> {} results in {:?}", query, results.len(), start.elapsed());

    let result = to_json(&results)?;
    state.cache.insert(cache_key, result.clone()).await;

    Ok(Json(result))
}

async fn get_organism(
    State(state): State<AppState>,
    Path(mo): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let detail = state
        .query_engine
        .organism_detail(&mo)
        .ok_or_else(|| AppError::NotFound(format!("Organism {} not found", mo)))?;

    Ok(Json(to_json(&detail)?))
}

async fn get_resistance(
    State(state): State<AppState>,
    Path(mo): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(to_json(&state.query_engine.resistance_for(&mo))?))
}

async fn get_breakpoints(
    State(state): State<AppState>,
    Path(mo): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(to_json(&state.query_engine.breakpoints_for(&mo))?))
}

async fn get_ecoffs(
    State(state): State<AppState>,
    Path(mo): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(to_json(&state.query_engine.ecoffs_for(&mo))?))
}

async fn get_groups(
    State(state): State<AppState>,
    Path(mo): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(to_json(&state.query_engine.groups_for(&mo))?))
}

async fn get_group(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let summary = state
        .query_engine
        .group_by_code(&group)
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group)))?;
    let members = state.query_engine.members_of(&group);

    Ok(Json(serde_json::json!({
        "group": to_json(&summary)?,
        "members": to_json(&members)?,
    })))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(to_json(&state.query_engine.stats())?))
}

#[derive(Debug, Deserialize)]
struct CommonParams {
    limit: Option<String>,
}

async fn get_common(
    State(state): State<AppState>,
    Query(params): Query<CommonParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let limit = params
        .limit
        .as_deref()
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or(DEFAULT_COMMON_LIMIT);

    Ok(Json(to_json(&state.query_engine.common_organisms(limit))?))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
