//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::info;

use crate::cache::CacheStore;
use crate::error::AdminError;
use crate::models::{EntriesResponse, EvictRequest, EvictResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// Holds the same cache store the proxy workers use.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache store
    pub cache: Arc<CacheStore>,
}

impl AppState {
    /// Creates a new AppState around a shared cache store.
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /entries
///
/// Lists cached objects from most to least recently used.
pub async fn entries_handler(State(state): State<AppState>) -> Json<EntriesResponse> {
    Json(EntriesResponse::new(state.cache.entries()))
}

/// Handler for DELETE /entries
///
/// Evicts from the LRU end. Eviction may block on in-flight readers, so it
/// runs on the blocking pool.
pub async fn evict_handler(
    State(state): State<AppState>,
    Query(req): Query<EvictRequest>,
) -> Result<Json<EvictResponse>, AdminError> {
    if let Some(error_msg) = req.validate() {
        return Err(AdminError::InvalidRequest(error_msg));
    }

    let cache = Arc::clone(&state.cache);
    let freed = tokio::task::spawn_blocking(move || {
        let requested = req.bytes.unwrap_or_else(|| cache.total_size());
        cache.evict(requested)
    })
    .await
    .map_err(|e| AdminError::Internal(e.to_string()))?;

    info!(freed, "admin eviction completed");
    Ok(Json(EvictResponse::new(freed)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
