//! Feed control API.
//!
//! - GET /v1/feed
//! - GET /v1/feed/stream
//! - POST /v1/feed/page/{page}
//! - POST /v1/feed/refresh
//! - PUT /v1/feed/endpoint
//! - GET /v1/cache/stats
//! - DELETE /v1/cache
//! - GET /metrics
//! - GET /health

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::store::CacheStats;
use crate::config::Config;
use crate::fetch::coordinator::{Lane, LaneStats};
use crate::fetch::source::PageSource;
use crate::metrics;
use crate::paginator::{Paginator, PaginatorState, Phase};
use crate::server::streaming::state_to_sse_stream;

/// Application state shared across handlers.
pub struct AppState<S: PageSource> {
    pub paginator: Paginator<S>,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

/// Build the axum router with all API routes.
pub fn build_router<S>(state: Arc<AppState<S>>) -> Router
where
    S: PageSource,
    S::Item: Serialize,
{
    Router::new()
        .route("/v1/feed", get(feed_state::<S>))
        .route("/v1/feed/stream", get(feed_stream::<S>))
        .route("/v1/feed/page/{page}", post(go_to_page::<S>))
        .route("/v1/feed/refresh", post(refresh::<S>))
        .route("/v1/feed/endpoint", put(set_endpoint::<S>))
        .route("/v1/cache/stats", get(cache_stats::<S>))
        .route("/v1/cache", delete(clear_cache::<S>))
        .route("/metrics", get(prometheus_metrics::<S>))
        .route("/health", get(health::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct NavigationResponse<T> {
    /// False when the request was a no-op (same page, out of range, same endpoint).
    pub accepted: bool,
    pub state: PaginatorState<T>,
}

#[derive(Debug, Deserialize)]
pub struct EndpointRequest {
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub cache: CacheStats,
    pub hit_ratio: f64,
    pub foreground: LaneStats,
    pub background: LaneStats,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub endpoint: String,
    pub phase: Phase,
}

// ─── Handlers ──────────────────────────────────────────────────────────────

async fn feed_state<S>(State(state): State<Arc<AppState<S>>>) -> Json<PaginatorState<S::Item>>
where
    S: PageSource,
    S::Item: Serialize,
{
    Json(state.paginator.state())
}

async fn feed_stream<S>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse
where
    S: PageSource,
    S::Item: Serialize,
{
    let stream = state_to_sse_stream(state.paginator.subscribe());
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn go_to_page<S>(
    State(state): State<Arc<AppState<S>>>,
    Path(page): Path<u32>,
) -> Json<NavigationResponse<S::Item>>
where
    S: PageSource,
    S::Item: Serialize,
{
    let accepted = state.paginator.go_to_page(page);
    Json(NavigationResponse {
        accepted,
        state: state.paginator.state(),
    })
}

async fn refresh<S>(State(state): State<Arc<AppState<S>>>) -> (StatusCode, Json<PaginatorState<S::Item>>)
where
    S: PageSource,
    S::Item: Serialize,
{
    state.paginator.refresh();
    (StatusCode::ACCEPTED, Json(state.paginator.state()))
}

async fn set_endpoint<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<EndpointRequest>,
) -> Result<Json<NavigationResponse<S::Item>>, StatusCode>
where
    S: PageSource,
    S::Item: Serialize,
{
    if !req.endpoint.starts_with('/') {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let accepted = state.paginator.set_endpoint(req.endpoint);
    Ok(Json(NavigationResponse {
        accepted,
        state: state.paginator.state(),
    }))
}

async fn cache_stats<S: PageSource>(State(state): State<Arc<AppState<S>>>) -> Json<CacheStatsResponse> {
    let cache = state.paginator.cache_stats();
    Json(CacheStatsResponse {
        hit_ratio: cache.hit_ratio(),
        cache,
        foreground: state.paginator.lane_stats(Lane::Foreground),
        background: state.paginator.lane_stats(Lane::Background),
    })
}

async fn clear_cache<S: PageSource>(State(state): State<Arc<AppState<S>>>) -> StatusCode {
    state.paginator.clear_cache();
    info!("Page cache cleared");
    StatusCode::NO_CONTENT
}

async fn prometheus_metrics<S: PageSource>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, StatusCode> {
    let lanes = [
        (Lane::Foreground, state.paginator.lane_stats(Lane::Foreground)),
        (Lane::Background, state.paginator.lane_stats(Lane::Background)),
    ];
    let text = metrics::render(&state.paginator.cache_stats(), &lanes).map_err(|e| {
        warn!(error = %e, "Failed to render metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}

async fn health<S: PageSource>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        endpoint: state.paginator.endpoint(),
        phase: state.paginator.state().phase(),
    })
}
