pub mod common;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use common::{ErrorBody, HealthStatus};
use dashboard_core::{
    CacheError, EntryStatus, MetricBundle, MetricsCache, ADMISSION, REINCARCERATION, REVOCATION,
};
use dashboard_stats::{exporters::PrometheusExporter, CacheStatsCollector};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    cache: MetricsCache,
    stats: CacheStatsCollector,
    start_time: Instant,
}

impl AppState {
    pub fn new(cache: MetricsCache, stats: CacheStatsCollector) -> Self {
        Self {
            cache,
            stats,
            start_time: Instant::now(),
        }
    }

    pub fn cache(&self) -> &MetricsCache {
        &self.cache
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStatusResponse {
    pub bucket: String,
    pub ttl_seconds: u64,
    pub store: String,
    pub entries: Vec<EntryStatus>,
}

/// Maps cache failures onto HTTP responses.
pub struct ApiError(CacheError);

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CacheError::Configuration(_) => StatusCode::NOT_FOUND,
            CacheError::Fetch { .. } | CacheError::Decode { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        .route("/api/cache/status", get(cache_status))
        .route("/api/metrics/:metric_type", get(metrics_by_type))
        .route("/api/admissions", get(admission_metrics))
        .route("/api/reincarcerations", get(reincarceration_metrics))
        .route("/api/revocations", get(revocation_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API until `shutdown` is cancelled.
pub async fn serve(state: AppState, addr: SocketAddr, shutdown: CancellationToken) -> anyhow::Result<()> {
    let app = router(state);

    info!("Starting dashboard API on {}", addr);
    info!("Endpoints:");
    info!("  GET  /health                     - Health check");
    info!("  GET  /metrics                    - Prometheus metrics");
    info!("  GET  /api/cache/status           - Cache entry status");
    info!("  GET  /api/metrics/:metric_type   - Metrics bundle by type");
    info!("  GET  /api/admissions             - Admission metrics");
    info!("  GET  /api/reincarcerations       - Reincarceration metrics");
    info!("  GET  /api/revocations            - Revocation metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Dashboard API stopped");
    Ok(())
}

async fn serve_bundle(state: &AppState, metric_type: &str) -> Result<Json<MetricBundle>, ApiError> {
    Ok(Json(state.cache.fetch_metrics(metric_type).await?))
}

async fn metrics_by_type(
    State(state): State<AppState>,
    Path(metric_type): Path<String>,
) -> Result<Json<MetricBundle>, ApiError> {
    serve_bundle(&state, &metric_type).await
}

async fn admission_metrics(State(state): State<AppState>) -> Result<Json<MetricBundle>, ApiError> {
    serve_bundle(&state, ADMISSION).await
}

async fn reincarceration_metrics(
    State(state): State<AppState>,
) -> Result<Json<MetricBundle>, ApiError> {
    serve_bundle(&state, REINCARCERATION).await
}

async fn revocation_metrics(State(state): State<AppState>) -> Result<Json<MetricBundle>, ApiError> {
    serve_bundle(&state, REVOCATION).await
}

async fn cache_status(State(state): State<AppState>) -> Json<CacheStatusResponse> {
    let settings = state.cache.settings();
    Json(CacheStatusResponse {
        bucket: settings.bucket.clone(),
        ttl_seconds: settings.ttl.as_secs(),
        store: state.cache.store_name().to_string(),
        entries: state.cache.status().await,
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::healthy(
        state.start_time.elapsed().as_secs(),
        state.cache.store_name(),
    ))
}

async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match PrometheusExporter::format(state.stats.metrics()) {
        Ok(body) => (
            [(header::CONTENT_TYPE, PrometheusExporter::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode Prometheus metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
