use crate::{StatsError, StatsSnapshot, SymbolRegistry};
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, Router},
};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
/// Service layer with Tokio stack integration using Axum
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};
use tracing::{error, info};

/// Maximum number of values accepted in one batch
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Maximum request body size (1MB)
const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Default request timeout (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum concurrent requests
const MAX_CONCURRENT_REQUESTS: usize = 1000;

/// Service metrics
static SERVICE_METRICS: Lazy<ServiceMetrics> = Lazy::new(ServiceMetrics::new);

/// HTTP facade over a shared [`SymbolRegistry`]
#[derive(Clone)]
pub struct StatsService {
    registry: Arc<SymbolRegistry>,
    start_time: std::time::Instant,
}

/// Body of `POST /add_batch`
#[derive(Debug, Serialize, Deserialize)]
pub struct AddBatchRequest {
    /// Symbol the batch belongs to
    pub symbol: String,
    /// Observations in arrival order
    pub values: Vec<f64>,
}

/// Success response for `POST /add_batch`
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Always `"success"` for a 201 response
    pub status: String,
    /// Human-readable confirmation
    pub message: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// What went wrong
    pub detail: String,
}

/// Response for `GET /health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process is serving
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the service started
    pub uptime_seconds: u64,
}

/// Response for `GET /metrics`
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    /// Symbols registered so far
    pub symbols_registered: usize,
    /// Total requests handled
    pub requests_total: u64,
    /// Requests that failed validation or the registry call
    pub requests_failed: u64,
    /// Batches accepted
    pub batches_ingested: u64,
    /// Individual values accepted
    pub values_ingested: u64,
    /// Mean ingest latency over recent batches, in microseconds
    pub avg_ingest_time_us: f64,
}

/// Service-specific metrics
struct ServiceMetrics {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    batches_ingested: AtomicU64,
    values_ingested: AtomicU64,
    ingest_durations: RwLock<Vec<Duration>>,
}

impl ServiceMetrics {
    fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            batches_ingested: AtomicU64::new(0),
            values_ingested: AtomicU64::new(0),
            ingest_durations: RwLock::new(Vec::with_capacity(1000)),
        }
    }

    fn record_request(&self, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_ingest(&self, duration: Duration, values: u64) {
        self.batches_ingested.fetch_add(1, Ordering::Relaxed);
        self.values_ingested.fetch_add(values, Ordering::Relaxed);

        let mut durations = self.ingest_durations.write();
        // Keep only last 1000 samples to prevent unbounded growth
        if durations.len() >= 1000 {
            durations.remove(0);
        }
        durations.push(duration);
    }

    fn avg_ingest_time_us(&self) -> f64 {
        let durations = self.ingest_durations.read();
        if durations.is_empty() {
            return 0.0;
        }
        let sum: Duration = durations.iter().sum();
        sum.as_micros() as f64 / durations.len() as f64
    }
}

impl StatsService {
    /// Wrap a registry in the HTTP service.
    pub fn new(registry: Arc<SymbolRegistry>) -> Self {
        Self {
            registry,
            start_time: std::time::Instant::now(),
        }
    }

    /// Build the router with all endpoints and middleware layers.
    pub fn router(&self) -> Router {
        let app = Router::new()
            .route("/health", get(Self::health_handler))
            .route("/metrics", get(Self::metrics_handler))
            .route("/add_batch", post(Self::add_batch_handler))
            .route("/stats/{symbol}/{k}", get(Self::stats_handler))
            .with_state(self.clone());

        // Apply middleware layers
        app.layer(DefaultBodyLimit::max(MAX_REQUEST_SIZE))
            .layer(TimeoutLayer::new(DEFAULT_TIMEOUT))
            .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
            .layer(CorsLayer::permissive())
    }

    async fn health_handler(State(service): State<StatsService>) -> Json<HealthResponse> {
        let uptime = service.start_time.elapsed().as_secs();
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
        })
    }

    async fn metrics_handler(State(service): State<StatsService>) -> Json<MetricsResponse> {
        Json(MetricsResponse {
            symbols_registered: service.registry.symbol_count(),
            requests_total: SERVICE_METRICS.requests_total.load(Ordering::Relaxed),
            requests_failed: SERVICE_METRICS.requests_failed.load(Ordering::Relaxed),
            batches_ingested: SERVICE_METRICS.batches_ingested.load(Ordering::Relaxed),
            values_ingested: SERVICE_METRICS.values_ingested.load(Ordering::Relaxed),
            avg_ingest_time_us: SERVICE_METRICS.avg_ingest_time_us(),
        })
    }

    async fn add_batch_handler(
        State(service): State<StatsService>,
        Json(request): Json<AddBatchRequest>,
    ) -> Result<(StatusCode, Json<BatchResponse>), (StatusCode, Json<ErrorResponse>)> {
        if let Err(detail) = validate_batch(&request) {
            SERVICE_METRICS.record_request(false);
            return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { detail })));
        }

        let start = std::time::Instant::now();
        match service.registry.ingest(&request.symbol, &request.values) {
            Ok(()) => {
                SERVICE_METRICS.record_request(true);
                SERVICE_METRICS.record_ingest(start.elapsed(), request.values.len() as u64);
                Ok((
                    StatusCode::CREATED,
                    Json(BatchResponse {
                        status: "success".to_string(),
                        message: format!("Added batch for symbol: {}", request.symbol),
                    }),
                ))
            }
            Err(e) => {
                SERVICE_METRICS.record_request(false);
                Err(error_response(e))
            }
        }
    }

    async fn stats_handler(
        State(service): State<StatsService>,
        Path((symbol, k)): Path<(String, u32)>,
    ) -> Result<Json<StatsSnapshot>, (StatusCode, Json<ErrorResponse>)> {
        match service.registry.query(&symbol, k) {
            Ok(snapshot) => {
                SERVICE_METRICS.record_request(true);
                Ok(Json(snapshot))
            }
            Err(e) => {
                SERVICE_METRICS.record_request(false);
                Err(error_response(e))
            }
        }
    }

    /// Bind `addr` and serve until the server fails or the task is aborted.
    pub async fn serve(
        self,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let app = self.router();

        info!("Starting stats service on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(e.into());
        }

        Ok(())
    }
}

/// Batch validation performed before the registry is touched
fn validate_batch(request: &AddBatchRequest) -> Result<(), String> {
    if request.symbol.is_empty() {
        return Err("Symbol cannot be empty".to_string());
    }
    if request.values.is_empty() {
        return Err("Values cannot be empty".to_string());
    }
    if request.values.len() > MAX_BATCH_SIZE {
        return Err(format!("Batch size cannot exceed {MAX_BATCH_SIZE} values"));
    }
    if !request.values.iter().all(|v| v.is_finite()) {
        return Err("All values must be finite numbers".to_string());
    }
    Ok(())
}

/// Map registry errors to transport status codes
fn error_response(err: StatsError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        StatsError::SymbolNotFound(_) => StatusCode::NOT_FOUND,
        StatsError::MaxSymbolsReached { .. } => StatusCode::BAD_REQUEST,
        StatsError::InvalidWindowExponent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("request failed: {}", err);
    }
    (status, Json(ErrorResponse {
        detail: err.to_string(),
    }))
}
