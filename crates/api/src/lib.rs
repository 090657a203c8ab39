//! Escalation Pager API Server
//!
//! HTTP surface over the escalation engine: health probes open alerts,
//! contacts acknowledge them, and recovery reports close them.

use alerting::EscalationEngine;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use escalation_policy::{EscalationPolicy, MonitoredResource};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod routes;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    /// Escalation engine
    pub engine: EscalationEngine,
    /// Monitored resources by name, one per configured policy
    pub resources: HashMap<String, Arc<MonitoredResource>>,
    /// Prometheus render handle, if a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create application state with one resource per policy entry
    pub fn new(engine: EscalationEngine, metrics: Option<PrometheusHandle>) -> Self {
        let resources = engine
            .policy()
            .resources()
            .map(|name| (name.to_string(), Arc::new(MonitoredResource::new(name))))
            .collect();

        Self {
            engine,
            resources,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Registered resource, or a detached one for names without a policy
    pub fn resource(&self, name: &str) -> Arc<MonitoredResource> {
        self.resources
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(MonitoredResource::new(name)))
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub resources: usize,
    pub active_alerts: usize,
    pub armed_deadlines: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/alerts",
            get(routes::alerts::get_alerts).post(routes::alerts::create_alert),
        )
        .route("/api/v1/alerts/:id/ack", post(routes::alerts::acknowledge_alert))
        .route("/api/v1/resources", get(routes::resources::get_resources))
        .route(
            "/api/v1/resources/:name/recover",
            post(routes::resources::recover_resource),
        )
        .route("/api/v1/dispatches", get(routes::dispatches::get_dispatches))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        resources: state.resources.len(),
        active_alerts: state.engine.active_count(),
        armed_deadlines: state.engine.armed_deadlines(),
    })
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| ApiError::Logging(format!("unknown log level '{}'", config.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ApiError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}

/// Run the server
pub async fn run_server(config: AppConfig) -> Result<(), ApiError> {
    let metrics = install_metrics()?;
    let policy = EscalationPolicy::new(config.policies)?;
    let engine = EscalationEngine::new(policy, config.engine);

    let state = Arc::new(AppState::new(engine, Some(metrics)));
    let app = create_router(state).layer(TraceLayer::new_for_http());

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
