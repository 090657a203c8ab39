//! Alert Routes

use alerting::{AlertSnapshot, AlertStatus};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::{ApiError, AppState};

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by status
    pub status: Option<AlertStatus>,
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<AlertSnapshot>,
    pub count: usize,
    pub exhausted_count: usize,
}

/// Body for opening an alert
#[derive(Debug, Deserialize)]
pub struct CreateAlert {
    pub resource: String,
    /// Overrides the configured acknowledgement window
    pub deadline_secs: Option<u64>,
}

/// List tracked alerts
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertQuery>,
) -> Json<AlertResponse> {
    let mut alerts: Vec<_> = state
        .engine
        .active_alerts()
        .iter()
        .map(|alert| alert.snapshot())
        .filter(|snapshot| params.status.map_or(true, |s| snapshot.status == s))
        .collect();
    alerts.sort_by_key(|snapshot| snapshot.created_at);

    let exhausted = alerts
        .iter()
        .filter(|a| a.status == AlertStatus::Exhausted)
        .count();

    Json(AlertResponse {
        count: alerts.len(),
        exhausted_count: exhausted,
        data: alerts,
    })
}

/// Open an alert for an unhealthy resource
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAlert>,
) -> Result<(StatusCode, Json<AlertSnapshot>), ApiError> {
    let resource = state.resource(&body.resource);
    let deadline = body.deadline_secs.map(Duration::from_secs);

    let alert = state.engine.receive_alert(resource, deadline)?;
    Ok((StatusCode::CREATED, Json(alert.snapshot())))
}

/// Acknowledge an alert by id
pub async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AlertSnapshot>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("invalid alert id '{}': {}", id, e)))?;

    let alert = state.engine.acknowledge_id(id)?;
    Ok(Json(alert.snapshot()))
}
