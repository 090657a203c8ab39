//! Resource Routes

use alerting::AlertSnapshot;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiError, AppState};

/// Health of one monitored resource
#[derive(Debug, Serialize)]
pub struct ResourceStatus {
    pub name: String,
    pub healthy: bool,
    pub levels: usize,
    pub active_alert: Option<Uuid>,
}

/// List monitored resources
pub async fn get_resources(State(state): State<Arc<AppState>>) -> Json<Vec<ResourceStatus>> {
    let mut resources: Vec<_> = state
        .resources
        .values()
        .map(|resource| ResourceStatus {
            name: resource.name().to_string(),
            healthy: resource.is_healthy(),
            levels: state.engine.policy().level_count(resource.name()).unwrap_or(0),
            active_alert: state.engine.active_alert(resource.name()).map(|a| a.id()),
        })
        .collect();
    resources.sort_by(|a, b| a.name.cmp(&b.name));

    Json(resources)
}

/// Report that a resource recovered
pub async fn recover_resource(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AlertSnapshot>, ApiError> {
    let alert = state.engine.resolve(&name)?;
    Ok(Json(alert.snapshot()))
}
