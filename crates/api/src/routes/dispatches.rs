//! Dispatch Audit Routes

use alerting::DispatchRecord;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// Query parameters for dispatches endpoint
#[derive(Debug, Deserialize)]
pub struct DispatchQuery {
    /// Filter by resource name
    pub resource: Option<String>,
    /// Maximum number of records (most recent)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Response for dispatches endpoint
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub data: Vec<DispatchRecord>,
    pub count: usize,
    pub failed_count: usize,
}

/// Get notification attempts, oldest first
pub async fn get_dispatches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DispatchQuery>,
) -> Json<DispatchResponse> {
    let mut records: Vec<_> = state
        .engine
        .audit()
        .records()
        .into_iter()
        .filter(|r| params.resource.as_deref().map_or(true, |name| r.resource == name))
        .collect();

    let skip = records.len().saturating_sub(params.limit);
    records.drain(..skip);

    let failed = records
        .iter()
        .filter(|r| matches!(r.outcome, alerting::DispatchOutcome::Failed(_)))
        .count();

    Json(DispatchResponse {
        count: records.len(),
        failed_count: failed,
        data: records,
    })
}
