//! API Error Types

use alerting::EscalationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use escalation_policy::PolicyError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the API server
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Escalation(#[from] EscalationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid escalation policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Escalation(EscalationError::PolicyNotFound(_))
            | ApiError::Escalation(EscalationError::UnknownAlert(_)) => StatusCode::NOT_FOUND,
            ApiError::Escalation(EscalationError::Policy(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Escalation(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
