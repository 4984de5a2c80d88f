use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures of the cost analytics engine.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("invalid reporting period: {0}")]
    InvalidPeriod(String),
    #[error("cost store query failed: {0:#}")]
    Store(#[from] anyhow::Error),
    #[error("report generation did not finish within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ApiError,
}

impl AppError {
    fn new(status: StatusCode, code: &str, msg: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiError {
                code: code.into(),
                message: msg.into(),
                details: None,
            },
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }

    pub fn gateway_timeout(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT", msg)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.body.details = Some(details);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidPeriod(msg) => Self::bad_request(msg),
            AnalyticsError::Store(err) => {
                tracing::error!("Cost store error: {:?}", err);
                Self::internal("Database error")
            }
            AnalyticsError::Timeout(limit) => {
                tracing::warn!(timeout_secs = limit.as_secs(), "Cost report timed out");
                Self::gateway_timeout(format!("Report generation exceeded {}s", limit.as_secs()))
                    .with_details(serde_json::json!({ "timeout_secs": limit.as_secs() }))
            }
        }
    }
}
