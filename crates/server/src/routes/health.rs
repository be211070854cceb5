//! Health check endpoint

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::ai::DiagnosticService;
use crate::error::MISSING_CONFIGURATION;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// GET /health - Report whether diagnostics can be served
pub async fn check(
    Extension(service): Extension<Option<DiagnosticService>>,
) -> impl IntoResponse {
    if service.is_some() {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                reason: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy".to_string(),
                reason: Some(MISSING_CONFIGURATION.to_string()),
            }),
        )
    }
}
