//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use vaccin_core::{DiagnosticError, ErrorBody};

use crate::ai::UpstreamError;

/// Message returned when the upstream credentials are not configured
pub const MISSING_CONFIGURATION: &str = "Missing OPENAI_API_KEY or VECTOR_STORE_ID";

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    MethodNotAllowed,
    Unauthorized,
    RateLimited,
    NotConfigured,
    Upstream(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotConfigured | AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(msg) | AppError::Upstream(msg) => msg,
            AppError::MethodNotAllowed => "Method Not Allowed".to_string(),
            AppError::Unauthorized => "Invalid or missing API key".to_string(),
            AppError::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
            AppError::NotConfigured => MISSING_CONFIGURATION.to_string(),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

impl From<DiagnosticError> for AppError {
    fn from(err: DiagnosticError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err.to_string())
    }
}
