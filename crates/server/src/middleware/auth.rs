//! Optional shared-secret authentication for the diagnostic routes

use axum::{body::Body, extract::Request, middleware::Next, response::{IntoResponse, Response}};

use crate::error::AppError;

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "X-API-Key";

/// API Key authentication state
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_key: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    /// Every key is accepted when none is configured
    fn accepts(&self, presented: Option<&str>) -> bool {
        match &self.api_key {
            Some(expected) => presented == Some(expected.as_str()),
            None => true,
        }
    }
}

/// Reject requests without the configured `X-API-Key`
pub async fn auth_middleware(request: Request<Body>, next: Next) -> Response {
    let allowed = match request.extensions().get::<ApiKeyAuth>() {
        Some(auth) => auth.accepts(
            request
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok()),
        ),
        None => true,
    };

    if !allowed {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
        return AppError::Unauthorized.into_response();
    }

    next.run(request).await
}
