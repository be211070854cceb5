//! vaccin-server library crate
//!
//! Exposes `build_app` and `config` for integration tests.
//! The actual binary entrypoint is in `main.rs`.

mod ai;
pub mod config;
mod error;
mod middleware;
mod routes;

use std::sync::OnceLock;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use middleware::ApiKeyAuth;

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(config: &Config) -> Router {
    let auth = ApiKeyAuth::new(config.api_key.clone());

    // None if OPENAI_API_KEY or VECTOR_STORE_ID is missing; reported per request
    let diagnostic_service = ai::DiagnosticService::from_config(config);

    let mut diagnostic_routes = routes::diagnostic_routes()
        .layer(axum_mw::from_fn(middleware::auth_middleware))
        .layer(Extension(auth));

    if let Some(rate_limiter) = middleware::create_rate_limiter(config.rate_limit_rps) {
        diagnostic_routes = diagnostic_routes
            .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
            .layer(Extension(rate_limiter));
    }

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle()));

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(public_routes)
        .merge(diagnostic_routes)
        .layer(Extension(diagnostic_service))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}

/// Handle of the process-wide Prometheus recorder.
///
/// The recorder is installed once; every app built afterwards (several per
/// integration test binary) renders the same registry.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            let _ = metrics::set_global_recorder(recorder);
            handle
        })
        .clone()
}
