pub mod diagnostic;
pub mod health;
pub mod metrics;

use axum::{Router, routing::post};

/// Build diagnostic routes.
///
/// The Netlify function path is kept as an alias for existing front-ends.
pub fn diagnostic_routes() -> Router {
    let diagnose = post(diagnostic::create).fallback(diagnostic::method_not_allowed);

    Router::new()
        .route("/diagnostic", diagnose.clone())
        .route("/.netlify/functions/diagnostic", diagnose)
        .route(
            "/diagnostic/queries",
            post(diagnostic::queries).fallback(diagnostic::method_not_allowed),
        )
}
