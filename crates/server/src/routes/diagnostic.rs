//! Vaccination diagnostic endpoints

use axum::{
    Extension, Json,
    body::Bytes,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use vaccin_core::{DiagnosticRequest, PatientObject, PatientProfile, build_queries};

use crate::ai::DiagnosticService;
use crate::error::{AppError, MISSING_CONFIGURATION};

/// Response body for the query dry run
#[derive(Serialize)]
pub struct QueriesResponse {
    queries: Vec<&'static str>,
}

fn record(outcome: &'static str) {
    metrics::counter!("diagnostic_requests_total", "outcome" => outcome).increment(1);
}

fn parse_patient(body: &[u8]) -> Result<PatientObject, AppError> {
    DiagnosticRequest::from_slice(body)
        .and_then(DiagnosticRequest::into_patient)
        .map_err(|e| {
            record("bad_request");
            tracing::info!(error = %e, "Rejected diagnostic request body");
            AppError::from(e)
        })
}

/// POST /diagnostic — Run a vaccination diagnostic
///
/// Accepts `{"patient": {...}}` or the patient object itself and returns the
/// model's structured report unchanged.
pub async fn create(
    Extension(service): Extension<Option<DiagnosticService>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let patient = parse_patient(&body)?;

    let Some(service) = service else {
        record("not_configured");
        tracing::error!("{}", MISSING_CONFIGURATION);
        return Err(AppError::NotConfigured);
    };

    match service.run(&patient).await {
        Ok(report) => {
            record("ok");
            Ok(([(header::CONTENT_TYPE, "application/json")], report).into_response())
        }
        Err(e) => {
            record("upstream_error");
            tracing::error!(error = %e, "Diagnostic failed");
            Err(e.into())
        }
    }
}

/// POST /diagnostic/queries — Show the retrieval queries a diagnostic would use
pub async fn queries(body: Bytes) -> Result<Json<QueriesResponse>, AppError> {
    let patient = parse_patient(&body)?;
    let queries = build_queries(&PatientProfile::from_object(&patient));

    Ok(Json(QueriesResponse {
        queries: queries.texts(),
    }))
}

/// Any method other than POST
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
