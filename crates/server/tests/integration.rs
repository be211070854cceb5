//! Integration tests for the vaccination diagnostic server.
//!
//! The OpenAI Responses API is replaced by a small axum app bound to an
//! ephemeral local port; it records every request it receives and answers
//! with a canned body.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;

use vaccin_core::{DeliverySchema, SCHEMA_NAME, SYSTEM_PROMPT, SearchQuery};
use vaccin_server::config::Config;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TEST_OPENAI_KEY: &str = "sk-test";
const TEST_VECTOR_STORE: &str = "vs_test";
const TEST_API_KEY: &str = "test-secret-key";

/// Requests seen by the fake upstream: (Authorization header, JSON body)
type Captured = Arc<Mutex<Vec<(String, JsonValue)>>>;

/// Start a fake Responses API answering every call with `status` and `reply`.
/// Returns its base URL and the captured requests.
async fn start_upstream(status: StatusCode, reply: JsonValue) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    let app = Router::new().route(
        "/v1/responses",
        post(move |headers: HeaderMap, Json(body): Json<JsonValue>| {
            let sink = sink.clone();
            let reply = reply.clone();
            async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                sink.lock().unwrap().push((auth, body));
                (status, Json(reply))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), captured)
}

/// Canned successful Responses API body wrapping `report`
fn upstream_reply(report: &str) -> JsonValue {
    json!({
        "id": "resp_test",
        "object": "response",
        "status": "completed",
        "output": [
            {
                "type": "file_search_call",
                "id": "fs_1",
                "status": "completed",
                "queries": ["Calendrier vaccinal"],
                "results": null
            },
            {
                "type": "message",
                "id": "msg_1",
                "role": "assistant",
                "status": "completed",
                "content": [
                    {"type": "output_text", "text": report, "annotations": []}
                ]
            }
        ]
    })
}

/// Test configuration pointing at `base_url`
fn test_config(base_url: &str) -> Config {
    Config {
        bind_address: "0.0.0.0:0".parse().unwrap(),
        api_key: None,
        cors_origins: vec!["*".to_string()],
        rate_limit_rps: 0,
        openai_api_key: Some(TEST_OPENAI_KEY.to_string()),
        vector_store_id: Some(TEST_VECTOR_STORE.to_string()),
        openai_base_url: base_url.to_string(),
        model: "gpt-4.1-mini".to_string(),
        max_search_results: 12,
        max_output_tokens: 16000,
        schema: DeliverySchema::bundled().expect("Bundled schema must parse"),
    }
}

/// Configuration without upstream credentials
fn unconfigured() -> Config {
    Config {
        openai_api_key: None,
        vector_store_id: None,
        ..test_config("http://127.0.0.1:1/v1")
    }
}

/// Send a request to the app and return (status, headers, raw body).
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    (status, headers, bytes)
}

/// Send a request to the app and return (status, body as JSON).
async fn request(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let (status, _, bytes) = send(app, req).await;
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, body)
}

/// Build a POST request with a raw body.
fn post_raw(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

/// Build a POST request with a JSON body.
fn post_json(uri: &str, body: JsonValue) -> Request<Body> {
    post_raw(uri, serde_json::to_vec(&body).unwrap())
}

/// Sample patient in the front-end's field naming.
fn sample_patient() -> JsonValue {
    json!({
        "patient_sex": "F",
        "patient_age_range": "25-34 ans",
        "patient_pregnancy_status_or_project": "enceinte",
        "patient_chronic_conditions": "",
        "patient_current_treatments": "",
        "patient_allergy_history": "",
        "patient_profession_or_exposure": "infirmière",
        "patient_travel_plan": "",
        "contraindications_check_pregnancy_or_postpartum": "oui",
        "contraindications_check_immunosuppression": "non",
        "contraindications_check_anticoagulants": "non",
        "contraindications_check_severe_allergy": "non"
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let app = vaccin_server::build_app(&test_config("http://127.0.0.1:1/v1"));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = request(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let app = vaccin_server::build_app(&unconfigured());
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = request(&app, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["reason"], "Missing OPENAI_API_KEY or VECTOR_STORE_ID");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = vaccin_server::build_app(&unconfigured());
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let app = vaccin_server::build_app(&unconfigured());

    for method in ["GET", "PUT", "DELETE"] {
        let req = Request::builder()
            .method(method)
            .uri("/diagnostic")
            .body(Body::empty())
            .unwrap();
        let (status, body) = request(&app, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(body["error"], "Method Not Allowed");
    }
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (base_url, captured) = start_upstream(StatusCode::OK, upstream_reply("{}")).await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, body) = request(&app, post_raw("/diagnostic", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"].as_str().unwrap().starts_with("Invalid JSON body"),
        "{body}"
    );

    let (status, body) = request(&app, post_raw("/diagnostic", "[1, 2]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body must be a JSON object");

    let (status, body) = request(&app, post_raw("/diagnostic", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing patient");

    let (status, body) = request(&app, post_json("/diagnostic", json!({"patient": "Jane"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing patient");

    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_configuration() {
    let app = vaccin_server::build_app(&unconfigured());

    let (status, body) = request(
        &app,
        post_json("/diagnostic", json!({"patient": sample_patient()})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Missing OPENAI_API_KEY or VECTOR_STORE_ID"}));

    // Body validation comes first
    let (status, _) = request(&app, post_raw("/diagnostic", "nope")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_diagnostic_passes_report_through() {
    let report = r#"{"meta":{"source_document":"Calendrier","version":"v1","diagnostic_date_iso":"2026-01-01"},"limitations":[]}"#;
    let (base_url, captured) = start_upstream(StatusCode::OK, upstream_reply(report)).await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, headers, bytes) = send(
        &app,
        post_json("/diagnostic", json!({"patient": sample_patient()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(bytes.as_ref(), report.as_bytes());

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (auth, upstream) = &captured[0];

    assert_eq!(auth, &format!("Bearer {}", TEST_OPENAI_KEY));
    assert_eq!(upstream["model"], "gpt-4.1-mini");
    assert_eq!(upstream["temperature"], 0.0);
    assert_eq!(upstream["max_output_tokens"], 16000);

    assert_eq!(upstream["tools"][0]["type"], "file_search");
    assert_eq!(upstream["tools"][0]["vector_store_ids"], json!([TEST_VECTOR_STORE]));
    assert_eq!(upstream["tools"][0]["max_num_results"], 12);

    assert_eq!(upstream["text"]["format"]["type"], "json_schema");
    assert_eq!(upstream["text"]["format"]["name"], SCHEMA_NAME);
    assert_eq!(upstream["text"]["format"]["strict"], true);
    assert_eq!(
        &upstream["text"]["format"]["schema"],
        DeliverySchema::bundled().unwrap().as_value()
    );

    assert_eq!(upstream["input"][0]["role"], "system");
    assert_eq!(upstream["input"][0]["content"], SYSTEM_PROMPT);
    assert_eq!(upstream["input"][1]["role"], "user");

    let user = upstream["input"][1]["content"].as_str().unwrap();
    assert!(user.starts_with("Date du diagnostic: "));
    assert!(user.contains("Patient (JSON):\n{\n  \"patient_sex\": \"F\","));
    assert!(user.contains(SearchQuery::AdultCalendar.text()));
    assert!(user.contains(SearchQuery::Pregnancy.text()));
    assert!(user.contains(SearchQuery::Occupational.text()));
    assert!(!user.contains(SearchQuery::Travel.text()));
    assert!(user.ends_with(SearchQuery::Intervals.text()));
}

#[tokio::test]
async fn test_wrapped_and_bare_patients_are_equivalent() {
    let (base_url, captured) = start_upstream(StatusCode::OK, upstream_reply("{}")).await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, _) = request(
        &app,
        post_json("/diagnostic", json!({"patient": sample_patient()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, post_json("/diagnostic", sample_patient())).await;
    assert_eq!(status, StatusCode::OK);

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].1["input"], captured[1].1["input"]);
}

#[tokio::test]
async fn test_netlify_path_alias() {
    let (base_url, captured) = start_upstream(StatusCode::OK, upstream_reply("{}")).await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, headers, bytes) = send(
        &app,
        post_json("/.netlify/functions/diagnostic", sample_patient()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(bytes.as_ref(), b"{}");
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upstream_error_is_reported() {
    let (base_url, _) = start_upstream(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}),
    )
    .await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, body) = request(&app, post_json("/diagnostic", sample_patient())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "OpenAI API error (401): Incorrect API key provided"
    );
}

#[tokio::test]
async fn test_missing_output_text() {
    let (base_url, _) = start_upstream(
        StatusCode::OK,
        json!({
            "id": "resp_empty",
            "status": "incomplete",
            "incomplete_details": {"reason": "max_output_tokens"},
            "output": [{"type": "file_search_call", "id": "fs_1", "status": "completed"}]
        }),
    )
    .await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, body) = request(&app, post_json("/diagnostic", sample_patient())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "No output_text"}));
}

#[tokio::test]
async fn test_incomplete_response_with_text_is_passed_through() {
    let report = r#"{"meta":{"version":"v1"},"limitations":["Réponse tronquée"]}"#;
    let mut reply = upstream_reply(report);
    reply["status"] = json!("incomplete");
    reply["incomplete_details"] = json!({"reason": "max_output_tokens"});

    let (base_url, captured) = start_upstream(StatusCode::OK, reply).await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, headers, bytes) = send(&app, post_json("/diagnostic", sample_patient())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(bytes.as_ref(), report.as_bytes());
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_diagnostic_outcomes_are_counted() {
    let (base_url, _) = start_upstream(StatusCode::OK, upstream_reply("{}")).await;
    let app = vaccin_server::build_app(&test_config(&base_url));

    let (status, _) = request(&app, post_json("/diagnostic", sample_patient())).await;
    assert_eq!(status, StatusCode::OK);

    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _, bytes) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("diagnostic_requests_total"), "{body}");
    assert!(body.contains("http_requests_total"), "{body}");
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let app = vaccin_server::build_app(&test_config("http://127.0.0.1:1/v1"));

    let (status, body) = request(&app, post_json("/diagnostic", sample_patient())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"].as_str().unwrap().starts_with("HTTP request failed"),
        "{body}"
    );
}

#[tokio::test]
async fn test_query_dry_run() {
    let app = vaccin_server::build_app(&unconfigured());

    let (status, body) = request(
        &app,
        post_json(
            "/diagnostic/queries",
            json!({"patient": {"treatments": "chimiothérapie en cours"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["queries"],
        json!([
            SearchQuery::AdultCalendar.text(),
            SearchQuery::LiveVaccineContraindications.text(),
            SearchQuery::Immunocompromised.text(),
            SearchQuery::Intervals.text()
        ])
    );

    let (status, body) = request(&app, post_json("/diagnostic/queries", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queries"].as_array().unwrap().len(), 2);

    let req = Request::builder()
        .uri("/diagnostic/queries")
        .body(Body::empty())
        .unwrap();
    let (status, _) = request(&app, req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let config = Config {
        api_key: Some(TEST_API_KEY.to_string()),
        ..unconfigured()
    };
    let app = vaccin_server::build_app(&config);

    let (status, body) = request(&app, post_json("/diagnostic/queries", json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or missing API key");

    let mut req = post_json("/diagnostic/queries", json!({}));
    req.headers_mut()
        .insert("X-API-Key", TEST_API_KEY.parse().unwrap());
    let (status, _) = request(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    // Public routes stay open
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit() {
    let config = Config {
        rate_limit_rps: 1,
        ..unconfigured()
    };
    let app = vaccin_server::build_app(&config);

    let (status, _) = request(&app, post_json("/diagnostic/queries", json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, post_json("/diagnostic/queries", json!({}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded. Please try again later.");
}

#[tokio::test]
async fn test_request_id_header() {
    let app = vaccin_server::build_app(&unconfigured());

    let req = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, req).await;
    assert_eq!(headers["X-Request-ID"], "abc-123");

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, req).await;
    let generated = headers["X-Request-ID"].to_str().unwrap();
    assert!(uuid_like(generated), "{generated}");
}

fn uuid_like(value: &str) -> bool {
    value.len() == 36 && value.chars().filter(|c| *c == '-').count() == 4
}
