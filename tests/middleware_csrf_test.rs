// ABOUTME: HTTP integration tests for the CSRF protection middleware
// ABOUTME: Exercises token issuance, validation, form fallbacks, and rotation precedence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(clippy::uninlined_format_args)]

//! Integration tests for the CSRF protection middleware
//!
//! Uses a minimal router so every observation is about the middleware
//! itself: cookie issuance on GET, rejection taxonomy on unsafe methods,
//! the header and form-field extraction paths, and rotation precedence.

mod common;
mod helpers;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    routing::get,
    Extension, Router,
};
use barbican::middleware::csrf::{csrf_protection_middleware, CsrfTokenExtension};
use barbican::server::ServerResources;
use helpers::axum_test::AxumTestRequest;
use std::sync::Arc;

async fn echo_body(body: String) -> String {
    body
}

async fn read_data() -> &'static str {
    "data"
}

async fn delete_data() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn current_token(Extension(token): Extension<CsrfTokenExtension>) -> String {
    token.as_str().to_owned()
}

async fn rotate_token(State(resources): State<Arc<ServerResources>>) -> (HeaderMap, &'static str) {
    let mut headers = HeaderMap::new();
    resources.csrf.rotate(&mut headers);
    (headers, "rotated")
}

async fn exempt_sink() -> &'static str {
    "ok"
}

/// Minimal router with only the CSRF middleware attached
fn protected_app(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .route("/api/echo", axum::routing::post(echo_body))
        .route(
            "/api/data",
            get(read_data).put(echo_body).delete(delete_data),
        )
        .route("/api/token", get(current_token))
        .route("/api/rotate", get(rotate_token))
        .route("/health", axum::routing::post(exempt_sink))
        .layer(middleware::from_fn_with_state(
            Arc::clone(resources),
            csrf_protection_middleware,
        ))
        .with_state(Arc::clone(resources))
}

fn test_app() -> (Arc<ServerResources>, Router) {
    let resources = common::create_test_resources().expect("test resources");
    let app = protected_app(&resources);
    (resources, app)
}

// ============================================================================
// Token Issuance Tests
// ============================================================================

#[tokio::test]
async fn test_get_without_cookie_issues_token() {
    let (_, app) = test_app();

    let response = AxumTestRequest::get("/api/data").send(app).await;

    assert_eq!(response.status(), 200);
    let cookie = response
        .set_cookie_value("csrf_token")
        .expect("GET without a cookie must receive one");
    assert_eq!(cookie.len(), 43, "32 bytes base64url without padding");
}

#[tokio::test]
async fn test_get_with_cookie_does_not_reissue() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::get("/api/data")
        .cookie("csrf_token", &token)
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.set_cookie_value("csrf_token"),
        None,
        "an existing cookie must not be replaced on a safe request"
    );
}

#[tokio::test]
async fn test_extension_carries_issued_token() {
    let (_, app) = test_app();

    // No cookie: the extension and the Set-Cookie must carry the same value
    let response = AxumTestRequest::get("/api/token").send(app).await;
    assert_eq!(response.status(), 200);
    let cookie = response.set_cookie_value("csrf_token").unwrap();
    assert_eq!(response.text(), cookie);
}

#[tokio::test]
async fn test_extension_carries_existing_cookie() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::get("/api/token")
        .cookie("csrf_token", &token)
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), token);
}

// ============================================================================
// Validation Tests - Header Path
// ============================================================================

#[tokio::test]
async fn test_post_without_tokens_rejected_as_missing() {
    let (_, app) = test_app();

    let response = AxumTestRequest::post("/api/echo").send(app).await;

    assert_eq!(response.status(), 403);
    let fresh_cookie = response.set_cookie_value("csrf_token");
    assert!(
        fresh_cookie.is_some(),
        "the rejection must still issue a cookie so the client can retry"
    );
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_type"], "csrf_token_missing");
    assert!(body["detail"].as_str().unwrap().contains("cookie"));
}

#[tokio::test]
async fn test_post_with_matching_pair_allowed() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .header("x-csrf-token", &token)
        .raw_body("text/plain", "payload")
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "payload");
}

#[tokio::test]
async fn test_post_with_mismatched_pair_rejected() {
    let (resources, _) = test_app();
    let cookie = resources.csrf.issue_token().into_inner();
    let other = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &cookie)
        .header("x-csrf-token", &other)
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 403);
    assert_eq!(
        response.set_cookie_value("csrf_token"),
        None,
        "a client that already holds a cookie keeps it"
    );
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_type"], "csrf_token_invalid");
}

#[tokio::test]
async fn test_post_with_cookie_but_no_request_copy_rejected() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_type"], "csrf_token_missing");
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("X-CSRF-Token header"));
}

#[tokio::test]
async fn test_header_name_is_case_insensitive() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .header("X-CSRF-Token", &token)
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_empty_header_value_counts_as_missing() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .header("x-csrf-token", "   ")
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_type"], "csrf_token_missing");
}

#[tokio::test]
async fn test_put_and_delete_are_validated() {
    let (resources, _) = test_app();

    let put = AxumTestRequest::put("/api/data")
        .send(protected_app(&resources))
        .await;
    assert_eq!(put.status(), 403);

    let delete = AxumTestRequest::delete("/api/data")
        .send(protected_app(&resources))
        .await;
    assert_eq!(delete.status(), 403);

    let token = resources.csrf.issue_token().into_inner();
    let delete_ok = AxumTestRequest::delete("/api/data")
        .cookie("csrf_token", &token)
        .header("x-csrf-token", &token)
        .send(protected_app(&resources))
        .await;
    assert_eq!(delete_ok.status(), 204);
}

#[tokio::test]
async fn test_validation_runs_before_routing() {
    let (_, app) = test_app();

    // Unsafe requests to unknown paths are rejected, not 404'd: the
    // middleware wraps the router.
    let response = AxumTestRequest::post("/no/such/route").send(app).await;
    assert_eq!(response.status(), 403);
}

// ============================================================================
// Validation Tests - Form Body Fallback
// ============================================================================

#[tokio::test]
async fn test_urlencoded_form_field_accepted_and_body_preserved() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();
    let body = format!("csrf_token={token}&name=alice");

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .raw_body("application/x-www-form-urlencoded", body.clone())
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
    // The handler still sees the full body after the middleware buffered it
    assert_eq!(response.text(), body);
}

#[tokio::test]
async fn test_urlencoded_form_with_wrong_token_rejected() {
    let (resources, _) = test_app();
    let cookie = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &cookie)
        .raw_body(
            "application/x-www-form-urlencoded",
            "csrf_token=forged&name=alice",
        )
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_type"], "csrf_token_invalid");
}

#[tokio::test]
async fn test_multipart_form_field_accepted_and_body_preserved() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();
    let body = format!(
        "--BOUNDARY\r\n\
         Content-Disposition: form-data; name=\"comment\"\r\n\r\n\
         hello\r\n\
         --BOUNDARY\r\n\
         Content-Disposition: form-data; name=\"csrf_token\"\r\n\r\n\
         {token}\r\n\
         --BOUNDARY--\r\n"
    );

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .raw_body("multipart/form-data; boundary=BOUNDARY", body.clone())
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), body);
}

#[tokio::test]
async fn test_header_wins_over_form_field() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    // Valid header, stale form field: the header is checked first, so the
    // body is never parsed and the request passes.
    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .header("x-csrf-token", &token)
        .raw_body("application/x-www-form-urlencoded", "csrf_token=stale")
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_json_body_is_never_parsed_for_tokens() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .json(&serde_json::json!({ "csrf_token": token }))
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_type"], "csrf_token_missing");
}

#[tokio::test]
async fn test_oversized_form_body_counts_as_missing_token() {
    let (resources, _) = test_app();
    let token = resources.csrf.issue_token().into_inner();

    // Past the buffering cap the field is never found, even though the
    // body genuinely contains it.
    let padding = "x".repeat(70 * 1024);
    let body = format!("pad={padding}&csrf_token={token}");

    let response = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .raw_body("application/x-www-form-urlencoded", body)
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 403);
    let rejection: serde_json::Value = response.json();
    assert_eq!(rejection["error_type"], "csrf_token_missing");
}

// ============================================================================
// Exemption and Safe Method Tests
// ============================================================================

#[tokio::test]
async fn test_exempt_path_allows_post_without_tokens() {
    let (_, app) = test_app();

    let response = AxumTestRequest::post("/health").send(app).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_prefix_exemption_covers_subpaths() {
    let resources = common::create_test_resources_with(common::test_config_with_csrf(
        true,
        &["/api/docs*"],
    ))
    .expect("test resources");

    let app = Router::new()
        .route("/api/docs/refresh", axum::routing::post(exempt_sink))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&resources),
            csrf_protection_middleware,
        ))
        .with_state(Arc::clone(&resources));

    let response = AxumTestRequest::post("/api/docs/refresh").send(app).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_get_never_requires_tokens() {
    let (_, app) = test_app();

    let response = AxumTestRequest::get("/api/data").send(app).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "data");
}

// ============================================================================
// Disabled Protection Tests
// ============================================================================

#[tokio::test]
async fn test_disabled_protection_is_fully_inert() {
    let resources = common::create_test_resources_with(common::test_config_with_csrf(false, &[]))
        .expect("test resources");
    let app = protected_app(&resources);

    let response = AxumTestRequest::post("/api/echo")
        .raw_body("text/plain", "no tokens at all")
        .send(app)
        .await;

    assert_eq!(response.status(), 200);
    assert!(
        response.set_cookies().is_empty(),
        "disabled protection must not issue cookies"
    );
    assert_eq!(response.text(), "no tokens at all");
}

#[tokio::test]
async fn test_disabled_protection_issues_no_cookie_on_get() {
    let resources = common::create_test_resources_with(common::test_config_with_csrf(false, &[]))
        .expect("test resources");
    let app = protected_app(&resources);

    let response = AxumTestRequest::get("/api/data").send(app).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.set_cookie_value("csrf_token"), None);
}

// ============================================================================
// Rotation Precedence Tests
// ============================================================================

#[tokio::test]
async fn test_handler_rotation_wins_over_queued_issuance() {
    let (_, app) = test_app();

    // No cookie on the request, so the middleware queues an issuance; the
    // handler rotates. Exactly one cookie must survive: the rotated one.
    let response = AxumTestRequest::get("/api/rotate").send(app).await;

    assert_eq!(response.status(), 200);
    let csrf_cookies: Vec<String> = response
        .set_cookies()
        .into_iter()
        .filter(|c| c.starts_with("csrf_token="))
        .collect();
    assert_eq!(csrf_cookies.len(), 1, "rotation must not be double-set");
}

#[tokio::test]
async fn test_handler_rotation_replaces_existing_cookie() {
    let (resources, _) = test_app();
    let old = resources.csrf.issue_token().into_inner();

    let response = AxumTestRequest::get("/api/rotate")
        .cookie("csrf_token", &old)
        .send(protected_app(&resources))
        .await;

    assert_eq!(response.status(), 200);
    let new = response
        .set_cookie_value("csrf_token")
        .expect("rotation must set a cookie");
    assert_ne!(new, old);
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[tokio::test]
async fn test_issued_token_round_trips_through_validation() {
    let (resources, _) = test_app();

    // Obtain a token the way a browser would: from a rejected first attempt
    let rejected = AxumTestRequest::post("/api/echo")
        .send(protected_app(&resources))
        .await;
    assert_eq!(rejected.status(), 403);
    let token = rejected.set_cookie_value("csrf_token").unwrap();

    // Retry with the issued pair
    let retry = AxumTestRequest::post("/api/echo")
        .cookie("csrf_token", &token)
        .header("x-csrf-token", &token)
        .raw_body("text/plain", "second attempt")
        .send(protected_app(&resources))
        .await;

    assert_eq!(retry.status(), 200);
    assert_eq!(retry.text(), "second attempt");
}
