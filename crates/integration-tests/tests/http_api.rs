//! Router tests that never reach the database.
//!
//! Every request here is rejected (or answered) before the handler runs a
//! query, so the lazily-connected pool never dials out.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use cocos_glass_integration_tests::{offline_app, request, send};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let app = offline_app();
    let resp = send(&app, request("GET", "/health", None, None)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!("ok"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = offline_app();
    let mut req = request("GET", "/health", None, None);
    req.headers_mut()
        .insert("x-request-id", "test-request-42".parse().unwrap());

    let response = tower::ServiceExt::oneshot(app, req).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-request-42"
    );
}

// ============================================================================
// Sign-in requirements
// ============================================================================

#[tokio::test]
async fn test_portal_requires_sign_in() {
    let app = offline_app();
    for uri in ["/portal", "/portal/commissions", "/portal/commissions/1"] {
        let resp = send(&app, request("GET", uri, None, None)).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(resp.body["error"], "You need to sign in before continuing.");
    }
}

#[tokio::test]
async fn test_admin_requires_sign_in() {
    let app = offline_app();
    for (method, uri) in [
        ("GET", "/admin"),
        ("GET", "/admin/commissions"),
        ("GET", "/admin/contact_inquiries"),
        ("GET", "/admin/users"),
        ("DELETE", "/admin/works/1"),
    ] {
        let resp = send(&app, request(method, uri, None, None)).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_anonymous_transition_is_rejected() {
    let app = offline_app();
    let body = json!({ "event": "start_work" });
    let resp = send(
        &app,
        request("POST", "/admin/commissions/1/transition", Some(&body), None),
    )
    .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_sign_in() {
    let app = offline_app();
    let resp = send(&app, request("GET", "/auth/me", None, None)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Input validation
// ============================================================================

#[tokio::test]
async fn test_contact_rejects_invalid_submission() {
    let app = offline_app();
    let body = json!({
        "name": "",
        "email": "not-an-email",
        "message": "too short",
    });
    let resp = send(&app, request("POST", "/contact", Some(&body), None)).await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &resp.body["fields"];
    assert!(fields["name"].is_array());
    assert!(fields["email"].is_array());
    assert!(fields["message"].is_array());
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let app = offline_app();
    let body = json!({
        "email": "nobody",
        "password": "stained-glass-2024",
        "first_name": "Rose",
        "last_name": "Window",
    });
    let resp = send(&app, request("POST", "/auth/register", Some(&body), None)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "Invalid email address");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = offline_app();
    let body = json!({
        "email": "rose@example.com",
        "password": "short",
        "first_name": "Rose",
        "last_name": "Window",
    });
    let resp = send(&app, request("POST", "/auth/register", Some(&body), None)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_malformed_email_is_invalid_credentials() {
    let app = offline_app();
    let body = json!({ "email": "nobody", "password": "whatever-it-is" });
    let resp = send(&app, request("POST", "/auth/login", Some(&body), None)).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = offline_app();
    let resp = send(&app, request("GET", "/nope", None, None)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
