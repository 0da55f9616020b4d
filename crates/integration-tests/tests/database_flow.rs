//! End-to-end flows against a real database.
//!
//! These tests require a running `PostgreSQL` database named by
//! `DATABASE_URL` (migrations are applied automatically).
//!
//! Run with: cargo test -p cocos-glass-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use cocos_glass_core::{Role, UserProfile};
use cocos_glass_integration_tests::{TestResponse, database_app, request, send};
use cocos_glass_web::services::AuthService;

/// A suffix that keeps emails unique across runs.
fn unique() -> String {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_string()
}

async fn create_admin(pool: &sqlx::PgPool, email: &str) {
    let profile = UserProfile {
        first_name: "Coco".to_owned(),
        last_name: "Glass".to_owned(),
        phone: None,
    };
    AuthService::new(pool)
        .create_user(email, "adminpassword123", &profile, Role::Admin)
        .await
        .unwrap();
}

async fn login(app: &axum::Router, email: &str, password: &str) -> String {
    let body = json!({ "email": email, "password": password });
    let resp = send(app, request("POST", "/auth/login", Some(&body), None)).await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    resp.cookie.unwrap()
}

async fn register(app: &axum::Router, email: &str) -> (i64, String) {
    let body = json!({
        "email": email,
        "password": "password123",
        "first_name": "Sample",
        "last_name": "Customer",
    });
    let resp = send(app, request("POST", "/auth/register", Some(&body), None)).await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    (resp.body["id"].as_i64().unwrap(), resp.cookie.unwrap())
}

async fn fire(app: &axum::Router, cookie: &str, id: i64, event: &str) -> TestResponse {
    let body = json!({ "event": event });
    send(
        app,
        request(
            "POST",
            &format!("/admin/commissions/{id}/transition"),
            Some(&body),
            Some(cookie),
        ),
    )
    .await
}

// ============================================================================
// Commission lifecycle over HTTP
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_commission_flow_between_admin_and_customer() {
    let (app, pool) = database_app().await;
    let run = unique();

    let admin_email = format!("coco+{run}@stainedglass.com");
    create_admin(&pool, &admin_email).await;
    let admin = login(&app, &admin_email, "adminpassword123").await;

    let (customer_id, customer) = register(&app, &format!("customer+{run}@example.com")).await;

    // Admin opens a commission for the customer.
    let body = json!({
        "user_id": customer_id,
        "title": "Custom Kitchen Window",
        "internal_notes": "Uses leftover cathedral glass",
        "estimated_price": "1200.00",
        "deposit_amount": "300.00",
    });
    let resp = send(
        &app,
        request("POST", "/admin/commissions", Some(&body), Some(&admin)),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    assert_eq!(resp.body["status"], "inquiry");
    let id = resp.body["id"].as_i64().unwrap();

    // Valid, invalid, and unknown events.
    let resp = fire(&app, &admin, id, "provide_quote").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "quoted");
    assert_eq!(resp.body["summary"]["label"], "Quoted");

    let resp = fire(&app, &admin, id, "deliver").await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["status"], "quoted");

    let resp = fire(&app, &admin, id, "approve").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    // Event names are matched exactly.
    let resp = fire(&app, &admin, id, " accept ").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "Invalid action.");

    // Customers cannot reach the back-office.
    let resp = fire(&app, &customer, id, "accept").await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    // One visible note and one internal note.
    for (title, visible) in [("Design approved!", true), ("Check lead stock", false)] {
        let body = json!({
            "title": title,
            "notify_customer": false,
            "visible_to_customer": visible,
        });
        let resp = send(
            &app,
            request(
                "POST",
                &format!("/admin/commissions/{id}/updates"),
                Some(&body),
                Some(&admin),
            ),
        )
        .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    }

    // The owner sees the commission without internal details.
    let resp = send(
        &app,
        request("GET", &format!("/portal/commissions/{id}"), None, Some(&customer)),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["internal_notes"], Value::Null);
    assert_eq!(resp.body["deposit_outstanding"], true);
    let titles: Vec<_> = resp.body["updates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["title"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(titles, ["Design approved!"]);
    assert_eq!(resp.body["updates"][0]["author_name"], "Coco Glass");

    // Another customer gets nothing.
    let (_, stranger) = register(&app, &format!("stranger+{run}@example.com")).await;
    let resp = send(
        &app,
        request("GET", &format!("/portal/commissions/{id}"), None, Some(&stranger)),
    )
    .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Contact inbox
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_contact_inquiry_reaches_the_inbox() {
    let (app, pool) = database_app().await;
    let run = unique();

    let body = json!({
        "name": "Rose Window",
        "email": format!("rose+{run}@example.com"),
        "subject": "  ",
        "message": "I'd like a transom panel for my front door.",
    });
    let resp = send(&app, request("POST", "/contact", Some(&body), None)).await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    let id = resp.body["id"].as_i64().unwrap();

    let admin_email = format!("coco+{run}@stainedglass.com");
    create_admin(&pool, &admin_email).await;
    let admin = login(&app, &admin_email, "adminpassword123").await;

    let resp = send(
        &app,
        request("GET", &format!("/admin/contact_inquiries/{id}"), None, Some(&admin)),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["status"], "pending");
    assert_eq!(resp.body["subject"], Value::Null);

    let path = format!("/admin/contact_inquiries/{id}/mark_responded");
    let first = send(&app, request("POST", &path, None, Some(&admin))).await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["status"], "responded");

    let second = send(&app, request("POST", &path, None, Some(&admin))).await;
    assert_eq!(second.body["responded_at"], first.body["responded_at"]);
}
