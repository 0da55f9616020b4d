//! The authorization guard on a bare router.
//!
//! Anonymous requests resolve without a session or a query, so these
//! handlers run against the offline state.

#![allow(clippy::unwrap_used)]

use axum::{Router, http::StatusCode, middleware::from_fn, routing::get};

use cocos_glass_core::{Action, Category, Work};
use cocos_glass_integration_tests::{offline_state, request, send};
use cocos_glass_web::error::Result;
use cocos_glass_web::middleware::{Authz, verify_authorization};

async fn skips_authorize(_authz: Authz) -> &'static str {
    "done"
}

async fn lists_without_scope(authz: Authz) -> Result<&'static str> {
    authz.authorize_collection::<Work>(Action::Index)?;
    Ok("listed")
}

async fn lists_with_scope(authz: Authz) -> Result<&'static str> {
    authz.authorize_collection::<Work>(Action::Index)?;
    let _scope = authz.scope::<Work>();
    Ok("listed")
}

async fn shows_record(authz: Authz) -> Result<&'static str> {
    authz.authorize_collection::<Category>(Action::Show)?;
    Ok("shown")
}

async fn creates_record(authz: Authz) -> Result<&'static str> {
    authz.authorize_collection::<Work>(Action::Create)?;
    Ok("created")
}

fn guarded() -> Router {
    Router::new()
        .route("/skips", get(skips_authorize))
        .route("/unscoped", get(lists_without_scope))
        .route("/scoped", get(lists_with_scope))
        .route("/show", get(shows_record))
        .route("/create", get(creates_record))
        .layer(from_fn(verify_authorization))
        .with_state(offline_state())
}

#[tokio::test]
async fn test_handler_that_skips_authorize_fails() {
    let resp = send(&guarded(), request("GET", "/skips", None, None)).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["error"], "Internal server error");
}

#[tokio::test]
async fn test_listing_without_scope_fails() {
    let resp = send(&guarded(), request("GET", "/unscoped", None, None)).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_listing_with_scope_passes() {
    let resp = send(&guarded(), request("GET", "/scoped", None, None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "listed");
}

#[tokio::test]
async fn test_non_listing_action_needs_no_scope() {
    let resp = send(&guarded(), request("GET", "/show", None, None)).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_denial_passes_through_unchanged() {
    let resp = send(&guarded(), request("GET", "/create", None, None)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}
