//! Integration tests for Coco's Glass.
//!
//! # Running Tests
//!
//! ```bash
//! # Router and core tests (no database needed)
//! cargo test -p cocos-glass-integration-tests
//!
//! # Full flows against a migrated database
//! DATABASE_URL=postgres://localhost/cocos_glass_test \
//!     cargo test -p cocos-glass-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `commission_lifecycle` - State machine and notification decisions
//! - `authorization` - Policy tables and scopes through the public API
//! - `http_api` - Router behavior that never reaches the database
//! - `authorization_guard` - The missing-check guard on a bare router
//! - `database_flow` - End-to-end flows (ignored unless a database is up)

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use cocos_glass_core::Email;
use cocos_glass_web::config::{AppConfig, StudioConfig};
use cocos_glass_web::services::Notifier;
use cocos_glass_web::state::AppState;

/// Database used when `DATABASE_URL` is not set.
const DEFAULT_TEST_DATABASE: &str = "postgres://localhost/cocos_glass_test";

/// Configuration for tests: no SMTP, no Sentry.
///
/// # Panics
///
/// Panics if the built-in addresses fail to parse.
#[must_use]
pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: SecretString::from(database_url.to_owned()),
        host: "127.0.0.1".parse().expect("valid address"),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("k3v9-Qp2x!Lr7Zt8-Mw4Yb6Nc1Hd5Jf0".to_owned()),
        studio: StudioConfig {
            business_name: "Coco's Stained Glass".to_owned(),
            from_address: Email::parse("hello@stainedglass.com").expect("valid email"),
            admin_email: Email::parse("coco@stainedglass.com").expect("valid email"),
        },
        smtp: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Application state over a pool that never connects.
///
/// # Panics
///
/// Panics if the database URL cannot be parsed.
#[must_use]
pub fn offline_state() -> AppState {
    let config = test_config(DEFAULT_TEST_DATABASE);
    let pool = PgPoolOptions::new()
        .connect_lazy(DEFAULT_TEST_DATABASE)
        .expect("lazy pool");
    AppState::new(config, pool, Notifier::disabled())
}

/// The full router over a pool that never connects.
///
/// Only requests rejected before any query (missing sign-in, invalid
/// input) may be sent through it.
#[must_use]
pub fn offline_app() -> Router {
    cocos_glass_web::app(offline_state())
}

/// The full router over a migrated database named by `DATABASE_URL`.
///
/// # Panics
///
/// Panics if the database is unreachable or migrations fail.
pub async fn database_app() -> (Router, sqlx::PgPool) {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE.to_owned());
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../web/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(test_config(&url), pool.clone(), Notifier::disabled());
    (cocos_glass_web::app(state), pool)
}

/// A response reduced to what tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// `name=value` of the session cookie, if one was set.
    pub cookie: Option<String>,
}

/// Send one request through the router.
///
/// # Panics
///
/// Panics if the router fails or the body cannot be read.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.expect("router error");
    let status = response.status();
    let cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("cg_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    TestResponse {
        status,
        body,
        cookie,
    }
}

/// Build a request with an optional JSON body and session cookie.
///
/// # Panics
///
/// Panics if the request parts are invalid.
#[must_use]
pub fn request(method: &str, uri: &str, body: Option<&Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}
