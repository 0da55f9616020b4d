//! HTTP route handlers. Every endpoint speaks JSON.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Liveness check
//! GET  /health/ready                     - Readiness check (database)
//!
//! # Auth (no authorization guard)
//! POST /auth/register                    - Create a customer account
//! POST /auth/login                       - Sign in
//! POST /auth/logout                      - Sign out
//! GET  /auth/me                          - Current account
//!
//! # Contact (no authorization guard)
//! POST /contact                          - Submit the contact form
//!
//! # Gallery
//! GET  /gallery                          - Works, 12 per page (?category=&page=)
//! GET  /gallery/{slug}                   - One work with related works
//! GET  /gallery/category/{slug}          - Works in one category
//! GET  /categories                       - Categories with published works
//!
//! # Portal (signed in)
//! GET  /portal                           - Active and completed commissions
//! GET  /portal/commissions               - All own commissions
//! GET  /portal/commissions/{id}          - Commission with visible timeline
//!
//! # Admin (admin role)
//! GET  /admin                            - Dashboard
//! *    /admin/works[/{id}]               - CRUD, publish, feature, reorder
//! *    /admin/categories[/{id}]          - CRUD
//! *    /admin/commissions[/{id}]         - CRUD
//! POST /admin/commissions/{id}/transition
//! *    /admin/commissions/{id}/updates[/{update_id}]
//! *    /admin/contact_inquiries[/{id}]   - Inbox, notes, mark_responded, archive
//! *    /admin/users[/{id}]               - Accounts
//! ```
//!
//! Everything except health, auth, and contact runs under
//! [`verify_authorization`].

pub mod admin;
pub mod auth;
pub mod contact;
pub mod gallery;
pub mod portal;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::middleware::verify_authorization;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the gallery routes router.
pub fn gallery_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(gallery::index))
        .route("/category/{slug}", get(gallery::category))
        .route("/{slug}", get(gallery::show))
}

/// Create the portal routes router.
pub fn portal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(portal::dashboard))
        .route("/commissions", get(portal::index))
        .route("/commissions/{id}", get(portal::show))
}

/// Create all routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    let guarded = Router::new()
        .nest("/gallery", gallery_routes())
        .route("/categories", get(gallery::categories))
        .nest("/portal", portal_routes())
        .nest("/admin", admin::routes(state))
        .layer(from_fn(verify_authorization));

    Router::new()
        .nest("/auth", auth_routes())
        .route("/contact", post(contact::create))
        .merge(guarded)
}
