//! Studio back-office, admin role only.
//!
//! [`RequireAdmin`] guards the whole namespace; each handler still asks the
//! policy engine before acting.

pub mod categories;
pub mod commission_updates;
pub mod commissions;
pub mod dashboard;
pub mod inquiries;
pub mod users;
pub mod works;

use axum::{
    Router,
    middleware::from_extractor_with_state,
    routing::{get, post, put},
};

use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Create the admin routes router.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        // Works
        .route("/works", get(works::index).post(works::create))
        .route("/works/reorder", post(works::reorder))
        .route(
            "/works/{id}",
            get(works::show).put(works::update).delete(works::destroy),
        )
        .route("/works/{id}/publish", post(works::publish))
        .route("/works/{id}/unpublish", post(works::unpublish))
        .route("/works/{id}/feature", post(works::feature))
        .route("/works/{id}/unfeature", post(works::unfeature))
        // Categories
        .route("/categories", get(categories::index).post(categories::create))
        .route(
            "/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
        // Commissions
        .route(
            "/commissions",
            get(commissions::index).post(commissions::create),
        )
        .route(
            "/commissions/{id}",
            get(commissions::show)
                .put(commissions::update)
                .delete(commissions::destroy),
        )
        .route("/commissions/{id}/transition", post(commissions::transition))
        .route(
            "/commissions/{id}/updates",
            post(commission_updates::create),
        )
        .route(
            "/commissions/{id}/updates/{update_id}",
            put(commission_updates::update).delete(commission_updates::destroy),
        )
        // Contact inquiries
        .route("/contact_inquiries", get(inquiries::index))
        .route(
            "/contact_inquiries/{id}",
            get(inquiries::show)
                .put(inquiries::update)
                .delete(inquiries::destroy),
        )
        .route(
            "/contact_inquiries/{id}/mark_responded",
            post(inquiries::mark_responded),
        )
        .route("/contact_inquiries/{id}/archive", post(inquiries::archive))
        // Users
        .route("/users", get(users::index))
        .route(
            "/users/{id}",
            get(users::show).put(users::update).delete(users::destroy),
        )
        .route_layer(from_extractor_with_state::<RequireAdmin, _>(state.clone()))
}
