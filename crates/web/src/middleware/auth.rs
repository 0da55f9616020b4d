//! Authentication extractors.
//!
//! The session only remembers who signed in. Each request re-reads the
//! account so a deleted user or a changed role takes effect immediately;
//! the result is cached in request extensions for the other extractors.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use cocos_glass_core::{Actor, User};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// The signed-in account for this request, resolved once.
#[derive(Debug, Clone)]
struct ResolvedUser(Option<User>);

async fn resolve_user(parts: &mut Parts, state: &AppState) -> Result<Option<User>, AppError> {
    if let Some(ResolvedUser(user)) = parts.extensions.get::<ResolvedUser>() {
        return Ok(user.clone());
    }

    let current: Option<CurrentUser> = match parts.extensions.get::<Session>() {
        Some(session) => session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten(),
        None => None,
    };

    let user = match current {
        Some(current) => {
            let user = UserRepository::new(state.pool()).get_by_id(current.id).await?;
            if user.is_none() {
                tracing::info!(user_id = %current.id, "Session refers to a deleted user");
            }
            user
        }
        None => None,
    };

    if let Some(user) = &user {
        set_sentry_user(&user.id, Some(user.email.as_str()));
    }
    parts.extensions.insert(ResolvedUser(user.clone()));
    Ok(user)
}

/// Extractor for whoever is making the request; never rejects an
/// anonymous visitor.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        Ok(Self(Actor::from_session(
            user.map(|u| (u.id, u.role)),
        )))
    }
}

/// Error returned when a signed-in user (or an admin) is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not signed in.
    Unauthorized,
    /// Signed in, but not an admin.
    Forbidden,
    /// Resolving the session failed.
    Error(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "You need to sign in before continuing." })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "You are not authorized to perform this action." })),
            )
                .into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}

/// Extractor that requires a signed-in user of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await
            .map_err(AuthRejection::Error)?
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that requires a signed-in admin. Guards the whole admin
/// namespace.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin tried the admin area");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// The session id is cycled first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
