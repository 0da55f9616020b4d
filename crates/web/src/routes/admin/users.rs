//! Account management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use cocos_glass_core::{Action, Commission, Role, User, UserId, UserProfile, Validate};

use crate::db::commissions::CommissionFilter;
use crate::db::{CommissionRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}

/// Update request body. The role is optional so profile-only edits leave
/// it alone.
#[derive(Debug, Deserialize)]
pub struct UserForm {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub commissions: Vec<Commission>,
}

/// GET /admin/users?role=
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn index(
    State(state): State<AppState>,
    authz: Authz,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>> {
    authz.authorize_collection::<User>(Action::Index)?;
    let users = UserRepository::new(state.pool())
        .list(authz.scope::<User>(), query.role)
        .await?;
    Ok(Json(users))
}

/// A user with their commissions.
///
/// GET /admin/users/{id}
///
/// # Errors
///
/// Returns 404 if the user doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetail>> {
    let user = load(&state, id).await?;
    authz.authorize_record(Action::Show, &user)?;

    let filter = CommissionFilter {
        user: Some(user.id),
        ..CommissionFilter::default()
    };
    let commissions = CommissionRepository::new(state.pool())
        .list(authz.scope::<Commission>(), filter, None)
        .await?;

    Ok(Json(UserDetail { user, commissions }))
}

/// PUT /admin/users/{id}
///
/// # Errors
///
/// Returns 404 if the user doesn't exist, 422 if the profile is invalid.
pub async fn update(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<UserId>,
    Json(form): Json<UserForm>,
) -> Result<Json<User>> {
    let user = load(&state, id).await?;
    authz.authorize_record(Action::Update, &user)?;
    form.profile.validate()?;

    let role = form.role.unwrap_or(user.role);
    let updated = UserRepository::new(state.pool())
        .update(id, &form.profile, role)
        .await?;
    if updated.role != user.role {
        tracing::info!(user_id = %id, from = %user.role, to = %updated.role, "User role changed");
    }
    Ok(Json(updated))
}

/// Admins can't delete their own account.
///
/// DELETE /admin/users/{id}
///
/// # Errors
///
/// Returns 404 if the user doesn't exist, 403 for the acting admin.
pub async fn destroy(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    let user = load(&state, id).await?;
    authz.authorize_record(Action::Destroy, &user)?;

    UserRepository::new(state.pool()).delete(id).await?;
    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load(state: &AppState, id: UserId) -> Result<User> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id}")))
}
