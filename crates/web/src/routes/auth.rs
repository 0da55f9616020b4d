//! Authentication route handlers.
//!
//! Password registration and login for customers. Admin accounts use the
//! same login; they are created from the CLI.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use cocos_glass_core::{User, UserProfile};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RegisterForm {
    fn profile(&self) -> UserProfile {
        UserProfile {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned),
        }
    }
}

/// Create a customer account and sign it in.
///
/// POST /auth/register
///
/// # Errors
///
/// Returns 409 if the email is taken, 400 for a weak password or bad
/// email, 422 for an invalid name or phone.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(&form.email, &form.password, &form.profile())
        .await?;

    sign_in(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in with email and password.
///
/// POST /auth/login
///
/// # Errors
///
/// Returns 401 for an unknown email or wrong password; the two are not
/// distinguished.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<User>> {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::info!("Failed login attempt");
            return Err(e.into());
        }
    };

    sign_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

/// Sign out and destroy the session.
///
/// POST /auth/logout
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in account.
///
/// GET /auth/me
pub async fn me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

async fn sign_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_form_trims_profile() {
        let form: RegisterForm = serde_json::from_str(
            r#"{"email":"a@b.co","password":"longenough","first_name":" Ada ","last_name":"Lovelace","phone":"  "}"#,
        )
        .unwrap();
        let profile = form.profile();

        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.phone, None);
    }
}
