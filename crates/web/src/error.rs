//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding; clients only ever see a generic
//! message for them. Authorization denials never say why.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use cocos_glass_core::{NotAuthorized, TransitionError, ValidationErrors};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The policy denied the action.
    #[error("{0}")]
    NotAuthorized(#[from] NotAuthorized),

    /// A commission event was unknown or illegal from the current status.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// Submitted fields failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Profile(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Repository(_) | AuthError::Hashing => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotAuthorized(_) => StatusCode::FORBIDDEN,
            Self::Transition(TransitionError::UnknownEvent(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Transition(TransitionError::InvalidTransition { .. }) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            _ if self.is_server_error() => json!({ "error": "Internal server error" }),
            Self::Database(RepositoryError::NotFound) => json!({ "error": "Not found" }),
            Self::NotAuthorized(denied) => {
                tracing::warn!(action = %denied.action, resource = %denied.resource, "Access denied");
                json!({ "error": "You are not authorized to perform this action." })
            }
            Self::Transition(TransitionError::UnknownEvent(_)) => {
                json!({ "error": "Invalid action." })
            }
            Self::Transition(err) => json!({
                "error": "Could not perform this action.",
                "status": err.current_status(),
            }),
            Self::Validation(errors) => json!({
                "error": "Validation failed",
                "fields": errors,
            }),
            Self::Auth(err) => json!({ "error": auth_message(err) }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "Invalid credentials".to_string(),
        AuthError::EmailTaken => "An account with this email already exists".to_string(),
        AuthError::WeakPassword(msg) => msg.clone(),
        AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
        AuthError::Profile(errors) => errors.to_string(),
        AuthError::Repository(_) | AuthError::Hashing => "Authentication error".to_string(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use cocos_glass_core::{Action, CommissionStatus, ResourceKind};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("commission 12".to_string());
        assert_eq!(err.to_string(), "Not found: commission 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_authorized_is_generic() {
        let (status, body) = body_json(AppError::NotAuthorized(NotAuthorized {
            action: Action::Show,
            resource: ResourceKind::Commission,
        }))
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        let message = body["error"].as_str().unwrap();
        assert!(!message.contains("commission"));
        assert!(!message.contains("show"));
    }

    #[tokio::test]
    async fn test_transition_errors() {
        let (status, body) =
            body_json(AppError::Transition(TransitionError::UnknownEvent("teleport".into()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid action.");

        let (status, body) = body_json(AppError::Transition(TransitionError::InvalidTransition {
            event: cocos_glass_core::Event::Accept,
            current: CommissionStatus::Inquiry,
        }))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Could not perform this action.");
        assert_eq!(body["status"], "inquiry");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.required("title", "");
        let (status, body) = body_json(AppError::Validation(errors)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["title"][0], "can't be blank");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (_, body) = body_json(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["error"], "Internal server error");
    }
}
