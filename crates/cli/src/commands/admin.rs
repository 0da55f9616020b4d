//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! cg-cli admin create -e coco@stainedglass.com -p 'a long password' -f Coco -l Glass
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use cocos_glass_core::{Role, UserProfile};
use cocos_glass_web::services::{AuthError, AuthService};
use thiserror::Error;

use crate::ConnectError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Account creation was rejected.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create a new admin account.
///
/// The account is an ordinary password account holding the admin role; it
/// signs in through the same `/auth/login` endpoint as customers.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the email, password, or names are invalid, the
/// address is already registered, or the database is unreachable.
pub async fn create_user(
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<i64, AdminError> {
    let pool = crate::connect().await?;

    let profile = UserProfile {
        first_name: first_name.trim().to_owned(),
        last_name: last_name.trim().to_owned(),
        phone: None,
    };

    tracing::info!("Creating admin account: {}", email);

    let user = AuthService::new(&pool)
        .create_user(email, password, &profile, Role::Admin)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.as_i64())
}
