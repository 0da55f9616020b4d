//! Account and sign-in failures.

use thiserror::Error;

use cocos_glass_core::{EmailError, ValidationErrors};

use crate::db::RepositoryError;

/// Why registering, signing in, or setting a password failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Unknown address or wrong password; callers must not tell them apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Another account already uses the address.
    #[error("email already registered")]
    EmailTaken,

    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// Name or phone failed validation.
    #[error("{0}")]
    Profile(ValidationErrors),

    #[error("account lookup failed: {0}")]
    Repository(#[from] RepositoryError),

    /// argon2 could not produce a hash.
    #[error("could not hash password")]
    Hashing,
}
