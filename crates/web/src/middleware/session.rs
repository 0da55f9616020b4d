//! Cookie sessions backed by `PostgreSQL`.
//!
//! The session only holds [`crate::models::CurrentUser`]; everything else
//! is re-read per request.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AppConfig;

pub const SESSION_COOKIE_NAME: &str = "cg_session";

/// Idle time after which a session lapses.
const IDLE_EXPIRY: Duration = Duration::days(7);

/// Signing key for the session cookie, stretched from `SESSION_SECRET`.
fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Build the session layer.
///
/// The cookie is signed with `SESSION_SECRET` and marked `Secure` whenever
/// the public base URL is https.
/// The `tower_sessions.session` table comes from the migrations, not from
/// the store at runtime.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AppConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(IDLE_EXPIRY))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable_per_secret() {
        let secret = SecretString::from("k3v9-Qp2x!Lr7Zt8-Mw4Yb6Nc1Hd5Jf0".to_owned());
        assert_eq!(signing_key(&secret).signing(), signing_key(&secret).signing());

        let other = SecretString::from("Zt8-Mw4Yb6Nc1Hd5Jf0-k3v9-Qp2x!Lr7".to_owned());
        assert_ne!(signing_key(&secret).signing(), signing_key(&other).signing());
    }
}
