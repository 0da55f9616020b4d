//! Database operations for `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Customer and admin accounts (argon2 password hashes)
//! - `categories`, `works`, `work_categories` - Portfolio
//! - `commissions` - Commissioned pieces and their lifecycle status
//! - `commission_updates` - Progress notes on a commission
//! - `contact_inquiries` - Contact-form submissions
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p cocos-glass-cli -- migrate
//! ```

pub mod categories;
pub mod commission_updates;
pub mod commissions;
pub mod contact_inquiries;
pub mod dashboard;
pub mod users;
pub mod works;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use cocos_glass_core::Scope;

pub use categories::CategoryRepository;
pub use commission_updates::CommissionUpdateRepository;
pub use commissions::CommissionRepository;
pub use contact_inquiries::ContactInquiryRepository;
pub use dashboard::DashboardRepository;
pub use users::UserRepository;
pub use works::WorkRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn on_unique(message: &str) -> impl FnOnce(sqlx::Error) -> Self + '_ {
        move |e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return Self::Conflict(message.to_owned());
            }
            Self::Database(e)
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Columns a table exposes to scope filters.
///
/// A scope that needs a column the table does not have matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeColumns {
    /// Column holding the owning user's id.
    pub owner: Option<&'static str>,
    /// Boolean publication flag.
    pub published: Option<&'static str>,
    /// Boolean customer-visibility flag.
    pub visible: Option<&'static str>,
    /// The account's own id column.
    pub account: Option<&'static str>,
}

/// Append `scope` as a boolean SQL expression.
///
/// Callers push the surrounding `WHERE` or `AND`.
pub fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope, columns: ScopeColumns) {
    match scope {
        Scope::All => {
            qb.push("TRUE");
        }
        Scope::None => {
            qb.push("FALSE");
        }
        Scope::Published => match columns.published {
            Some(published) => {
                qb.push(published).push(" = TRUE");
            }
            None => {
                qb.push("FALSE");
            }
        },
        Scope::OwnedBy(user_id) => match columns.owner {
            Some(owner) => {
                qb.push(owner).push(" = ").push_bind(user_id.as_i64());
            }
            None => {
                qb.push("FALSE");
            }
        },
        Scope::VisibleToOwner(user_id) => match (columns.owner, columns.visible) {
            (Some(owner), Some(visible)) => {
                qb.push("(")
                    .push(owner)
                    .push(" = ")
                    .push_bind(user_id.as_i64())
                    .push(" AND ")
                    .push(visible)
                    .push(" = TRUE)");
            }
            _ => {
                qb.push("FALSE");
            }
        },
        Scope::Only(user_id) => match columns.account {
            Some(account) => {
                qb.push(account).push(" = ").push_bind(user_id.as_i64());
            }
            None => {
                qb.push("FALSE");
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cocos_glass_core::UserId;

    const COMMISSIONS: ScopeColumns = ScopeColumns {
        owner: Some("c.user_id"),
        published: None,
        visible: None,
        account: None,
    };

    fn render(scope: Scope, columns: ScopeColumns) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM t WHERE ");
        push_scope(&mut qb, scope, columns);
        qb.sql().to_owned()
    }

    #[test]
    fn test_all_and_none() {
        assert_eq!(render(Scope::All, COMMISSIONS), "SELECT id FROM t WHERE TRUE");
        assert_eq!(render(Scope::None, COMMISSIONS), "SELECT id FROM t WHERE FALSE");
    }

    #[test]
    fn test_owned_by_binds_user() {
        assert_eq!(
            render(Scope::OwnedBy(UserId::new(7)), COMMISSIONS),
            "SELECT id FROM t WHERE c.user_id = $1"
        );
    }

    #[test]
    fn test_visible_to_owner() {
        let columns = ScopeColumns {
            owner: Some("c.user_id"),
            visible: Some("u.visible_to_customer"),
            ..ScopeColumns::default()
        };
        assert_eq!(
            render(Scope::VisibleToOwner(UserId::new(7)), columns),
            "SELECT id FROM t WHERE (c.user_id = $1 AND u.visible_to_customer = TRUE)"
        );
    }

    #[test]
    fn test_missing_column_matches_nothing() {
        assert_eq!(render(Scope::Published, COMMISSIONS), "SELECT id FROM t WHERE FALSE");
        assert_eq!(
            render(Scope::Only(UserId::new(1)), COMMISSIONS),
            "SELECT id FROM t WHERE FALSE"
        );
    }

    #[test]
    fn test_published() {
        let columns = ScopeColumns {
            published: Some("published"),
            ..ScopeColumns::default()
        };
        assert_eq!(
            render(Scope::Published, columns),
            "SELECT id FROM t WHERE published = TRUE"
        );
    }
}
