//! Aggregate counts for the admin dashboard.

use serde::Serialize;
use sqlx::PgPool;

use cocos_glass_core::CommissionStatus;

use super::RepositoryError;

/// Headline numbers on the admin dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DashboardCounts {
    pub pending_inquiries: i64,
    pub active_commissions: i64,
    pub works: i64,
    pub customers: i64,
}

/// Number of commissions in one status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: CommissionStatus,
    pub count: i64,
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the headline counts in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<DashboardCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r"
            SELECT
                (SELECT COUNT(*) FROM contact_inquiries WHERE status = 'pending') AS pending_inquiries,
                (SELECT COUNT(*) FROM commissions
                    WHERE status NOT IN ('delivered', 'cancelled')) AS active_commissions,
                (SELECT COUNT(*) FROM works) AS works,
                (SELECT COUNT(*) FROM users WHERE role = 'customer') AS customers
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }

    /// Commission counts grouped by status, in lifecycle order. Statuses
    /// with no commissions are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn commissions_by_status(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM commissions GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
