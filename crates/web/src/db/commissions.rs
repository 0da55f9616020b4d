//! Commission repository.
//!
//! Status changes go through [`CommissionRepository::lock`] and
//! [`CommissionRepository::save_transition`] inside one transaction, so the
//! status and its side-effect dates are written together or not at all.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use cocos_glass_core::{
    Commission, CommissionDetails, CommissionId, CommissionStatus, Email, Price, Scope, UserId,
};

use super::{RepositoryError, ScopeColumns, push_scope};

const COMMISSION_COLUMNS: &str = "c.id, c.user_id, c.status, c.title, c.description, \
     c.customer_notes, c.internal_notes, c.estimated_start_date, c.estimated_completion_date, \
     c.actual_start_date, c.actual_completion_date, c.delivered_at, c.estimated_price, \
     c.final_price, c.deposit_amount, c.deposit_paid, c.deposit_paid_at, c.dimensions, \
     c.location, c.created_at, c.updated_at";

pub(crate) const COMMISSION_SCOPE: ScopeColumns = ScopeColumns {
    owner: Some("c.user_id"),
    published: None,
    visible: None,
    account: None,
};

/// Internal row type for commission queries.
#[derive(Debug, sqlx::FromRow)]
struct CommissionRow {
    id: CommissionId,
    user_id: UserId,
    status: CommissionStatus,
    title: String,
    description: Option<String>,
    customer_notes: Option<String>,
    internal_notes: Option<String>,
    estimated_start_date: Option<NaiveDate>,
    estimated_completion_date: Option<NaiveDate>,
    actual_start_date: Option<NaiveDate>,
    actual_completion_date: Option<NaiveDate>,
    delivered_at: Option<NaiveDate>,
    estimated_price: Option<Price>,
    final_price: Option<Price>,
    deposit_amount: Option<Price>,
    deposit_paid: bool,
    deposit_paid_at: Option<NaiveDate>,
    dimensions: Option<String>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommissionRow> for Commission {
    fn from(row: CommissionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            details: CommissionDetails {
                title: row.title,
                description: row.description,
                customer_notes: row.customer_notes,
                internal_notes: row.internal_notes,
                estimated_start_date: row.estimated_start_date,
                estimated_completion_date: row.estimated_completion_date,
                estimated_price: row.estimated_price,
                final_price: row.final_price,
                deposit_amount: row.deposit_amount,
                dimensions: row.dimensions,
                location: row.location,
            },
            actual_start_date: row.actual_start_date,
            actual_completion_date: row.actual_completion_date,
            delivered_at: row.delivered_at,
            deposit_paid: row.deposit_paid,
            deposit_paid_at: row.deposit_paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Filters for commission listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionFilter {
    pub status: Option<CommissionStatus>,
    /// Only commissions that are neither delivered nor cancelled.
    pub active: bool,
    pub user: Option<UserId>,
}

/// Repository for commission database operations.
pub struct CommissionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommissionRepository<'a> {
    /// Create a new commission repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List commissions inside `scope`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: Scope,
        filter: CommissionFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Commission>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMMISSION_COLUMNS} FROM commissions c WHERE "
        ));
        push_scope(&mut qb, scope, COMMISSION_SCOPE);
        if let Some(status) = filter.status {
            qb.push(" AND c.status = ").push_bind(status);
        }
        if filter.active {
            qb.push(" AND c.status NOT IN ('delivered', 'cancelled')");
        }
        if let Some(user) = filter.user {
            qb.push(" AND c.user_id = ").push_bind(user);
        }
        qb.push(" ORDER BY c.created_at DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb.build_query_as::<CommissionRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Find a commission by id, only if it falls inside `scope`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        scope: Scope,
        id: CommissionId,
    ) -> Result<Option<Commission>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {COMMISSION_COLUMNS} FROM commissions c WHERE "
        ));
        push_scope(&mut qb, scope, COMMISSION_SCOPE);
        qb.push(" AND c.id = ").push_bind(id);

        let row = qb
            .build_query_as::<CommissionRow>()
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Get a commission by id, unscoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CommissionId) -> Result<Option<Commission>, RepositoryError> {
        self.find(Scope::All, id).await
    }

    /// Lock a commission row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock(
        conn: &mut PgConnection,
        id: CommissionId,
    ) -> Result<Option<Commission>, RepositoryError> {
        let row = sqlx::query_as::<_, CommissionRow>(&format!(
            "SELECT {COMMISSION_COLUMNS} FROM commissions c WHERE c.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Persist the status and lifecycle dates of a commission that has just
    /// been transitioned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the commission doesn't exist.
    pub async fn save_transition(
        conn: &mut PgConnection,
        commission: &Commission,
    ) -> Result<Commission, RepositoryError> {
        let row = sqlx::query_as::<_, CommissionRow>(&format!(
            r"
            UPDATE commissions AS c
            SET status = $2, actual_start_date = $3, actual_completion_date = $4,
                delivered_at = $5, deposit_paid = $6, deposit_paid_at = $7, updated_at = NOW()
            WHERE c.id = $1
            RETURNING {COMMISSION_COLUMNS}
            "
        ))
        .bind(commission.id)
        .bind(commission.status)
        .bind(commission.actual_start_date)
        .bind(commission.actual_completion_date)
        .bind(commission.delivered_at)
        .bind(commission.deposit_paid)
        .bind(commission.deposit_paid_at)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Create a commission in the `inquiry` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owning user doesn't exist.
    pub async fn create(
        &self,
        user_id: UserId,
        details: &CommissionDetails,
        deposit_paid: bool,
    ) -> Result<Commission, RepositoryError> {
        let row = sqlx::query_as::<_, CommissionRow>(&format!(
            r"
            INSERT INTO commissions AS c (
                user_id, status, title, description, customer_notes, internal_notes,
                estimated_start_date, estimated_completion_date, estimated_price, final_price,
                deposit_amount, deposit_paid, dimensions, location
            )
            VALUES ($1, 'inquiry', $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COMMISSION_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(details.title.trim())
        .bind(details.description.as_deref())
        .bind(details.customer_notes.as_deref())
        .bind(details.internal_notes.as_deref())
        .bind(details.estimated_start_date)
        .bind(details.estimated_completion_date)
        .bind(details.estimated_price)
        .bind(details.final_price)
        .bind(details.deposit_amount)
        .bind(deposit_paid)
        .bind(details.dimensions.as_deref())
        .bind(details.location.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(on_missing_user)?;

        Ok(row.into())
    }

    /// Update the editable fields of a commission. The status is untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the commission or the new
    /// owning user doesn't exist.
    pub async fn update(
        &self,
        id: CommissionId,
        user_id: UserId,
        details: &CommissionDetails,
        deposit_paid: Option<bool>,
    ) -> Result<Commission, RepositoryError> {
        let row = sqlx::query_as::<_, CommissionRow>(&format!(
            r"
            UPDATE commissions AS c
            SET user_id = $2, title = $3, description = $4, customer_notes = $5,
                internal_notes = $6, estimated_start_date = $7, estimated_completion_date = $8,
                estimated_price = $9, final_price = $10, deposit_amount = $11,
                deposit_paid = COALESCE($12, c.deposit_paid), dimensions = $13, location = $14,
                updated_at = NOW()
            WHERE c.id = $1
            RETURNING {COMMISSION_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(details.title.trim())
        .bind(details.description.as_deref())
        .bind(details.customer_notes.as_deref())
        .bind(details.internal_notes.as_deref())
        .bind(details.estimated_start_date)
        .bind(details.estimated_completion_date)
        .bind(details.estimated_price)
        .bind(details.final_price)
        .bind(details.deposit_amount)
        .bind(deposit_paid)
        .bind(details.dimensions.as_deref())
        .bind(details.location.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(on_missing_user)?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a commission and, through the foreign key, its updates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the commission doesn't exist.
    pub async fn delete(&self, id: CommissionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM commissions WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Email address of a commission's owner, if the owner still exists
    /// and the stored address parses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owner_email(&self, id: CommissionId) -> Result<Option<Email>, RepositoryError> {
        let email: Option<String> = sqlx::query_scalar(
            "SELECT u.email FROM commissions c JOIN users u ON u.id = c.user_id WHERE c.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(email.and_then(|e| Email::parse(&e).ok()))
    }
}

fn on_missing_user(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}
