//! Commission update repository: the progress timeline.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use cocos_glass_core::{
    CommissionId, CommissionUpdate, CommissionUpdateId, NewCommissionUpdate, Scope, UserId,
};

use super::{RepositoryError, ScopeColumns, push_scope};

const UPDATE_COLUMNS: &str = "u.id, u.commission_id, u.user_id, u.title, u.body, \
     u.notify_customer, u.visible_to_customer, u.created_at, u.updated_at";

const UPDATE_SCOPE: ScopeColumns = ScopeColumns {
    owner: Some("c.user_id"),
    published: None,
    visible: Some("u.visible_to_customer"),
    account: None,
};

/// Internal row type for commission update queries.
#[derive(Debug, sqlx::FromRow)]
struct UpdateRow {
    id: CommissionUpdateId,
    commission_id: CommissionId,
    user_id: Option<UserId>,
    title: String,
    body: Option<String>,
    notify_customer: bool,
    visible_to_customer: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UpdateRow> for CommissionUpdate {
    fn from(row: UpdateRow) -> Self {
        Self {
            id: row.id,
            commission_id: row.commission_id,
            user_id: row.user_id,
            title: row.title,
            body: row.body,
            notify_customer: row.notify_customer,
            visible_to_customer: row.visible_to_customer,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuthoredRow {
    #[sqlx(flatten)]
    update: UpdateRow,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
}

/// An update with its author's name, when the author is still on file.
#[derive(Debug, Clone)]
pub struct AuthoredUpdate {
    pub update: CommissionUpdate,
    pub author_name: Option<String>,
}

impl From<AuthoredRow> for AuthoredUpdate {
    fn from(row: AuthoredRow) -> Self {
        let name = format!(
            "{} {}",
            row.author_first_name.unwrap_or_default().trim(),
            row.author_last_name.unwrap_or_default().trim()
        );
        let name = name.trim();
        Self {
            update: row.update.into(),
            author_name: (!name.is_empty()).then(|| name.to_owned()),
        }
    }
}

/// Repository for commission update database operations.
pub struct CommissionUpdateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommissionUpdateRepository<'a> {
    /// Create a new commission update repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Timeline of one commission inside `scope`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn timeline(
        &self,
        scope: Scope,
        commission: CommissionId,
    ) -> Result<Vec<AuthoredUpdate>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            r"
            SELECT {UPDATE_COLUMNS}, a.first_name AS author_first_name, a.last_name AS author_last_name
            FROM commission_updates u
            JOIN commissions c ON c.id = u.commission_id
            LEFT JOIN users a ON a.id = u.user_id
            WHERE "
        ));
        push_scope(&mut qb, scope, UPDATE_SCOPE);
        qb.push(" AND u.commission_id = ")
            .push_bind(commission)
            .push(" ORDER BY u.created_at DESC, u.id DESC");

        let rows = qb.build_query_as::<AuthoredRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get one update of a commission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        commission: CommissionId,
        id: CommissionUpdateId,
    ) -> Result<Option<CommissionUpdate>, RepositoryError> {
        let row = sqlx::query_as::<_, UpdateRow>(&format!(
            "SELECT {UPDATE_COLUMNS} FROM commission_updates u WHERE u.commission_id = $1 AND u.id = $2"
        ))
        .bind(commission)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Post an update on a commission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        commission: CommissionId,
        author: Option<UserId>,
        fields: &NewCommissionUpdate,
    ) -> Result<CommissionUpdate, RepositoryError> {
        let row = sqlx::query_as::<_, UpdateRow>(&format!(
            r"
            INSERT INTO commission_updates AS u
                (commission_id, user_id, title, body, notify_customer, visible_to_customer)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {UPDATE_COLUMNS}
            "
        ))
        .bind(commission)
        .bind(author)
        .bind(fields.title.trim())
        .bind(fields.body.as_deref())
        .bind(fields.notify_customer)
        .bind(fields.visible_to_customer)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Edit an update's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the update doesn't exist.
    pub async fn update(
        &self,
        id: CommissionUpdateId,
        fields: &NewCommissionUpdate,
    ) -> Result<CommissionUpdate, RepositoryError> {
        let row = sqlx::query_as::<_, UpdateRow>(&format!(
            r"
            UPDATE commission_updates AS u
            SET title = $2, body = $3, notify_customer = $4, visible_to_customer = $5,
                updated_at = NOW()
            WHERE u.id = $1
            RETURNING {UPDATE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(fields.title.trim())
        .bind(fields.body.as_deref())
        .bind(fields.notify_customer)
        .bind(fields.visible_to_customer)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the update doesn't exist.
    pub async fn delete(&self, id: CommissionUpdateId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM commission_updates WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_timeline_hides_internal_notes() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT u.id FROM commission_updates u WHERE ");
        push_scope(&mut qb, Scope::VisibleToOwner(UserId::new(4)), UPDATE_SCOPE);
        assert_eq!(
            qb.sql(),
            "SELECT u.id FROM commission_updates u WHERE \
             (c.user_id = $1 AND u.visible_to_customer = TRUE)"
        );
    }
}
