//! Contact inquiry repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use cocos_glass_core::{ContactInquiry, ContactInquiryId, Email, InquiryStatus, Scope};

use super::{RepositoryError, ScopeColumns, push_scope};

const INQUIRY_COLUMNS: &str = "i.id, i.name, i.email, i.phone, i.subject, i.message, i.status, \
     i.admin_notes, i.responded_at, i.created_at, i.updated_at";

/// Internal row type for contact inquiry queries.
#[derive(Debug, sqlx::FromRow)]
struct InquiryRow {
    id: ContactInquiryId,
    name: String,
    email: String,
    phone: Option<String>,
    subject: Option<String>,
    message: String,
    status: InquiryStatus,
    admin_notes: Option<String>,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InquiryRow> for ContactInquiry {
    type Error = RepositoryError;

    fn try_from(row: InquiryRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            phone: row.phone,
            subject: row.subject,
            message: row.message,
            status: row.status,
            admin_notes: row.admin_notes,
            responded_at: row.responded_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A validated submission ready to store.
#[derive(Debug, Clone)]
pub struct InquirySubmission<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub phone: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub message: &'a str,
}

/// Repository for contact inquiry database operations.
pub struct ContactInquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactInquiryRepository<'a> {
    /// Create a new contact inquiry repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new submission as `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        submission: &InquirySubmission<'_>,
    ) -> Result<ContactInquiry, RepositoryError> {
        let row = sqlx::query_as::<_, InquiryRow>(&format!(
            r"
            INSERT INTO contact_inquiries AS i (name, email, phone, subject, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INQUIRY_COLUMNS}
            "
        ))
        .bind(submission.name.trim())
        .bind(submission.email.as_str())
        .bind(submission.phone)
        .bind(submission.subject)
        .bind(submission.message)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// List inquiries inside `scope`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: Scope,
        status: Option<InquiryStatus>,
        limit: Option<i64>,
    ) -> Result<Vec<ContactInquiry>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {INQUIRY_COLUMNS} FROM contact_inquiries i WHERE "
        ));
        push_scope(&mut qb, scope, ScopeColumns::default());
        if let Some(status) = status {
            qb.push(" AND i.status = ").push_bind(status);
        }
        qb.push(" ORDER BY i.created_at DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb.build_query_as::<InquiryRow>().fetch_all(self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an inquiry by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: ContactInquiryId,
    ) -> Result<Option<ContactInquiry>, RepositoryError> {
        let row = sqlx::query_as::<_, InquiryRow>(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM contact_inquiries i WHERE i.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Persist the admin-editable state of an inquiry: status, response
    /// time, and notes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the inquiry doesn't exist.
    pub async fn save(&self, inquiry: &ContactInquiry) -> Result<ContactInquiry, RepositoryError> {
        let row = sqlx::query_as::<_, InquiryRow>(&format!(
            r"
            UPDATE contact_inquiries AS i
            SET status = $2, responded_at = $3, admin_notes = $4, updated_at = NOW()
            WHERE i.id = $1
            RETURNING {INQUIRY_COLUMNS}
            "
        ))
        .bind(inquiry.id)
        .bind(inquiry.status)
        .bind(inquiry.responded_at)
        .bind(inquiry.admin_notes.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete an inquiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the inquiry doesn't exist.
    pub async fn delete(&self, id: ContactInquiryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM contact_inquiries WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
