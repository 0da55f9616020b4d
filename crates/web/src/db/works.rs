//! Work repository: the gallery and its admin management.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use cocos_glass_core::catalog::{slugify, unique_slug};
use cocos_glass_core::{CategoryId, Scope, Work, WorkDetails, WorkId};

use super::{RepositoryError, ScopeColumns, push_scope};

const WORK_COLUMNS: &str = "w.id, w.slug, w.title, w.description, w.dimensions, w.medium, \
     w.year_created, w.published, w.featured, w.position, w.created_at, w.updated_at";

const WORK_SCOPE: ScopeColumns = ScopeColumns {
    owner: None,
    published: Some("w.published"),
    visible: None,
    account: None,
};

/// Internal row type for work queries.
#[derive(Debug, sqlx::FromRow)]
struct WorkRow {
    id: WorkId,
    slug: String,
    title: String,
    description: Option<String>,
    dimensions: Option<String>,
    medium: Option<String>,
    year_created: Option<i32>,
    published: bool,
    featured: bool,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WorkRow> for Work {
    fn from(row: WorkRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            details: WorkDetails {
                title: row.title,
                description: row.description,
                dimensions: row.dimensions,
                medium: row.medium,
                year_created: row.year_created,
            },
            published: row.published,
            featured: row.featured,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Filters for work listings. `None` means "don't filter".
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkFilter {
    pub category: Option<CategoryId>,
    pub published: Option<bool>,
    pub featured: Option<bool>,
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// The 1-based page `number` of `per_page` items.
    #[must_use]
    pub fn number(number: u32, per_page: i64) -> Self {
        let number = i64::from(number.max(1));
        Self {
            limit: per_page,
            offset: (number - 1) * per_page,
        }
    }
}

/// Fields an admin submits for a work.
#[derive(Debug, Clone)]
pub struct WorkChanges<'a> {
    pub details: &'a WorkDetails,
    pub published: bool,
    pub featured: bool,
    pub category_ids: &'a [CategoryId],
}

/// Repository for work database operations.
pub struct WorkRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkRepository<'a> {
    /// Create a new work repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope, filter: WorkFilter) {
        qb.push(" WHERE ");
        push_scope(qb, scope, WORK_SCOPE);
        if let Some(category) = filter.category {
            qb.push(
                " AND EXISTS (SELECT 1 FROM work_categories wc WHERE wc.work_id = w.id AND wc.category_id = ",
            )
            .push_bind(category)
            .push(")");
        }
        if let Some(published) = filter.published {
            qb.push(" AND w.published = ").push_bind(published);
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND w.featured = ").push_bind(featured);
        }
    }

    /// List works inside `scope`, ordered by position then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: Scope,
        filter: WorkFilter,
        page: Option<Page>,
    ) -> Result<Vec<Work>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {WORK_COLUMNS} FROM works w"));
        Self::push_filters(&mut qb, scope, filter);
        qb.push(" ORDER BY w.position ASC, w.created_at DESC");
        if let Some(page) = page {
            qb.push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset);
        }

        let rows = qb.build_query_as::<WorkRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count works inside `scope` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, scope: Scope, filter: WorkFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM works w");
        Self::push_filters(&mut qb, scope, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Find a work by slug, only if it falls inside `scope`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_slug(&self, scope: Scope, slug: &str) -> Result<Option<Work>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {WORK_COLUMNS} FROM works w"));
        Self::push_filters(&mut qb, scope, WorkFilter::default());
        qb.push(" AND w.slug = ").push_bind(slug.to_owned());

        let row = qb.build_query_as::<WorkRow>().fetch_optional(self.pool).await?;
        Ok(row.map(Into::into))
    }

    /// Get a work by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: WorkId) -> Result<Option<Work>, RepositoryError> {
        let row = sqlx::query_as::<_, WorkRow>(&format!(
            "SELECT {WORK_COLUMNS} FROM works w WHERE w.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Up to `limit` other works in `scope` sharing a category with `work`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        scope: Scope,
        work: WorkId,
        limit: i64,
    ) -> Result<Vec<Work>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {WORK_COLUMNS} FROM works w"));
        Self::push_filters(&mut qb, scope, WorkFilter::default());
        qb.push(" AND w.id <> ")
            .push_bind(work)
            .push(
                " AND EXISTS (SELECT 1 FROM work_categories mine \
                 JOIN work_categories theirs ON theirs.category_id = mine.category_id \
                 WHERE mine.work_id = ",
            )
            .push_bind(work)
            .push(" AND theirs.work_id = w.id)")
            .push(" ORDER BY w.position ASC, w.created_at DESC LIMIT ")
            .push_bind(limit);

        let rows = qb.build_query_as::<WorkRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Category ids a work is tagged with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_ids(&self, work: WorkId) -> Result<Vec<CategoryId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, CategoryId>(
            "SELECT category_id FROM work_categories WHERE work_id = $1 ORDER BY category_id",
        )
        .bind(work)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    /// Create a work with a unique slug derived from its title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a concurrent insert took the slug.
    pub async fn create(&self, changes: &WorkChanges<'_>) -> Result<Work, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let slug = available_slug(&mut tx, &changes.details.title, None).await?;

        let row = sqlx::query_as::<_, WorkRow>(&format!(
            r"
            INSERT INTO works AS w (slug, title, description, dimensions, medium, year_created, published, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {WORK_COLUMNS}
            "
        ))
        .bind(&slug)
        .bind(changes.details.title.trim())
        .bind(changes.details.description.as_deref())
        .bind(changes.details.dimensions.as_deref())
        .bind(changes.details.medium.as_deref())
        .bind(changes.details.year_created)
        .bind(changes.published)
        .bind(changes.featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::on_unique("slug already exists"))?;

        replace_categories(&mut tx, row.id, changes.category_ids).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Update a work. The slug follows the title when the title changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work doesn't exist.
    pub async fn update(&self, id: WorkId, changes: &WorkChanges<'_>) -> Result<Work, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT title FROM works WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or(RepositoryError::NotFound)?;

        let slug = if current.trim() == changes.details.title.trim() {
            None
        } else {
            Some(available_slug(&mut tx, &changes.details.title, Some(id)).await?)
        };

        let row = sqlx::query_as::<_, WorkRow>(&format!(
            r"
            UPDATE works AS w
            SET slug = COALESCE($2, w.slug), title = $3, description = $4, dimensions = $5,
                medium = $6, year_created = $7, published = $8, featured = $9, updated_at = NOW()
            WHERE w.id = $1
            RETURNING {WORK_COLUMNS}
            "
        ))
        .bind(id)
        .bind(slug)
        .bind(changes.details.title.trim())
        .bind(changes.details.description.as_deref())
        .bind(changes.details.dimensions.as_deref())
        .bind(changes.details.medium.as_deref())
        .bind(changes.details.year_created)
        .bind(changes.published)
        .bind(changes.featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::on_unique("slug already exists"))?;

        replace_categories(&mut tx, id, changes.category_ids).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    /// Set the published flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work doesn't exist.
    pub async fn set_published(&self, id: WorkId, published: bool) -> Result<Work, RepositoryError> {
        self.set_flag("published", id, published).await
    }

    /// Set the featured flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work doesn't exist.
    pub async fn set_featured(&self, id: WorkId, featured: bool) -> Result<Work, RepositoryError> {
        self.set_flag("featured", id, featured).await
    }

    async fn set_flag(&self, column: &'static str, id: WorkId, value: bool) -> Result<Work, RepositoryError> {
        let row = sqlx::query_as::<_, WorkRow>(&format!(
            r"
            UPDATE works AS w SET {column} = $2, updated_at = NOW()
            WHERE w.id = $1
            RETURNING {WORK_COLUMNS}
            "
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Give each listed work its index in `ordered` as its position.
    /// Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails; no
    /// positions change in that case.
    pub async fn reorder(&self, ordered: &[WorkId]) -> Result<(), RepositoryError> {
        let ids: Vec<i64> = ordered.iter().map(WorkId::as_i64).collect();

        sqlx::query(
            r"
            UPDATE works AS w SET position = o.position - 1, updated_at = NOW()
            FROM UNNEST($1::BIGINT[]) WITH ORDINALITY AS o(id, position)
            WHERE w.id = o.id
            ",
        )
        .bind(ids)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Delete a work and its category tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the work doesn't exist.
    pub async fn delete(&self, id: WorkId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM works WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// A slug for `title` not used by any other work.
async fn available_slug(
    conn: &mut PgConnection,
    title: &str,
    except: Option<WorkId>,
) -> Result<String, RepositoryError> {
    let mut base = slugify(title);
    if base.is_empty() {
        base = "work".to_owned();
    }

    let taken: Vec<String> = sqlx::query_scalar(
        r"
        SELECT slug FROM works
        WHERE (slug = $1 OR slug LIKE $1 || '-%') AND ($2::BIGINT IS NULL OR id <> $2)
        ",
    )
    .bind(&base)
    .bind(except)
    .fetch_all(&mut *conn)
    .await?;

    Ok(unique_slug(&base, &taken))
}

async fn replace_categories(
    conn: &mut PgConnection,
    work: WorkId,
    category_ids: &[CategoryId],
) -> Result<(), RepositoryError> {
    let ids: Vec<i64> = category_ids.iter().map(CategoryId::as_i64).collect();

    sqlx::query("DELETE FROM work_categories WHERE work_id = $1")
        .bind(work)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r"
        INSERT INTO work_categories (work_id, category_id)
        SELECT $1, c.id FROM categories c WHERE c.id = ANY($2)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(work)
    .bind(ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
