//! Category repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use cocos_glass_core::catalog::{slugify, unique_slug};
use cocos_glass_core::{Category, CategoryDetails, CategoryId, Scope};

use super::{RepositoryError, ScopeColumns, push_scope};

const CATEGORY_COLUMNS: &str =
    "c.id, c.slug, c.name, c.description, c.position, c.created_at, c.updated_at";

/// Internal row type for category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    slug: String,
    name: String,
    description: Option<String>,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            details: CategoryDetails {
                name: row.name,
                description: row.description,
            },
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories inside `scope`, ordered by position then name.
    ///
    /// With `with_published_works`, only categories tagging at least one
    /// published work are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        scope: Scope,
        with_published_works: bool,
    ) -> Result<Vec<Category>, RepositoryError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {CATEGORY_COLUMNS} FROM categories c WHERE "));
        push_scope(&mut qb, scope, ScopeColumns::default());
        if with_published_works {
            qb.push(
                " AND EXISTS (SELECT 1 FROM work_categories wc JOIN works w ON w.id = wc.work_id \
                 WHERE wc.category_id = c.id AND w.published = TRUE)",
            );
        }
        qb.push(" ORDER BY c.position ASC, c.name ASC");

        let rows = qb.build_query_as::<CategoryRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Number of published works tagged with a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_works_count(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM work_categories wc
            JOIN works w ON w.id = wc.work_id
            WHERE wc.category_id = $1 AND w.published = TRUE
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Create a category with a slug derived from its name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already used.
    pub async fn create(
        &self,
        details: &CategoryDetails,
        position: i32,
    ) -> Result<Category, RepositoryError> {
        let slug = self.available_slug(&details.name, None).await?;

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            INSERT INTO categories AS c (slug, name, description, position)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(slug)
        .bind(details.name.trim())
        .bind(details.description.as_deref())
        .bind(position)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::on_unique("name has already been taken"))?;

        Ok(row.into())
    }

    /// Update a category. The slug follows the name when the name changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the name is already used.
    pub async fn update(
        &self,
        id: CategoryId,
        details: &CategoryDetails,
        position: Option<i32>,
    ) -> Result<Category, RepositoryError> {
        let current = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;
        let slug = if current.details.name.trim() == details.name.trim() {
            current.slug
        } else {
            self.available_slug(&details.name, Some(id)).await?
        };

        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r"
            UPDATE categories AS c
            SET slug = $2, name = $3, description = $4,
                position = COALESCE($5, c.position), updated_at = NOW()
            WHERE c.id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(slug)
        .bind(details.name.trim())
        .bind(details.description.as_deref())
        .bind(position)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::on_unique("name has already been taken"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category; works keep existing, untagged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn available_slug(
        &self,
        name: &str,
        except: Option<CategoryId>,
    ) -> Result<String, RepositoryError> {
        let mut base = slugify(name);
        if base.is_empty() {
            base = "category".to_owned();
        }

        let taken: Vec<String> = sqlx::query_scalar(
            r"
            SELECT slug FROM categories
            WHERE (slug = $1 OR slug LIKE $1 || '-%') AND ($2::BIGINT IS NULL OR id <> $2)
            ",
        )
        .bind(&base)
        .bind(except)
        .fetch_all(self.pool)
        .await?;

        Ok(unique_slug(&base, &taken))
    }
}
