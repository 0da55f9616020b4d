//! Public gallery of published works.
//!
//! Admins browsing the public pages see drafts too; the work scope decides.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use cocos_glass_core::{Action, Category, CategoryId, Work};

use crate::db::works::{Page, WorkFilter};
use crate::db::{CategoryRepository, WorkRepository};
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::state::AppState;

/// Works per gallery page.
pub const PER_PAGE: i64 = 12;

/// Works shown alongside a single work.
const RELATED_LIMIT: i64 = 4;

/// Gallery query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    /// Only works tagged with this category.
    pub category: Option<CategoryId>,
    /// 1-based page number.
    pub page: Option<u32>,
}

/// One page of works.
#[derive(Debug, Serialize)]
pub struct WorkPage {
    pub works: Vec<Work>,
    pub page: u32,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl WorkPage {
    fn new(works: Vec<Work>, page: u32, total: i64) -> Self {
        Self {
            works,
            page,
            per_page: PER_PAGE,
            total,
            total_pages: (total + PER_PAGE - 1) / PER_PAGE,
        }
    }
}

/// A category with its page of works.
#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    #[serde(flatten)]
    pub works: WorkPage,
}

/// A single work with a few others from the same categories.
#[derive(Debug, Serialize)]
pub struct WorkDetail {
    #[serde(flatten)]
    pub work: Work,
    pub full_title: String,
    pub meta_description: String,
    pub category_ids: Vec<CategoryId>,
    pub related: Vec<Work>,
}

/// List works.
///
/// GET /gallery?category=&page=
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn index(
    State(state): State<AppState>,
    authz: Authz,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<WorkPage>> {
    let filter = WorkFilter {
        category: query.category,
        ..WorkFilter::default()
    };
    list_page(&state, &authz, filter, query.page.unwrap_or(1))
        .await
        .map(Json)
}

/// Show one work by slug.
///
/// GET /gallery/{slug}
///
/// # Errors
///
/// Returns 404 if no visible work has that slug.
pub async fn show(
    State(state): State<AppState>,
    authz: Authz,
    Path(slug): Path<String>,
) -> Result<Json<WorkDetail>> {
    let scope = authz.scope::<Work>();
    let works = WorkRepository::new(state.pool());

    let work = works
        .find_by_slug(scope, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Work {slug}")))?;
    authz.authorize_record(Action::Show, &work)?;

    let related = works.related(scope, work.id, RELATED_LIMIT).await?;
    let category_ids = works.category_ids(work.id).await?;

    Ok(Json(WorkDetail {
        full_title: work.full_title(),
        meta_description: work.meta_description(),
        category_ids,
        related,
        work,
    }))
}

/// List works in one category.
///
/// GET /gallery/category/{slug}?page=
///
/// # Errors
///
/// Returns 404 if the category doesn't exist.
pub async fn category(
    State(state): State<AppState>,
    authz: Authz,
    Path(slug): Path<String>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<CategoryPage>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {slug}")))?;
    authz.authorize_record(Action::Show, &category)?;

    let filter = WorkFilter {
        category: Some(category.id),
        ..WorkFilter::default()
    };
    let works = list_page(&state, &authz, filter, query.page.unwrap_or(1)).await?;

    Ok(Json(CategoryPage { category, works }))
}

/// Categories that have at least one published work.
///
/// GET /categories
///
/// # Errors
///
/// Returns 500 if the database query fails.
pub async fn categories(
    State(state): State<AppState>,
    authz: Authz,
) -> Result<Json<Vec<Category>>> {
    authz.authorize_collection::<Category>(Action::Index)?;
    let categories = CategoryRepository::new(state.pool())
        .list(authz.scope::<Category>(), true)
        .await?;
    Ok(Json(categories))
}

async fn list_page(
    state: &AppState,
    authz: &Authz,
    filter: WorkFilter,
    page: u32,
) -> Result<WorkPage> {
    authz.authorize_collection::<Work>(Action::Index)?;
    let scope = authz.scope::<Work>();
    let works = WorkRepository::new(state.pool());

    let page = page.max(1);
    let total = works.count(scope, filter).await?;
    let listed = works
        .list(scope, filter, Some(Page::number(page, PER_PAGE)))
        .await?;

    Ok(WorkPage::new(listed, page, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(WorkPage::new(Vec::new(), 1, 0).total_pages, 0);
        assert_eq!(WorkPage::new(Vec::new(), 1, 12).total_pages, 1);
        assert_eq!(WorkPage::new(Vec::new(), 2, 13).total_pages, 2);
    }
}
