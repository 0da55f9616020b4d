//! Category management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use cocos_glass_core::{Action, Category, CategoryDetails, CategoryId, Validate};

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::state::AppState;

/// Create/update request body.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(flatten)]
    pub details: CategoryDetails,
    #[serde(default)]
    pub position: Option<i32>,
}

/// GET /admin/categories
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn index(State(state): State<AppState>, authz: Authz) -> Result<Json<Vec<Category>>> {
    authz.authorize_collection::<Category>(Action::Index)?;
    let categories = CategoryRepository::new(state.pool())
        .list(authz.scope::<Category>(), false)
        .await?;
    Ok(Json(categories))
}

/// GET /admin/categories/{id}
///
/// # Errors
///
/// Returns 404 if the category doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = load(&CategoryRepository::new(state.pool()), id).await?;
    authz.authorize_record(Action::Show, &category)?;
    Ok(Json(category))
}

/// POST /admin/categories
///
/// # Errors
///
/// Returns 422 if the fields are invalid, 409 if the name is taken.
pub async fn create(
    State(state): State<AppState>,
    authz: Authz,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>)> {
    authz.authorize_collection::<Category>(Action::Create)?;
    form.details.validate()?;

    let category = CategoryRepository::new(state.pool())
        .create(&form.details, form.position.unwrap_or(0))
        .await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /admin/categories/{id}
///
/// # Errors
///
/// Returns 404 if the category doesn't exist, 422 if the fields are
/// invalid, 409 if the name is taken.
pub async fn update(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<CategoryId>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>> {
    let categories = CategoryRepository::new(state.pool());
    let category = load(&categories, id).await?;
    authz.authorize_record(Action::Update, &category)?;
    form.details.validate()?;

    let category = categories.update(id, &form.details, form.position).await?;
    Ok(Json(category))
}

/// DELETE /admin/categories/{id}
///
/// # Errors
///
/// Returns 404 if the category doesn't exist.
pub async fn destroy(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    let categories = CategoryRepository::new(state.pool());
    let category = load(&categories, id).await?;
    authz.authorize_record(Action::Destroy, &category)?;

    categories.delete(id).await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load(categories: &CategoryRepository<'_>, id: CategoryId) -> Result<Category> {
    categories
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {id}")))
}
