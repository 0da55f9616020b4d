//! Portfolio management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use cocos_glass_core::{Action, CategoryId, Work, WorkDetails, WorkId};

use crate::db::WorkRepository;
use crate::db::works::{WorkChanges, WorkFilter};
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::state::AppState;

/// Work listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct WorkQuery {
    pub category: Option<CategoryId>,
    pub published: Option<bool>,
    pub featured: Option<bool>,
}

/// Create/update request body.
#[derive(Debug, Deserialize)]
pub struct WorkForm {
    #[serde(flatten)]
    pub details: WorkDetails,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
}

impl WorkForm {
    fn changes(&self) -> WorkChanges<'_> {
        WorkChanges {
            details: &self.details,
            published: self.published,
            featured: self.featured,
            category_ids: &self.category_ids,
        }
    }
}

/// Reorder request body: work ids in their new order.
#[derive(Debug, Deserialize)]
pub struct ReorderForm {
    pub ids: Vec<WorkId>,
}

#[derive(Debug, Serialize)]
pub struct WorkDetail {
    #[serde(flatten)]
    pub work: Work,
    pub category_ids: Vec<CategoryId>,
}

/// GET /admin/works
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn index(
    State(state): State<AppState>,
    authz: Authz,
    Query(query): Query<WorkQuery>,
) -> Result<Json<Vec<Work>>> {
    authz.authorize_collection::<Work>(Action::Index)?;
    let filter = WorkFilter {
        category: query.category,
        published: query.published,
        featured: query.featured,
    };
    let works = WorkRepository::new(state.pool())
        .list(authz.scope::<Work>(), filter, None)
        .await?;
    Ok(Json(works))
}

/// GET /admin/works/{id}
///
/// # Errors
///
/// Returns 404 if the work doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<WorkId>,
) -> Result<Json<WorkDetail>> {
    let works = WorkRepository::new(state.pool());
    let work = load(&works, id).await?;
    authz.authorize_record(Action::Show, &work)?;

    let category_ids = works.category_ids(work.id).await?;
    Ok(Json(WorkDetail { work, category_ids }))
}

/// POST /admin/works
///
/// # Errors
///
/// Returns 422 if the fields are invalid.
pub async fn create(
    State(state): State<AppState>,
    authz: Authz,
    Json(form): Json<WorkForm>,
) -> Result<(StatusCode, Json<Work>)> {
    authz.authorize_collection::<Work>(Action::Create)?;
    form.details.validate_on(Utc::now().date_naive())?;

    let work = WorkRepository::new(state.pool())
        .create(&form.changes())
        .await?;
    tracing::info!(work_id = %work.id, slug = %work.slug, "Work created");
    Ok((StatusCode::CREATED, Json(work)))
}

/// PUT /admin/works/{id}
///
/// # Errors
///
/// Returns 404 if the work doesn't exist, 422 if the fields are invalid.
pub async fn update(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<WorkId>,
    Json(form): Json<WorkForm>,
) -> Result<Json<Work>> {
    let works = WorkRepository::new(state.pool());
    let work = load(&works, id).await?;
    authz.authorize_record(Action::Update, &work)?;
    form.details.validate_on(Utc::now().date_naive())?;

    let work = works.update(id, &form.changes()).await?;
    Ok(Json(work))
}

/// DELETE /admin/works/{id}
///
/// # Errors
///
/// Returns 404 if the work doesn't exist.
pub async fn destroy(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<WorkId>,
) -> Result<StatusCode> {
    let works = WorkRepository::new(state.pool());
    let work = load(&works, id).await?;
    authz.authorize_record(Action::Destroy, &work)?;

    works.delete(id).await?;
    tracing::info!(work_id = %id, "Work deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/works/{id}/publish
///
/// # Errors
///
/// Returns 404 if the work doesn't exist.
pub async fn publish(state: State<AppState>, authz: Authz, id: Path<WorkId>) -> Result<Json<Work>> {
    toggle(state, authz, id, Action::Publish).await
}

/// POST /admin/works/{id}/unpublish
///
/// # Errors
///
/// Returns 404 if the work doesn't exist.
pub async fn unpublish(
    state: State<AppState>,
    authz: Authz,
    id: Path<WorkId>,
) -> Result<Json<Work>> {
    toggle(state, authz, id, Action::Unpublish).await
}

/// POST /admin/works/{id}/feature
///
/// # Errors
///
/// Returns 404 if the work doesn't exist.
pub async fn feature(state: State<AppState>, authz: Authz, id: Path<WorkId>) -> Result<Json<Work>> {
    toggle(state, authz, id, Action::Feature).await
}

/// POST /admin/works/{id}/unfeature
///
/// # Errors
///
/// Returns 404 if the work doesn't exist.
pub async fn unfeature(
    state: State<AppState>,
    authz: Authz,
    id: Path<WorkId>,
) -> Result<Json<Work>> {
    toggle(state, authz, id, Action::Unfeature).await
}

/// Set gallery positions from an ordered list of ids.
///
/// POST /admin/works/reorder
///
/// # Errors
///
/// Returns 500 if the update fails.
pub async fn reorder(
    State(state): State<AppState>,
    authz: Authz,
    Json(form): Json<ReorderForm>,
) -> Result<StatusCode> {
    authz.authorize_collection::<Work>(Action::Reorder)?;
    WorkRepository::new(state.pool()).reorder(&form.ids).await?;
    tracing::info!(count = form.ids.len(), "Works reordered");
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<WorkId>,
    action: Action,
) -> Result<Json<Work>> {
    let works = WorkRepository::new(state.pool());
    let work = load(&works, id).await?;
    authz.authorize_record(action, &work)?;

    let work = match action {
        Action::Publish => works.set_published(id, true).await?,
        Action::Unpublish => works.set_published(id, false).await?,
        Action::Feature => works.set_featured(id, true).await?,
        Action::Unfeature => works.set_featured(id, false).await?,
        other => return Err(AppError::BadRequest(format!("{other} is not a toggle"))),
    };
    tracing::info!(work_id = %id, %action, "Work flag changed");
    Ok(Json(work))
}

async fn load(works: &WorkRepository<'_>, id: WorkId) -> Result<Work> {
    works
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Work {id}")))
}
