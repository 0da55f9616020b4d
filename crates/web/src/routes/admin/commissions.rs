//! Commission management and lifecycle transitions.
//!
//! Status only moves through `POST /admin/commissions/{id}/transition`; the
//! create and update forms never touch it.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use cocos_glass_core::{
    Action, Commission, CommissionDetails, CommissionId, CommissionStatus, StatusSummary,
    UpdateContext, User, UserId, Validate,
};

use crate::db::commission_updates::AuthoredUpdate;
use crate::db::commissions::CommissionFilter;
use crate::db::{CommissionRepository, CommissionUpdateRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::services::commissions;
use crate::state::AppState;

/// Commission listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct CommissionQuery {
    pub status: Option<CommissionStatus>,
    #[serde(default)]
    pub active: bool,
    pub user_id: Option<UserId>,
}

/// Create/update request body.
#[derive(Debug, Deserialize)]
pub struct CommissionForm {
    pub user_id: UserId,
    #[serde(flatten)]
    pub details: CommissionDetails,
    #[serde(default)]
    pub deposit_paid: Option<bool>,
}

/// Transition request body.
#[derive(Debug, Deserialize)]
pub struct TransitionForm {
    pub event: String,
}

/// A commission with everything the back-office shows about it.
#[derive(Debug, Serialize)]
pub struct CommissionDetail {
    #[serde(flatten)]
    pub commission: Commission,
    pub summary: StatusSummary,
    pub owner: Option<User>,
    pub updates: Vec<UpdateEntry>,
}

/// A timeline entry, internal notes included.
#[derive(Debug, Serialize)]
pub struct UpdateEntry {
    #[serde(flatten)]
    pub update: cocos_glass_core::CommissionUpdate,
    pub author_name: String,
}

impl UpdateEntry {
    fn new(authored: AuthoredUpdate, studio: &str) -> Self {
        Self {
            update: authored.update,
            author_name: authored.author_name.unwrap_or_else(|| studio.to_owned()),
        }
    }
}

/// A commission after a transition, with what can happen next.
#[derive(Debug, Serialize)]
pub struct Transitioned {
    #[serde(flatten)]
    pub commission: Commission,
    pub summary: StatusSummary,
}

/// GET /admin/commissions?status=&active=&user_id=
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn index(
    State(state): State<AppState>,
    authz: Authz,
    Query(query): Query<CommissionQuery>,
) -> Result<Json<Vec<Commission>>> {
    authz.authorize_collection::<Commission>(Action::Index)?;
    let filter = CommissionFilter {
        status: query.status,
        active: query.active,
        user: query.user_id,
    };
    let commissions = CommissionRepository::new(state.pool())
        .list(authz.scope::<Commission>(), filter, None)
        .await?;
    Ok(Json(commissions))
}

/// GET /admin/commissions/{id}
///
/// # Errors
///
/// Returns 404 if the commission doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<CommissionId>,
) -> Result<Json<CommissionDetail>> {
    let commission = load(&state, id).await?;
    authz.authorize_record(Action::Show, &commission)?;

    let owner = UserRepository::new(state.pool())
        .get_by_id(commission.user_id)
        .await?;
    let studio = &state.config().studio.business_name;
    let updates = CommissionUpdateRepository::new(state.pool())
        .timeline(authz.scope::<UpdateContext<'_>>(), commission.id)
        .await?
        .into_iter()
        .map(|authored| UpdateEntry::new(authored, studio))
        .collect();

    Ok(Json(CommissionDetail {
        summary: StatusSummary::of(&commission, Utc::now().date_naive()),
        commission,
        owner,
        updates,
    }))
}

/// New commissions start as inquiries.
///
/// POST /admin/commissions
///
/// # Errors
///
/// Returns 422 if the fields are invalid, 404 if the owner doesn't exist.
pub async fn create(
    State(state): State<AppState>,
    authz: Authz,
    Json(form): Json<CommissionForm>,
) -> Result<(StatusCode, Json<Commission>)> {
    authz.authorize_collection::<Commission>(Action::Create)?;
    form.details.validate()?;

    let commission = CommissionRepository::new(state.pool())
        .create(form.user_id, &form.details, form.deposit_paid.unwrap_or(false))
        .await?;
    tracing::info!(commission_id = %commission.id, user_id = %commission.user_id, "Commission created");
    Ok((StatusCode::CREATED, Json(commission)))
}

/// PUT /admin/commissions/{id}
///
/// # Errors
///
/// Returns 404 if the commission or the owner doesn't exist, 422 if the
/// fields are invalid.
pub async fn update(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<CommissionId>,
    Json(form): Json<CommissionForm>,
) -> Result<Json<Commission>> {
    let commission = load(&state, id).await?;
    authz.authorize_record(Action::Update, &commission)?;
    form.details.validate()?;

    let commission = CommissionRepository::new(state.pool())
        .update(id, form.user_id, &form.details, form.deposit_paid)
        .await?;
    Ok(Json(commission))
}

/// Deletes the commission's updates too.
///
/// DELETE /admin/commissions/{id}
///
/// # Errors
///
/// Returns 404 if the commission doesn't exist.
pub async fn destroy(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<CommissionId>,
) -> Result<StatusCode> {
    let commission = load(&state, id).await?;
    authz.authorize_record(Action::Destroy, &commission)?;

    CommissionRepository::new(state.pool()).delete(id).await?;
    tracing::info!(commission_id = %id, "Commission deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Fire a lifecycle event such as `provide_quote` or `complete`.
///
/// POST /admin/commissions/{id}/transition
///
/// # Errors
///
/// Returns 400 for an unknown event, 409 (with the current status) for an
/// event not permitted from the current status, 404 if the commission
/// doesn't exist.
pub async fn transition(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<CommissionId>,
    Json(form): Json<TransitionForm>,
) -> Result<Json<Transitioned>> {
    let commission = commissions::transition(&state, &authz, id, &form.event).await?;
    Ok(Json(Transitioned {
        summary: StatusSummary::of(&commission, Utc::now().date_naive()),
        commission,
    }))
}

async fn load(state: &AppState, id: CommissionId) -> Result<Commission> {
    CommissionRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Commission {id}")))
}
