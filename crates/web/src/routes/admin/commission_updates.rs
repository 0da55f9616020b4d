//! Progress notes on a commission.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use cocos_glass_core::{
    Action, Commission, CommissionId, CommissionUpdate, CommissionUpdateId, NewCommissionUpdate,
    UpdateContext, Validate,
};

use crate::db::{CommissionRepository, CommissionUpdateRepository};
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::services::commissions;
use crate::state::AppState;

/// Post a note; emails the owner when it is both flagged and visible.
///
/// POST /admin/commissions/{id}/updates
///
/// # Errors
///
/// Returns 404 if the commission doesn't exist, 422 if the fields are
/// invalid.
pub async fn create(
    State(state): State<AppState>,
    authz: Authz,
    Path(commission_id): Path<CommissionId>,
    Json(form): Json<NewCommissionUpdate>,
) -> Result<(StatusCode, Json<CommissionUpdate>)> {
    let update = commissions::post_update(&state, &authz, commission_id, &form).await?;
    Ok((StatusCode::CREATED, Json(update)))
}

/// Edit a note. Never sends email, whatever the flags say.
///
/// PUT /admin/commissions/{id}/updates/{update_id}
///
/// # Errors
///
/// Returns 404 if the note doesn't exist on that commission, 422 if the
/// fields are invalid.
pub async fn update(
    State(state): State<AppState>,
    authz: Authz,
    Path((commission_id, update_id)): Path<(CommissionId, CommissionUpdateId)>,
    Json(form): Json<NewCommissionUpdate>,
) -> Result<Json<CommissionUpdate>> {
    let (commission, existing) = load(&state, commission_id, update_id).await?;
    authz.authorize_record(Action::Update, &UpdateContext::new(&commission, &existing))?;
    form.validate()?;

    let update = CommissionUpdateRepository::new(state.pool())
        .update(update_id, &form)
        .await?;
    Ok(Json(update))
}

/// DELETE /admin/commissions/{id}/updates/{update_id}
///
/// # Errors
///
/// Returns 404 if the note doesn't exist on that commission.
pub async fn destroy(
    State(state): State<AppState>,
    authz: Authz,
    Path((commission_id, update_id)): Path<(CommissionId, CommissionUpdateId)>,
) -> Result<StatusCode> {
    let (commission, existing) = load(&state, commission_id, update_id).await?;
    authz.authorize_record(Action::Destroy, &UpdateContext::new(&commission, &existing))?;

    CommissionUpdateRepository::new(state.pool())
        .delete(update_id)
        .await?;
    tracing::info!(%commission_id, %update_id, "Commission update deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load(
    state: &AppState,
    commission_id: CommissionId,
    update_id: CommissionUpdateId,
) -> Result<(Commission, CommissionUpdate)> {
    let commission = CommissionRepository::new(state.pool())
        .get_by_id(commission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Commission {commission_id}")))?;
    let update = CommissionUpdateRepository::new(state.pool())
        .get(commission_id, update_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Commission update {update_id}")))?;
    Ok((commission, update))
}
