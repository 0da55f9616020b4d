//! Commission lifecycle operations.
//!
//! Both operations persist first and queue mail second, so a delivery
//! problem never rolls back a transition or an update.

use chrono::Utc;
use tracing::instrument;

use cocos_glass_core::{
    Action, Commission, CommissionId, CommissionUpdate, Email, NewCommissionUpdate, Notification,
    UpdateContext, Validate,
};

use crate::db::{CommissionRepository, CommissionUpdateRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::state::AppState;

/// Fire a lifecycle event on a commission.
///
/// The row is locked for the duration of the check-and-apply, so two
/// concurrent events on the same commission can't both succeed from the
/// same starting state.
///
/// # Errors
///
/// - `AppError::NotFound` if the commission doesn't exist
/// - `AppError::NotAuthorized` if the actor may not transition it
/// - `AppError::Transition` for an unknown event or one not permitted from
///   the current status; nothing is written in either case
#[instrument(skip(state, authz), fields(actor = %authz.actor()))]
pub async fn transition(
    state: &AppState,
    authz: &Authz,
    commission_id: CommissionId,
    event: &str,
) -> Result<Commission> {
    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;

    let mut commission = CommissionRepository::lock(&mut tx, commission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Commission {commission_id}")))?;
    authz.authorize_record(Action::Transition, &commission)?;

    let transition = match commission.fire(event, Utc::now().date_naive()) {
        Ok(transition) => transition,
        Err(e) => {
            tracing::info!(error = %e, "Transition rejected");
            return Err(e.into());
        }
    };

    let commission = CommissionRepository::save_transition(&mut tx, &commission).await?;
    tx.commit().await.map_err(RepositoryError::from)?;

    tracing::info!(
        event = %transition.event,
        from = %transition.from,
        to = %transition.to,
        "Commission transitioned"
    );

    let owner_email = delivery_address(
        CommissionRepository::new(state.pool())
            .owner_email(commission.id)
            .await,
    );
    match Notification::for_transition(commission.id, &transition, owner_email.as_ref()) {
        Some(notification) => state.notifier().enqueue(notification),
        None => tracing::info!("Owner has no deliverable address, skipping email"),
    }

    Ok(commission)
}

/// Post a progress note on a commission.
///
/// Whether the owner is emailed is decided here, once; editing the note's
/// flags later never sends anything.
///
/// # Errors
///
/// - `AppError::NotFound` if the commission doesn't exist
/// - `AppError::NotAuthorized` if the actor may not post updates
/// - `AppError::Validation` if the title or body is invalid
#[instrument(skip(state, authz, note), fields(actor = %authz.actor()))]
pub async fn post_update(
    state: &AppState,
    authz: &Authz,
    commission_id: CommissionId,
    note: &NewCommissionUpdate,
) -> Result<CommissionUpdate> {
    authz.authorize_collection::<UpdateContext<'_>>(Action::Create)?;
    note.validate()?;

    let commissions = CommissionRepository::new(state.pool());
    if commissions.get_by_id(commission_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Commission {commission_id}")));
    }

    let update = CommissionUpdateRepository::new(state.pool())
        .create(commission_id, authz.actor().user_id(), note)
        .await?;

    tracing::info!(
        update_id = %update.id,
        notify_customer = update.notify_customer,
        visible_to_customer = update.visible_to_customer,
        "Commission update posted"
    );

    if update.wants_notification() {
        let owner_email = delivery_address(commissions.owner_email(commission_id).await);
        if let Some(notification) = Notification::for_new_update(&update, owner_email.as_ref()) {
            state.notifier().enqueue(notification);
        }
    }

    Ok(update)
}

/// The owner's address for mail sent after a write has committed.
///
/// A failed lookup drops the mail rather than failing a change that is
/// already saved.
fn delivery_address(lookup: std::result::Result<Option<Email>, RepositoryError>) -> Option<Email> {
    match lookup {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!(error = %e, "Owner email lookup failed, skipping email");
            None
        }
    }
}
