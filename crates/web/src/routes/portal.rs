//! Customer portal: a signed-in user's own commissions.
//!
//! Admins get the same view of the commissions they own. Internal notes
//! and hidden updates never appear here.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use cocos_glass_core::{
    Action, Commission, CommissionId, CommissionStatus, CommissionUpdateId, Price, StatusSummary,
    UpdateContext,
};

use crate::db::commission_updates::AuthoredUpdate;
use crate::db::commissions::CommissionFilter;
use crate::db::{CommissionRepository, CommissionUpdateRepository};
use crate::error::{AppError, Result};
use crate::middleware::{Authz, RequireUser};
use crate::state::AppState;

/// A commission as its owner sees it.
#[derive(Debug, Serialize)]
pub struct PortalCommission {
    #[serde(flatten)]
    pub commission: Commission,
    pub summary: StatusSummary,
    pub price: Option<Price>,
    pub deposit_outstanding: bool,
    pub days_since_start: Option<i64>,
    pub days_until_estimated_completion: Option<i64>,
}

impl PortalCommission {
    fn new(mut commission: Commission, today: NaiveDate) -> Self {
        commission.details.internal_notes = None;
        Self {
            summary: StatusSummary::of(&commission, today),
            price: commission.price_display(),
            deposit_outstanding: commission.deposit_outstanding(),
            days_since_start: commission.days_since_start(today),
            days_until_estimated_completion: commission.days_until_estimated_completion(today),
            commission,
        }
    }
}

/// One entry on the customer timeline.
#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    pub id: CommissionUpdateId,
    pub title: String,
    pub body: Option<String>,
    /// The admin who posted it, or the studio when unknown.
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl TimelineEntry {
    fn new(authored: AuthoredUpdate, studio: &str) -> Self {
        Self {
            id: authored.update.id,
            title: authored.update.title,
            body: authored.update.body,
            author_name: authored.author_name.unwrap_or_else(|| studio.to_owned()),
            created_at: authored.update.created_at,
        }
    }
}

/// Portal landing page.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub active: Vec<PortalCommission>,
    pub completed: Vec<PortalCommission>,
}

/// A commission with its visible timeline, newest first.
#[derive(Debug, Serialize)]
pub struct CommissionDetail {
    #[serde(flatten)]
    pub commission: PortalCommission,
    pub updates: Vec<TimelineEntry>,
}

/// Active and finished commissions.
///
/// GET /portal
///
/// # Errors
///
/// Returns 401 if not signed in.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    authz: Authz,
) -> Result<Json<Dashboard>> {
    let commissions = own_commissions(&state, &authz, &user).await?;
    let today = Utc::now().date_naive();

    let completed = commissions
        .iter()
        .filter(|c| {
            matches!(
                c.status,
                CommissionStatus::Completed | CommissionStatus::Delivered
            )
        })
        .cloned()
        .map(|c| PortalCommission::new(c, today))
        .collect();
    let active = commissions
        .into_iter()
        .filter(Commission::is_active)
        .map(|c| PortalCommission::new(c, today))
        .collect();

    Ok(Json(Dashboard { active, completed }))
}

/// All of the user's commissions, newest first.
///
/// GET /portal/commissions
///
/// # Errors
///
/// Returns 401 if not signed in.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    authz: Authz,
) -> Result<Json<Vec<PortalCommission>>> {
    let today = Utc::now().date_naive();
    let commissions = own_commissions(&state, &authz, &user).await?;
    Ok(Json(
        commissions
            .into_iter()
            .map(|c| PortalCommission::new(c, today))
            .collect(),
    ))
}

/// One commission with its customer-visible updates.
///
/// GET /portal/commissions/{id}
///
/// # Errors
///
/// Returns 404 unless the commission exists and belongs to the user.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    authz: Authz,
    Path(id): Path<CommissionId>,
) -> Result<Json<CommissionDetail>> {
    let commission = CommissionRepository::new(state.pool())
        .find(authz.scope::<Commission>(), id)
        .await?
        .filter(|c| c.user_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("Commission {id}")))?;
    authz.authorize_record(Action::Show, &commission)?;

    let studio = &state.config().studio.business_name;
    let updates = CommissionUpdateRepository::new(state.pool())
        .timeline(authz.scope::<UpdateContext<'_>>(), commission.id)
        .await?
        .into_iter()
        .filter(|authored| authored.update.visible_to_customer)
        .map(|authored| TimelineEntry::new(authored, studio))
        .collect();

    Ok(Json(CommissionDetail {
        commission: PortalCommission::new(commission, Utc::now().date_naive()),
        updates,
    }))
}

async fn own_commissions(
    state: &AppState,
    authz: &Authz,
    user: &cocos_glass_core::User,
) -> Result<Vec<Commission>> {
    authz.authorize_collection::<Commission>(Action::Index)?;
    let filter = CommissionFilter {
        user: Some(user.id),
        ..CommissionFilter::default()
    };
    Ok(CommissionRepository::new(state.pool())
        .list(authz.scope::<Commission>(), filter, None)
        .await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cocos_glass_core::{CommissionDetails, CommissionUpdate, UserId};

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_760_000_000, 0).unwrap()
    }

    #[test]
    fn test_portal_view_hides_internal_notes() {
        let commission = Commission {
            id: CommissionId::new(1),
            user_id: UserId::new(2),
            status: CommissionStatus::Quoted,
            details: CommissionDetails {
                title: "Transom".to_owned(),
                internal_notes: Some("Customer haggles".to_owned()),
                ..CommissionDetails::default()
            },
            actual_start_date: None,
            actual_completion_date: None,
            delivered_at: None,
            deposit_paid: false,
            deposit_paid_at: None,
            created_at: now(),
            updated_at: now(),
        };

        let view = PortalCommission::new(commission, now().date_naive());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["internal_notes"], serde_json::Value::Null);
        assert_eq!(json["title"], "Transom");
        assert_eq!(json["summary"]["label"], "Quoted");
    }

    #[test]
    fn test_timeline_author_falls_back_to_studio() {
        let authored = AuthoredUpdate {
            update: CommissionUpdate {
                id: CommissionUpdateId::new(3),
                commission_id: CommissionId::new(1),
                user_id: None,
                title: "Glass ordered".to_owned(),
                body: None,
                notify_customer: false,
                visible_to_customer: true,
                created_at: now(),
                updated_at: now(),
            },
            author_name: None,
        };

        let entry = TimelineEntry::new(authored, "Coco's Stained Glass");
        assert_eq!(entry.author_name, "Coco's Stained Glass");
    }
}
