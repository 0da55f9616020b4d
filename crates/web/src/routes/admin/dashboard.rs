//! Back-office overview.

use axum::{Json, extract::State};
use serde::Serialize;

use cocos_glass_core::{Action, Commission, ContactInquiry};

use crate::db::commissions::CommissionFilter;
use crate::db::dashboard::{DashboardCounts, StatusCount};
use crate::db::{CommissionRepository, ContactInquiryRepository, DashboardRepository};
use crate::error::Result;
use crate::middleware::Authz;
use crate::state::AppState;

/// How many recent records the dashboard lists.
const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub recent_inquiries: Vec<ContactInquiry>,
    pub recent_commissions: Vec<Commission>,
    pub commissions_by_status: Vec<StatusCount>,
}

/// Headline counts and recent activity.
///
/// GET /admin
///
/// # Errors
///
/// Returns 500 if a query fails.
pub async fn index(State(state): State<AppState>, authz: Authz) -> Result<Json<Dashboard>> {
    authz.authorize_collection::<Commission>(Action::Index)?;
    authz.authorize_collection::<ContactInquiry>(Action::Index)?;

    let pool = state.pool();
    let dashboard = DashboardRepository::new(pool);

    let counts = dashboard.counts().await?;
    let commissions_by_status = dashboard.commissions_by_status().await?;
    let recent_inquiries = ContactInquiryRepository::new(pool)
        .list(authz.scope::<ContactInquiry>(), None, Some(RECENT_LIMIT))
        .await?;
    let recent_commissions = CommissionRepository::new(pool)
        .list(
            authz.scope::<Commission>(),
            CommissionFilter::default(),
            Some(RECENT_LIMIT),
        )
        .await?;

    Ok(Json(Dashboard {
        counts,
        recent_inquiries,
        recent_commissions,
        commissions_by_status,
    }))
}
