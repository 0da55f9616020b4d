//! Public contact form.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use cocos_glass_core::policy;
use cocos_glass_core::{Action, ContactInquiry, ContactInquiryId, NewContactInquiry, Target};

use crate::error::Result;
use crate::middleware::CurrentActor;
use crate::services::inquiries;
use crate::state::AppState;

/// What the sender gets back; the stored record stays admin-only.
#[derive(Debug, Serialize)]
pub struct Submitted {
    pub id: ContactInquiryId,
    pub message: &'static str,
}

/// Submit the contact form.
///
/// POST /contact
///
/// # Errors
///
/// Returns 422 with per-field messages if the submission is invalid.
pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(form): Json<NewContactInquiry>,
) -> Result<(StatusCode, Json<Submitted>)> {
    policy::authorize::<ContactInquiry>(&actor, Action::Create, Target::Collection)?;

    let inquiry = inquiries::submit(&state, &form).await?;

    Ok((
        StatusCode::CREATED,
        Json(Submitted {
            id: inquiry.id,
            message: "Thank you for your message! We'll be in touch soon.",
        }),
    ))
}
