//! Contact inquiry inbox.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

use cocos_glass_core::{Action, ContactInquiry, ContactInquiryId, InquiryNotes, InquiryStatus, Validate};

use crate::db::ContactInquiryRepository;
use crate::error::{AppError, Result};
use crate::middleware::Authz;
use crate::state::AppState;

/// Inbox filter. Without `status` the inbox shows every inquiry.
#[derive(Debug, Default, Deserialize)]
pub struct InquiryQuery {
    pub status: Option<String>,
}

impl InquiryQuery {
    fn status(&self) -> Result<Option<InquiryStatus>> {
        match self.status.as_deref() {
            None | Some("") => Ok(None),
            Some(other) => other.parse().map(Some).map_err(AppError::BadRequest),
        }
    }
}

/// GET /admin/contact_inquiries?status=
///
/// # Errors
///
/// Returns 400 for an unknown status.
pub async fn index(
    State(state): State<AppState>,
    authz: Authz,
    Query(query): Query<InquiryQuery>,
) -> Result<Json<Vec<ContactInquiry>>> {
    authz.authorize_collection::<ContactInquiry>(Action::Index)?;
    let inquiries = ContactInquiryRepository::new(state.pool())
        .list(authz.scope::<ContactInquiry>(), query.status()?, None)
        .await?;
    Ok(Json(inquiries))
}

/// GET /admin/contact_inquiries/{id}
///
/// # Errors
///
/// Returns 404 if the inquiry doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<ContactInquiryId>,
) -> Result<Json<ContactInquiry>> {
    let inquiry = load(&state, id).await?;
    authz.authorize_record(Action::Show, &inquiry)?;
    Ok(Json(inquiry))
}

/// Only the admin notes are editable.
///
/// PUT /admin/contact_inquiries/{id}
///
/// # Errors
///
/// Returns 404 if the inquiry doesn't exist, 422 if the notes are too long.
pub async fn update(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<ContactInquiryId>,
    Json(notes): Json<InquiryNotes>,
) -> Result<Json<ContactInquiry>> {
    let mut inquiry = load(&state, id).await?;
    authz.authorize_record(Action::Update, &inquiry)?;
    notes.validate()?;

    inquiry.admin_notes = notes.admin_notes.filter(|n| !n.trim().is_empty());
    save(&state, &inquiry).await
}

/// DELETE /admin/contact_inquiries/{id}
///
/// # Errors
///
/// Returns 404 if the inquiry doesn't exist.
pub async fn destroy(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<ContactInquiryId>,
) -> Result<StatusCode> {
    let inquiry = load(&state, id).await?;
    authz.authorize_record(Action::Destroy, &inquiry)?;

    ContactInquiryRepository::new(state.pool()).delete(id).await?;
    tracing::info!(inquiry_id = %id, "Contact inquiry deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The first response time is kept if the inquiry is marked again.
///
/// POST /admin/contact_inquiries/{id}/mark_responded
///
/// # Errors
///
/// Returns 404 if the inquiry doesn't exist.
pub async fn mark_responded(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<ContactInquiryId>,
) -> Result<Json<ContactInquiry>> {
    let mut inquiry = load(&state, id).await?;
    authz.authorize_record(Action::MarkResponded, &inquiry)?;

    inquiry.mark_responded(Utc::now());
    save(&state, &inquiry).await
}

/// POST /admin/contact_inquiries/{id}/archive
///
/// # Errors
///
/// Returns 404 if the inquiry doesn't exist.
pub async fn archive(
    State(state): State<AppState>,
    authz: Authz,
    Path(id): Path<ContactInquiryId>,
) -> Result<Json<ContactInquiry>> {
    let mut inquiry = load(&state, id).await?;
    authz.authorize_record(Action::Archive, &inquiry)?;

    inquiry.archive();
    save(&state, &inquiry).await
}

async fn load(state: &AppState, id: ContactInquiryId) -> Result<ContactInquiry> {
    ContactInquiryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact inquiry {id}")))
}

async fn save(state: &AppState, inquiry: &ContactInquiry) -> Result<Json<ContactInquiry>> {
    let saved = ContactInquiryRepository::new(state.pool())
        .save(inquiry)
        .await?;
    tracing::info!(inquiry_id = %saved.id, status = %saved.status, "Contact inquiry saved");
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(status: Option<&str>) -> InquiryQuery {
        InquiryQuery {
            status: status.map(str::to_owned),
        }
    }

    #[test]
    fn test_inbox_defaults_to_all_inquiries() {
        assert_eq!(query(None).status().ok(), Some(None));
        assert_eq!(query(Some("")).status().ok(), Some(None));
        assert_eq!(
            query(Some("pending")).status().ok(),
            Some(Some(InquiryStatus::Pending))
        );
        assert_eq!(
            query(Some("archived")).status().ok(),
            Some(Some(InquiryStatus::Archived))
        );
        assert!(query(Some("unread")).status().is_err());
        assert!(query(Some("all")).status().is_err());
    }
}
