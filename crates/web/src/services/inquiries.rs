//! Contact form submissions.

use tracing::instrument;

use cocos_glass_core::{ContactInquiry, NewContactInquiry, Notification};

use crate::db::ContactInquiryRepository;
use crate::db::contact_inquiries::InquirySubmission;
use crate::error::Result;
use crate::state::AppState;

/// Store a submission and queue the confirmation and studio notification.
///
/// # Errors
///
/// Returns `AppError::Validation` with every invalid field, or
/// `AppError::Database` if the insert fails.
#[instrument(skip_all)]
pub async fn submit(state: &AppState, form: &NewContactInquiry) -> Result<ContactInquiry> {
    let email = form.validated_email()?;

    let inquiry = ContactInquiryRepository::new(state.pool())
        .create(&InquirySubmission {
            name: &form.name,
            email: &email,
            phone: non_blank(form.phone.as_deref()),
            subject: non_blank(form.subject.as_deref()),
            message: &form.message,
        })
        .await?;

    tracing::info!(inquiry_id = %inquiry.id, "Contact inquiry received");

    state.notifier().enqueue_all(Notification::for_new_inquiry(
        &inquiry,
        &state.config().studio.admin_email,
    ));

    Ok(inquiry)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some(" Lamp ")), Some("Lamp"));
    }
}
