//! Email rendering and delivery.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Every message
//! goes out as `multipart/alternative` with a plain text and an HTML body.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use cocos_glass_core::{
    Commission, CommissionStatus, CommissionUpdate, ContactInquiry, Email,
};

use crate::config::{SmtpConfig, StudioConfig};

/// Errors that can occur when rendering or sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered message, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub to: Email,
    pub subject: String,
    pub text: String,
    pub html: String,
}

// =============================================================================
// Template data
// =============================================================================

/// Shared context for mail about one commission.
pub struct CommissionMail<'a> {
    pub business_name: &'a str,
    pub customer_name: &'a str,
    pub commission: &'a Commission,
    /// Absolute link to the commission in the customer portal.
    pub portal_url: &'a str,
}

impl CommissionMail<'_> {
    fn title(&self) -> &str {
        &self.commission.details.title
    }

    fn status_label(&self) -> &'static str {
        self.commission.status.label()
    }
}

/// Shared context for mail about one contact inquiry.
pub struct InquiryMail<'a> {
    pub business_name: &'a str,
    pub inquiry: &'a ContactInquiry,
    /// Absolute link to the inquiry in the back-office.
    pub admin_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/quote_provided.html")]
struct QuoteProvidedHtml<'a> {
    mail: &'a CommissionMail<'a>,
}

#[derive(Template)]
#[template(path = "email/quote_provided.txt")]
struct QuoteProvidedText<'a> {
    mail: &'a CommissionMail<'a>,
}

#[derive(Template)]
#[template(path = "email/commission_completed.html")]
struct CommissionCompletedHtml<'a> {
    mail: &'a CommissionMail<'a>,
}

#[derive(Template)]
#[template(path = "email/commission_completed.txt")]
struct CommissionCompletedText<'a> {
    mail: &'a CommissionMail<'a>,
}

#[derive(Template)]
#[template(path = "email/status_changed.html")]
struct StatusChangedHtml<'a> {
    mail: &'a CommissionMail<'a>,
    previous_label: &'a str,
}

#[derive(Template)]
#[template(path = "email/status_changed.txt")]
struct StatusChangedText<'a> {
    mail: &'a CommissionMail<'a>,
    previous_label: &'a str,
}

#[derive(Template)]
#[template(path = "email/commission_update.html")]
struct CommissionUpdateHtml<'a> {
    mail: &'a CommissionMail<'a>,
    update: &'a CommissionUpdate,
}

#[derive(Template)]
#[template(path = "email/commission_update.txt")]
struct CommissionUpdateText<'a> {
    mail: &'a CommissionMail<'a>,
    update: &'a CommissionUpdate,
}

#[derive(Template)]
#[template(path = "email/inquiry_confirmation.html")]
struct InquiryConfirmationHtml<'a> {
    mail: &'a InquiryMail<'a>,
}

#[derive(Template)]
#[template(path = "email/inquiry_confirmation.txt")]
struct InquiryConfirmationText<'a> {
    mail: &'a InquiryMail<'a>,
}

#[derive(Template)]
#[template(path = "email/inquiry_received.html")]
struct InquiryReceivedHtml<'a> {
    mail: &'a InquiryMail<'a>,
}

#[derive(Template)]
#[template(path = "email/inquiry_received.txt")]
struct InquiryReceivedText<'a> {
    mail: &'a InquiryMail<'a>,
}

// =============================================================================
// Rendering
// =============================================================================

/// Quote is ready for the customer to review.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn quote_provided(to: &Email, mail: &CommissionMail<'_>) -> Result<RenderedEmail, MailError> {
    Ok(RenderedEmail {
        to: to.clone(),
        subject: format!("Your quote is ready: {}", mail.title()),
        text: QuoteProvidedText { mail }.render()?,
        html: QuoteProvidedHtml { mail }.render()?,
    })
}

/// The piece is finished.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn commission_completed(
    to: &Email,
    mail: &CommissionMail<'_>,
) -> Result<RenderedEmail, MailError> {
    Ok(RenderedEmail {
        to: to.clone(),
        subject: format!("Your commission is complete! {}", mail.title()),
        text: CommissionCompletedText { mail }.render()?,
        html: CommissionCompletedHtml { mail }.render()?,
    })
}

/// Any other lifecycle change.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn status_changed(
    to: &Email,
    mail: &CommissionMail<'_>,
    previous_status: CommissionStatus,
) -> Result<RenderedEmail, MailError> {
    let previous_label = previous_status.label();
    Ok(RenderedEmail {
        to: to.clone(),
        subject: format!(
            "Your commission status has been updated: {}",
            mail.status_label()
        ),
        text: StatusChangedText {
            mail,
            previous_label,
        }
        .render()?,
        html: StatusChangedHtml {
            mail,
            previous_label,
        }
        .render()?,
    })
}

/// A progress note was posted.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn commission_update(
    to: &Email,
    mail: &CommissionMail<'_>,
    update: &CommissionUpdate,
) -> Result<RenderedEmail, MailError> {
    Ok(RenderedEmail {
        to: to.clone(),
        subject: format!("Update on your commission: {}", mail.title()),
        text: CommissionUpdateText { mail, update }.render()?,
        html: CommissionUpdateHtml { mail, update }.render()?,
    })
}

/// Receipt sent back to whoever used the contact form.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn inquiry_confirmation(
    to: &Email,
    mail: &InquiryMail<'_>,
) -> Result<RenderedEmail, MailError> {
    Ok(RenderedEmail {
        to: to.clone(),
        subject: format!("Thank you for contacting {}", mail.business_name),
        text: InquiryConfirmationText { mail }.render()?,
        html: InquiryConfirmationHtml { mail }.render()?,
    })
}

/// Heads-up to the studio inbox.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn inquiry_received(to: &Email, mail: &InquiryMail<'_>) -> Result<RenderedEmail, MailError> {
    Ok(RenderedEmail {
        to: to.clone(),
        subject: format!("[New Inquiry] {}", mail.inquiry.subject_or_default()),
        text: InquiryReceivedText { mail }.render()?,
        html: InquiryReceivedHtml { mail }.render()?,
    })
}

// =============================================================================
// Delivery
// =============================================================================

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns `MailError::Smtp` if the relay can't be set up, or
    /// `MailError::InvalidAddress` if the sender is rejected by lettre.
    pub fn new(smtp: &SmtpConfig, studio: &StudioConfig) -> Result<Self, MailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);

        if let Some((username, password)) = &smtp.credentials {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        let from = Mailbox::new(
            Some(studio.business_name.clone()),
            studio
                .from_address
                .as_str()
                .parse()
                .map_err(|_| MailError::InvalidAddress(studio.from_address.to_string()))?,
        );

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }

    /// Send a rendered message.
    ///
    /// # Errors
    ///
    /// Returns error if the message can't be built or the relay refuses it.
    pub async fn send(&self, email: &RenderedEmail) -> Result<(), MailError> {
        let message = build_message(self.from.clone(), email)?;

        self.mailer.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

/// Build a multipart message with both plain text and HTML versions.
fn build_message(from: Mailbox, email: &RenderedEmail) -> Result<Message, MailError> {
    let to: Mailbox = email
        .to
        .as_str()
        .parse()
        .map_err(|_| MailError::InvalidAddress(email.to.to_string()))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html.clone()),
                ),
        )?;

    Ok(message)
}
