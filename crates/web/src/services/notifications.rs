//! Outgoing mail queue.
//!
//! Handlers decide *that* a message goes out (see
//! [`cocos_glass_core::Notification`]) and hand it to the [`Notifier`]; a
//! background worker renders it from the current database records and
//! delivers it over SMTP. Enqueueing never blocks a request and never fails
//! one: a full queue or a disabled mailer is logged and the message dropped.

use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::instrument;

use cocos_glass_core::{CommissionId, ContactInquiryId, Notification};

use crate::config::AppConfig;
use crate::db::{
    CommissionRepository, CommissionUpdateRepository, ContactInquiryRepository, RepositoryError,
    UserRepository,
};
use crate::services::email::{
    self, CommissionMail, EmailService, InquiryMail, MailError, RenderedEmail,
};

/// Messages waiting for the worker.
const QUEUE_CAPACITY: usize = 256;

/// Delivery attempts per message before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Errors raised while rendering or delivering one message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Handle for queueing outgoing mail.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: Option<mpsc::Sender<Notification>>,
}

impl Notifier {
    /// A notifier that drops everything. Used when SMTP isn't configured.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// A notifier backed by a plain channel, with the receiving end returned
    /// to the caller instead of a worker.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// Spawn the delivery worker.
    ///
    /// Returns a disabled notifier when no SMTP relay is configured.
    ///
    /// # Errors
    ///
    /// Returns `MailError` if the SMTP transport can't be built.
    pub fn start(pool: PgPool, config: &AppConfig) -> Result<Self, MailError> {
        let Some(smtp) = &config.smtp else {
            tracing::warn!("SMTP_HOST not set; outgoing email is disabled");
            return Ok(Self::disabled());
        };

        let mailer = EmailService::new(smtp, &config.studio)?;
        let (notifier, rx) = Self::channel(QUEUE_CAPACITY);
        let worker = Worker {
            pool,
            mailer,
            config: config.clone(),
        };
        tokio::spawn(worker.run(rx));

        tracing::info!(host = %smtp.host, port = smtp.port, "Mail worker started");
        Ok(notifier)
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a message for delivery.
    pub fn enqueue(&self, notification: Notification) {
        let Some(tx) = &self.tx else {
            tracing::debug!(
                template = notification.template(),
                "Email disabled, dropping notification"
            );
            return;
        };

        let template = notification.template();
        match tx.try_send(notification) {
            Ok(()) => tracing::debug!(template, "Notification queued"),
            Err(mpsc::error::TrySendError::Full(n)) => {
                tracing::error!(template, to = %n.recipient(), "Mail queue full, dropping notification");
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                tracing::error!(template, to = %n.recipient(), "Mail worker stopped, dropping notification");
            }
        }
    }

    /// Queue several messages.
    pub fn enqueue_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.enqueue(notification);
        }
    }
}

/// Renders queued notifications and hands them to SMTP.
struct Worker {
    pool: PgPool,
    mailer: EmailService,
    config: AppConfig,
}

impl Worker {
    async fn run(self, mut rx: mpsc::Receiver<Notification>) {
        while let Some(notification) = rx.recv().await {
            self.deliver(&notification).await;
        }
        tracing::info!("Mail queue closed, worker exiting");
    }

    #[instrument(skip_all, fields(template = notification.template(), to = %notification.recipient()))]
    async fn deliver(&self, notification: &Notification) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_deliver(notification).await {
                Ok(()) => return,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(error = %e, attempt, ?delay, "Email delivery failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, attempt, "Email delivery failed, giving up");
                    return;
                }
            }
        }
    }

    async fn try_deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        match self.render(notification).await? {
            Some(email) => Ok(self.mailer.send(&email).await?),
            None => {
                tracing::info!("Record no longer exists, skipping email");
                Ok(())
            }
        }
    }

    /// Render from current records; `None` when a record has been deleted.
    async fn render(
        &self,
        notification: &Notification,
    ) -> Result<Option<RenderedEmail>, DeliveryError> {
        match notification {
            Notification::CommissionUpdate {
                to,
                commission_id,
                update_id,
            } => {
                let Some(update) = CommissionUpdateRepository::new(&self.pool)
                    .get(*commission_id, *update_id)
                    .await?
                else {
                    return Ok(None);
                };
                self.render_commission(*commission_id, |mail| {
                    email::commission_update(to, mail, &update)
                })
                .await
            }
            Notification::QuoteProvided { to, commission_id } => {
                self.render_commission(*commission_id, |mail| email::quote_provided(to, mail))
                    .await
            }
            Notification::CommissionCompleted { to, commission_id } => {
                self.render_commission(*commission_id, |mail| {
                    email::commission_completed(to, mail)
                })
                .await
            }
            Notification::StatusChanged {
                to,
                commission_id,
                previous_status,
            } => {
                self.render_commission(*commission_id, |mail| {
                    email::status_changed(to, mail, *previous_status)
                })
                .await
            }
            Notification::InquiryConfirmation { to, inquiry_id } => {
                self.render_inquiry(*inquiry_id, |mail| email::inquiry_confirmation(to, mail))
                    .await
            }
            Notification::InquiryReceived { to, inquiry_id } => {
                self.render_inquiry(*inquiry_id, |mail| email::inquiry_received(to, mail))
                    .await
            }
        }
    }

    async fn render_commission<F>(
        &self,
        id: CommissionId,
        render: F,
    ) -> Result<Option<RenderedEmail>, DeliveryError>
    where
        F: FnOnce(&CommissionMail<'_>) -> Result<RenderedEmail, MailError>,
    {
        let Some(commission) = CommissionRepository::new(&self.pool).get_by_id(id).await? else {
            return Ok(None);
        };
        let Some(owner) = UserRepository::new(&self.pool)
            .get_by_id(commission.user_id)
            .await?
        else {
            return Ok(None);
        };

        let customer_name = owner.display_name();
        let portal_url = self
            .config
            .url_for(&format!("/portal/commissions/{}", commission.id));
        let mail = CommissionMail {
            business_name: &self.config.studio.business_name,
            customer_name: &customer_name,
            commission: &commission,
            portal_url: &portal_url,
        };

        Ok(Some(render(&mail)?))
    }

    async fn render_inquiry<F>(
        &self,
        id: ContactInquiryId,
        render: F,
    ) -> Result<Option<RenderedEmail>, DeliveryError>
    where
        F: FnOnce(&InquiryMail<'_>) -> Result<RenderedEmail, MailError>,
    {
        let Some(inquiry) = ContactInquiryRepository::new(&self.pool)
            .get_by_id(id)
            .await?
        else {
            return Ok(None);
        };

        let admin_url = self
            .config
            .url_for(&format!("/admin/contact_inquiries/{}", inquiry.id));
        let mail = InquiryMail {
            business_name: &self.config.studio.business_name,
            inquiry: &inquiry,
            admin_url: &admin_url,
        };

        Ok(Some(render(&mail)?))
    }
}

/// Delay before the next attempt: 2s, 4s, 8s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt.min(6)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cocos_glass_core::Email;

    use super::*;

    fn notification(id: i64) -> Notification {
        Notification::InquiryReceived {
            to: Email::parse("studio@example.com").unwrap(),
            inquiry_id: ContactInquiryId::new(id),
        }
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(50), Duration::from_secs(64));
    }

    #[test]
    fn test_disabled_notifier_drops_silently() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());
        notifier.enqueue(notification(1));
    }

    #[tokio::test]
    async fn test_channel_receives_in_order() {
        let (notifier, mut rx) = Notifier::channel(4);
        notifier.enqueue_all([notification(1), notification(2)]);

        assert_eq!(rx.recv().await.unwrap(), notification(1));
        assert_eq!(rx.recv().await.unwrap(), notification(2));
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (notifier, mut rx) = Notifier::channel(1);
        notifier.enqueue(notification(1));
        notifier.enqueue(notification(2));

        assert_eq!(rx.recv().await.unwrap(), notification(1));
        assert!(rx.try_recv().is_err());
    }
}
