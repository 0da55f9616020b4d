//! Which emails domain events trigger.
//!
//! Deciding is pure and happens here; rendering and delivery belong to the
//! web crate's mail queue. A notification carries only ids, so the queue
//! renders from whatever is current when it gets to the message.

use serde::{Deserialize, Serialize};

use crate::commission::{CommissionStatus, CommissionUpdate, Event, Transition};
use crate::inquiry::ContactInquiry;
use crate::types::{CommissionId, CommissionUpdateId, ContactInquiryId, Email};

/// A queued email: a template, a recipient, and the records it renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum Notification {
    /// A customer-visible progress note was posted.
    CommissionUpdate {
        to: Email,
        commission_id: CommissionId,
        update_id: CommissionUpdateId,
    },
    QuoteProvided {
        to: Email,
        commission_id: CommissionId,
    },
    CommissionCompleted {
        to: Email,
        commission_id: CommissionId,
    },
    /// Any other lifecycle change.
    StatusChanged {
        to: Email,
        commission_id: CommissionId,
        previous_status: CommissionStatus,
    },
    /// Sent back to whoever used the contact form.
    InquiryConfirmation {
        to: Email,
        inquiry_id: ContactInquiryId,
    },
    /// Sent to the studio's admin address.
    InquiryReceived {
        to: Email,
        inquiry_id: ContactInquiryId,
    },
}

impl Notification {
    /// Decide whether a newly created update emails the commission owner.
    ///
    /// Returns `None` unless the update is both flagged for notification and
    /// visible to the customer, and the owner has an address to send to.
    #[must_use]
    pub fn for_new_update(update: &CommissionUpdate, owner_email: Option<&Email>) -> Option<Self> {
        if !update.wants_notification() {
            return None;
        }
        owner_email.map(|to| Self::CommissionUpdate {
            to: to.clone(),
            commission_id: update.commission_id,
            update_id: update.id,
        })
    }

    /// The email a completed transition sends to the commission owner.
    #[must_use]
    pub fn for_transition(
        commission_id: CommissionId,
        transition: &Transition,
        owner_email: Option<&Email>,
    ) -> Option<Self> {
        let to = owner_email?.clone();
        Some(match transition.event {
            Event::ProvideQuote => Self::QuoteProvided { to, commission_id },
            Event::Complete => Self::CommissionCompleted { to, commission_id },
            _ => Self::StatusChanged {
                to,
                commission_id,
                previous_status: transition.from,
            },
        })
    }

    /// Confirmation to the sender and a heads-up to the studio.
    #[must_use]
    pub fn for_new_inquiry(inquiry: &ContactInquiry, admin_email: &Email) -> [Self; 2] {
        [
            Self::InquiryConfirmation {
                to: inquiry.email.clone(),
                inquiry_id: inquiry.id,
            },
            Self::InquiryReceived {
                to: admin_email.clone(),
                inquiry_id: inquiry.id,
            },
        ]
    }

    #[must_use]
    pub const fn recipient(&self) -> &Email {
        match self {
            Self::CommissionUpdate { to, .. }
            | Self::QuoteProvided { to, .. }
            | Self::CommissionCompleted { to, .. }
            | Self::StatusChanged { to, .. }
            | Self::InquiryConfirmation { to, .. }
            | Self::InquiryReceived { to, .. } => to,
        }
    }

    /// Template identifier, also used as the log label.
    #[must_use]
    pub const fn template(&self) -> &'static str {
        match self {
            Self::CommissionUpdate { .. } => "commission_update",
            Self::QuoteProvided { .. } => "quote_provided",
            Self::CommissionCompleted { .. } => "commission_completed",
            Self::StatusChanged { .. } => "status_changed",
            Self::InquiryConfirmation { .. } => "inquiry_confirmation",
            Self::InquiryReceived { .. } => "inquiry_received",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::types::UserId;

    fn update(notify: bool, visible: bool) -> CommissionUpdate {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        CommissionUpdate {
            id: CommissionUpdateId::new(5),
            commission_id: CommissionId::new(2),
            user_id: Some(UserId::new(1)),
            title: "Came out of the kiln".to_owned(),
            body: None,
            notify_customer: notify,
            visible_to_customer: visible,
            created_at: now,
            updated_at: now,
        }
    }

    fn owner() -> Email {
        Email::parse("owner@example.com").unwrap()
    }

    #[test]
    fn test_update_trigger_truth_table() {
        let to = owner();
        assert!(Notification::for_new_update(&update(true, true), Some(&to)).is_some());
        assert!(Notification::for_new_update(&update(true, false), Some(&to)).is_none());
        assert!(Notification::for_new_update(&update(false, true), Some(&to)).is_none());
        assert!(Notification::for_new_update(&update(false, false), Some(&to)).is_none());
        assert!(Notification::for_new_update(&update(true, true), None).is_none());
    }

    #[test]
    fn test_transition_templates() {
        let to = owner();
        let id = CommissionId::new(2);
        let quote = Transition {
            event: Event::ProvideQuote,
            from: CommissionStatus::Inquiry,
            to: CommissionStatus::Quoted,
        };
        let cancel = Transition {
            event: Event::Cancel,
            from: CommissionStatus::Accepted,
            to: CommissionStatus::Cancelled,
        };

        assert_eq!(
            Notification::for_transition(id, &quote, Some(&to)).unwrap().template(),
            "quote_provided"
        );
        assert_eq!(
            Notification::for_transition(id, &cancel, Some(&to)),
            Some(Notification::StatusChanged {
                to,
                commission_id: id,
                previous_status: CommissionStatus::Accepted,
            })
        );
        assert_eq!(Notification::for_transition(id, &cancel, None), None);
    }
}
