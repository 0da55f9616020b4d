//! Commissions: custom artwork projects tracked from first inquiry to
//! delivery.
//!
//! - [`status`] - the nine lifecycle states and their display helpers
//! - [`machine`] - the event table and transition errors
//! - [`update`] - progress notes attached to a commission

pub mod machine;
pub mod status;
pub mod update;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CommissionId, Price, UserId};
use crate::validation::{Validate, ValidationErrors};

pub use machine::{Event, Transition, TransitionError};
pub use status::{CommissionStatus, StatusColor};
pub use update::{CommissionUpdate, NewCommissionUpdate, UpdateContext};

use machine::SideEffect;

/// The fields an admin edits directly on a commission.
///
/// Status and the dates/flags stamped by transitions are not part of this
/// set; they only change through [`Commission::fire`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionDetails {
    pub title: String,
    pub description: Option<String>,
    pub customer_notes: Option<String>,
    /// Admin-only; never shown in the customer portal.
    pub internal_notes: Option<String>,
    pub estimated_start_date: Option<NaiveDate>,
    pub estimated_completion_date: Option<NaiveDate>,
    pub estimated_price: Option<Price>,
    pub final_price: Option<Price>,
    pub deposit_amount: Option<Price>,
    pub dimensions: Option<String>,
    pub location: Option<String>,
}

impl Validate for CommissionDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &self.title);
        errors.max_len("title", &self.title, 200);
        errors.max_len_opt("description", self.description.as_deref(), 5000);
        errors.max_len_opt("customer_notes", self.customer_notes.as_deref(), 2000);
        errors.max_len_opt("internal_notes", self.internal_notes.as_deref(), 5000);
        errors.max_len_opt("dimensions", self.dimensions.as_deref(), 100);
        errors.max_len_opt("location", self.location.as_deref(), 200);
        errors.into_result()
    }
}

/// A commission as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub id: CommissionId,
    /// The customer who owns the commission.
    pub user_id: UserId,
    pub status: CommissionStatus,
    #[serde(flatten)]
    pub details: CommissionDetails,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_completion_date: Option<NaiveDate>,
    pub delivered_at: Option<NaiveDate>,
    pub deposit_paid: bool,
    pub deposit_paid_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Commission {
    /// Fire a lifecycle event by name.
    ///
    /// The name is resolved first, then checked against the current state;
    /// nothing on `self` changes unless both checks pass.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::UnknownEvent`] for names outside the
    /// lifecycle and [`TransitionError::InvalidTransition`] for events that
    /// cannot fire from the current state.
    pub fn fire(&mut self, event_name: &str, today: NaiveDate) -> Result<Transition, TransitionError> {
        let event: Event = event_name.parse()?;
        self.apply(event, today)
    }

    /// Apply a known lifecycle event.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] when the event cannot
    /// fire from the current state.
    pub fn apply(&mut self, event: Event, today: NaiveDate) -> Result<Transition, TransitionError> {
        let from = self.status;
        let to = event.next_state(from)?;

        self.status = to;
        match event.rule().effect {
            SideEffect::None => {}
            SideEffect::MarkDepositPaid => {
                self.deposit_paid = true;
                self.deposit_paid_at.get_or_insert(today);
            }
            SideEffect::StampStart => {
                self.actual_start_date.get_or_insert(today);
            }
            SideEffect::StampCompletion => {
                self.actual_completion_date.get_or_insert(today);
            }
            SideEffect::StampDelivery => {
                self.delivered_at.get_or_insert(today);
            }
        }

        Ok(Transition { event, from, to })
    }

    /// Events that may fire from the current state.
    pub fn available_events(&self) -> impl Iterator<Item = Event> {
        Event::permitted_from(self.status)
    }

    /// Past its estimated completion date and not yet finished.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_closed()
            && self
                .details
                .estimated_completion_date
                .is_some_and(|estimate| estimate < today)
    }

    /// Whether the commission is still active (not delivered or cancelled).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        self.status.progress_percentage()
    }

    /// Days since work actually began.
    #[must_use]
    pub fn days_since_start(&self, today: NaiveDate) -> Option<i64> {
        self.actual_start_date
            .map(|start| (today - start).num_days())
    }

    /// Days until the estimated completion date; negative once it has passed.
    #[must_use]
    pub fn days_until_estimated_completion(&self, today: NaiveDate) -> Option<i64> {
        self.details
            .estimated_completion_date
            .map(|estimate| (estimate - today).num_days())
    }

    /// The price to show: the final price once set, otherwise the estimate.
    #[must_use]
    pub const fn price_display(&self) -> Option<Price> {
        match self.details.final_price {
            Some(price) => Some(price),
            None => self.details.estimated_price,
        }
    }

    /// A positive deposit is due and has not been paid.
    #[must_use]
    pub fn deposit_outstanding(&self) -> bool {
        !self.deposit_paid && self.details.deposit_amount.is_some_and(|amount| amount.is_positive())
    }
}

/// Derived, read-only view of a commission's state for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub status: CommissionStatus,
    pub label: &'static str,
    pub color: &'static str,
    pub progress_percentage: u8,
    pub overdue: bool,
    pub available_events: Vec<Event>,
}

impl StatusSummary {
    #[must_use]
    pub fn of(commission: &Commission, today: NaiveDate) -> Self {
        Self {
            status: commission.status,
            label: commission.status.label(),
            color: commission.status.color().css_class(),
            progress_percentage: commission.progress_percentage(),
            overdue: commission.is_overdue(today),
            available_events: commission.available_events().collect(),
        }
    }
}
