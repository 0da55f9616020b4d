//! Commission lifecycle transitions.
//!
//! The lifecycle is a fixed table of events. Each event names the states it
//! may fire from, the state it leads to, and the date/flag bookkeeping it
//! performs on the commission. Checking happens in two steps so callers can
//! tell an unknown event apart from a known event fired at the wrong time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::status::CommissionStatus;

/// An event that moves a commission between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    ProvideQuote,
    Accept,
    ReceiveDeposit,
    StartWork,
    SubmitForReview,
    RequestChanges,
    Complete,
    Deliver,
    Cancel,
    Reopen,
}

/// Bookkeeping an event performs after the state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SideEffect {
    None,
    /// `deposit_paid = true`; `deposit_paid_at` stamped if unset.
    MarkDepositPaid,
    /// `actual_start_date` stamped if unset.
    StampStart,
    /// `actual_completion_date` stamped if unset.
    StampCompletion,
    /// `delivered_at` stamped if unset.
    StampDelivery,
}

/// One row of the lifecycle table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rule {
    pub(crate) from: &'static [CommissionStatus],
    pub(crate) to: CommissionStatus,
    pub(crate) effect: SideEffect,
}

use CommissionStatus as S;

const fn row(from: &'static [CommissionStatus], to: CommissionStatus, effect: SideEffect) -> Rule {
    Rule { from, to, effect }
}

impl Rule {
    const fn of(event: Event) -> Self {
        match event {
            Event::ProvideQuote => row(&[S::Inquiry], S::Quoted, SideEffect::None),
            Event::Accept => row(&[S::Quoted], S::Accepted, SideEffect::None),
            Event::ReceiveDeposit => row(&[S::Accepted], S::DepositReceived, SideEffect::MarkDepositPaid),
            Event::StartWork => row(&[S::Accepted, S::DepositReceived], S::InProgress, SideEffect::StampStart),
            Event::SubmitForReview => row(&[S::InProgress], S::Review, SideEffect::None),
            Event::RequestChanges => row(&[S::Review], S::InProgress, SideEffect::None),
            Event::Complete => row(&[S::InProgress, S::Review], S::Completed, SideEffect::StampCompletion),
            Event::Deliver => row(&[S::Completed], S::Delivered, SideEffect::StampDelivery),
            Event::Cancel => row(
                &[S::Inquiry, S::Quoted, S::Accepted, S::DepositReceived, S::InProgress],
                S::Cancelled,
                SideEffect::None,
            ),
            Event::Reopen => row(&[S::Cancelled], S::Inquiry, SideEffect::None),
        }
    }
}

impl Event {
    /// Every event, in table order.
    pub const ALL: [Self; 10] = [
        Self::ProvideQuote,
        Self::Accept,
        Self::ReceiveDeposit,
        Self::StartWork,
        Self::SubmitForReview,
        Self::RequestChanges,
        Self::Complete,
        Self::Deliver,
        Self::Cancel,
        Self::Reopen,
    ];

    /// The wire token, e.g. `start_work`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProvideQuote => "provide_quote",
            Self::Accept => "accept",
            Self::ReceiveDeposit => "receive_deposit",
            Self::StartWork => "start_work",
            Self::SubmitForReview => "submit_for_review",
            Self::RequestChanges => "request_changes",
            Self::Complete => "complete",
            Self::Deliver => "deliver",
            Self::Cancel => "cancel",
            Self::Reopen => "reopen",
        }
    }

    pub(crate) const fn rule(self) -> Rule {
        Rule::of(self)
    }

    /// States this event may fire from.
    #[must_use]
    pub fn sources(self) -> &'static [CommissionStatus] {
        self.rule().from
    }

    /// State this event leads to.
    #[must_use]
    pub fn target(self) -> CommissionStatus {
        self.rule().to
    }

    /// Whether the event may fire from `status`.
    #[must_use]
    pub fn is_permitted_from(self, status: CommissionStatus) -> bool {
        self.sources().contains(&status)
    }

    /// Events that may fire from `status`, in table order.
    pub fn permitted_from(status: CommissionStatus) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |event| event.is_permitted_from(status))
    }

    /// Resolve the next state for this event fired from `current`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] when `current` is not
    /// one of the event's source states.
    pub fn next_state(self, current: CommissionStatus) -> Result<CommissionStatus, TransitionError> {
        if self.is_permitted_from(current) {
            Ok(self.target())
        } else {
            Err(TransitionError::InvalidTransition {
                event: self,
                current,
            })
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownEvent(s.to_owned()))
    }
}

/// Why a transition was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The event name is not part of the lifecycle at all.
    #[error("unknown commission event: {0:?}")]
    UnknownEvent(String),
    /// The event exists but cannot fire from the current state.
    #[error("cannot {event} a commission that is {current}")]
    InvalidTransition {
        event: Event,
        current: CommissionStatus,
    },
}

impl TransitionError {
    /// The state the commission was in, when the event was known.
    #[must_use]
    pub const fn current_status(&self) -> Option<CommissionStatus> {
        match self {
            Self::UnknownEvent(_) => None,
            Self::InvalidTransition { current, .. } => Some(*current),
        }
    }
}

/// A completed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub event: Event,
    pub from: CommissionStatus,
    pub to: CommissionStatus,
}
