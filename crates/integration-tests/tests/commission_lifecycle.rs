//! Commission lifecycle through the core crate's public API.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, NaiveDate, Utc};

use cocos_glass_core::{
    Commission, CommissionDetails, CommissionId, CommissionStatus, CommissionUpdate,
    CommissionUpdateId, Email, Event, Notification, Price, StatusSummary, TransitionError, UserId,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn new_commission() -> Commission {
    let created_at = DateTime::<Utc>::from_timestamp(1_740_000_000, 0).unwrap();
    Commission {
        id: CommissionId::new(7),
        user_id: UserId::new(3),
        status: CommissionStatus::default(),
        details: CommissionDetails {
            title: "Kitchen window".to_owned(),
            estimated_price: Some(Price::from_cents(120_000).unwrap()),
            deposit_amount: Some(Price::from_cents(30_000).unwrap()),
            estimated_completion_date: Some(day(20)),
            ..CommissionDetails::default()
        },
        actual_start_date: None,
        actual_completion_date: None,
        delivered_at: None,
        deposit_paid: false,
        deposit_paid_at: None,
        created_at,
        updated_at: created_at,
    }
}

fn owner() -> Email {
    Email::parse("customer@example.com").unwrap()
}

#[test]
fn test_full_happy_path_stamps_dates_once() {
    let mut commission = new_commission();
    assert_eq!(commission.status, CommissionStatus::Inquiry);
    assert!(commission.deposit_outstanding());

    commission.fire("provide_quote", day(1)).unwrap();
    commission.fire("accept", day(2)).unwrap();
    commission.fire("receive_deposit", day(3)).unwrap();
    assert!(commission.deposit_paid);
    assert_eq!(commission.deposit_paid_at, Some(day(3)));
    assert!(!commission.deposit_outstanding());

    commission.fire("start_work", day(4)).unwrap();
    commission.fire("submit_for_review", day(10)).unwrap();
    commission.fire("request_changes", day(11)).unwrap();
    assert_eq!(commission.status, CommissionStatus::InProgress);
    // Re-entering in_progress does not move the start date.
    assert_eq!(commission.actual_start_date, Some(day(4)));
    assert_eq!(commission.days_since_start(day(11)), Some(7));

    commission.fire("complete", day(15)).unwrap();
    commission.fire("deliver", day(16)).unwrap();

    assert_eq!(commission.status, CommissionStatus::Delivered);
    assert_eq!(commission.actual_completion_date, Some(day(15)));
    assert_eq!(commission.delivered_at, Some(day(16)));
    assert!(!commission.is_active());
    assert_eq!(commission.available_events().count(), 0);
}

#[test]
fn test_start_work_may_skip_the_deposit() {
    let mut commission = new_commission();
    commission.fire("provide_quote", day(1)).unwrap();
    commission.fire("accept", day(2)).unwrap();

    let transition = commission.fire("start_work", day(3)).unwrap();
    assert_eq!(transition.from, CommissionStatus::Accepted);
    assert_eq!(transition.to, CommissionStatus::InProgress);
    assert!(!commission.deposit_paid);
}

#[test]
fn test_rejected_events_leave_the_commission_untouched() {
    let mut commission = new_commission();
    let before = commission.clone();

    assert_eq!(
        commission.fire("deliver", day(1)),
        Err(TransitionError::InvalidTransition {
            event: Event::Deliver,
            current: CommissionStatus::Inquiry,
        })
    );
    assert_eq!(
        commission.fire("approve", day(1)),
        Err(TransitionError::UnknownEvent("approve".to_owned()))
    );
    assert_eq!(commission, before);
}

#[test]
fn test_cancel_and_reopen() {
    let mut commission = new_commission();
    commission.fire("provide_quote", day(1)).unwrap();
    commission.fire("cancel", day(2)).unwrap();
    assert_eq!(commission.status, CommissionStatus::Cancelled);
    assert!(!commission.is_overdue(day(28)));

    commission.fire("reopen", day(3)).unwrap();
    assert_eq!(commission.status, CommissionStatus::Inquiry);
}

#[test]
fn test_cannot_cancel_once_in_review() {
    let mut commission = new_commission();
    for event in ["provide_quote", "accept", "start_work", "submit_for_review"] {
        commission.fire(event, day(1)).unwrap();
    }
    let err = commission.fire("cancel", day(2)).unwrap_err();
    assert_eq!(err.current_status(), Some(CommissionStatus::Review));
}

#[test]
fn test_status_summary_reports_overdue() {
    let mut commission = new_commission();
    commission.fire("provide_quote", day(1)).unwrap();

    let summary = StatusSummary::of(&commission, day(21));
    assert_eq!(summary.label, "Quoted");
    assert!(summary.overdue);
    assert_eq!(summary.available_events, [Event::Accept, Event::Cancel]);
    assert_eq!(commission.days_until_estimated_completion(day(21)), Some(-1));
}

#[test]
fn test_price_display_prefers_final_price() {
    let mut commission = new_commission();
    assert_eq!(commission.price_display(), commission.details.estimated_price);

    let final_price = Price::from_cents(135_000).unwrap();
    commission.details.final_price = Some(final_price);
    assert_eq!(commission.price_display(), Some(final_price));
}

// ============================================================================
// Notification decisions
// ============================================================================

#[test]
fn test_transition_notifications() {
    let mut commission = new_commission();
    let to = owner();

    let quoted = commission.fire("provide_quote", day(1)).unwrap();
    assert_eq!(
        Notification::for_transition(commission.id, &quoted, Some(&to)),
        Some(Notification::QuoteProvided {
            to: to.clone(),
            commission_id: commission.id,
        })
    );

    let accepted = commission.fire("accept", day(2)).unwrap();
    assert_eq!(
        Notification::for_transition(commission.id, &accepted, Some(&to)),
        Some(Notification::StatusChanged {
            to: to.clone(),
            commission_id: commission.id,
            previous_status: CommissionStatus::Quoted,
        })
    );

    commission.fire("start_work", day(3)).unwrap();
    let completed = commission.fire("complete", day(9)).unwrap();
    let mail = Notification::for_transition(commission.id, &completed, Some(&to)).unwrap();
    assert_eq!(mail.template(), "commission_completed");
    assert_eq!(mail.recipient(), &to);

    assert_eq!(
        Notification::for_transition(commission.id, &completed, None),
        None
    );
}

#[test]
fn test_update_notification_needs_both_flags() {
    let created_at = DateTime::<Utc>::from_timestamp(1_740_000_000, 0).unwrap();
    let mut update = CommissionUpdate {
        id: CommissionUpdateId::new(1),
        commission_id: CommissionId::new(7),
        user_id: Some(UserId::new(1)),
        title: "Glass selected".to_owned(),
        body: None,
        notify_customer: true,
        visible_to_customer: true,
        created_at,
        updated_at: created_at,
    };
    let to = owner();

    assert!(Notification::for_new_update(&update, Some(&to)).is_some());
    assert!(Notification::for_new_update(&update, None).is_none());

    update.visible_to_customer = false;
    assert!(Notification::for_new_update(&update, Some(&to)).is_none());

    update.visible_to_customer = true;
    update.notify_customer = false;
    assert!(Notification::for_new_update(&update, Some(&to)).is_none());
}
