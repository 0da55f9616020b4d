//! Authorization decisions through the core crate's public API.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Utc};

use cocos_glass_core::policy::{authorize, scope};
use cocos_glass_core::{
    Action, Actor, Category, Commission, CommissionDetails, CommissionId, CommissionStatus,
    CommissionUpdate, CommissionUpdateId, ContactInquiry, Email, ResourceKind, Role, Scope,
    Target, UpdateContext, User, UserId, UserProfile, Work, WorkDetails, WorkId,
};

const CUSTOMER: Actor = Actor::Customer(UserId::new(3));
const OTHER_CUSTOMER: Actor = Actor::Customer(UserId::new(4));
const ADMIN: Actor = Actor::Admin(UserId::new(1));

fn now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_740_000_000, 0).unwrap()
}

fn work(id: i64, published: bool) -> Work {
    Work {
        id: WorkId::new(id),
        slug: format!("work-{id}"),
        details: WorkDetails {
            title: format!("Work {id}"),
            ..WorkDetails::default()
        },
        published,
        featured: false,
        position: 0,
        created_at: now(),
        updated_at: now(),
    }
}

fn commission(owner: i64) -> Commission {
    Commission {
        id: CommissionId::new(owner * 10),
        user_id: UserId::new(owner),
        status: CommissionStatus::InProgress,
        details: CommissionDetails {
            title: "Transom".to_owned(),
            ..CommissionDetails::default()
        },
        actual_start_date: None,
        actual_completion_date: None,
        delivered_at: None,
        deposit_paid: false,
        deposit_paid_at: None,
        created_at: now(),
        updated_at: now(),
    }
}

fn update(commission: &Commission, visible: bool) -> CommissionUpdate {
    CommissionUpdate {
        id: CommissionUpdateId::new(1),
        commission_id: commission.id,
        user_id: None,
        title: "Leading done".to_owned(),
        body: None,
        notify_customer: false,
        visible_to_customer: visible,
        created_at: now(),
        updated_at: now(),
    }
}

fn user(id: i64, role: Role) -> User {
    User {
        id: UserId::new(id),
        email: Email::parse(&format!("user{id}@example.com")).unwrap(),
        profile: UserProfile::default(),
        role,
        created_at: now(),
        updated_at: now(),
    }
}

// ============================================================================
// Gallery
// ============================================================================

#[test]
fn test_drafts_are_hidden_from_visitors() {
    let draft = work(1, false);
    let live = work(2, true);

    for actor in [Actor::Anonymous, CUSTOMER] {
        assert!(authorize(&actor, Action::Show, Target::Record(&live)).is_ok());
        assert!(authorize(&actor, Action::Show, Target::Record(&draft)).is_err());
        assert_eq!(scope::<Work>(&actor), Scope::Published);
    }
    assert!(authorize(&ADMIN, Action::Show, Target::Record(&draft)).is_ok());

    let works = [draft, live];
    let visible: Vec<_> = scope::<Work>(&Actor::Anonymous)
        .filter(&works)
        .map(|w| w.id)
        .collect();
    assert_eq!(visible, [WorkId::new(2)]);
}

#[test]
fn test_only_admins_manage_the_portfolio() {
    for action in [
        Action::Create,
        Action::Update,
        Action::Destroy,
        Action::Publish,
        Action::Unpublish,
        Action::Feature,
        Action::Unfeature,
        Action::Reorder,
    ] {
        assert!(authorize::<Work>(&CUSTOMER, action, Target::Collection).is_err());
        assert!(authorize::<Work>(&ADMIN, action, Target::Collection).is_ok());
    }
    assert!(authorize::<Category>(&Actor::Anonymous, Action::Index, Target::Collection).is_ok());
    assert!(authorize::<Category>(&CUSTOMER, Action::Create, Target::Collection).is_err());
}

// ============================================================================
// Commissions
// ============================================================================

#[test]
fn test_customers_see_only_their_commissions() {
    let mine = commission(3);
    let theirs = commission(4);

    assert!(authorize(&CUSTOMER, Action::Show, Target::Record(&mine)).is_ok());
    let denied = authorize(&CUSTOMER, Action::Show, Target::Record(&theirs)).unwrap_err();
    assert_eq!(denied.action, Action::Show);
    assert_eq!(denied.resource, ResourceKind::Commission);

    assert_eq!(scope::<Commission>(&CUSTOMER), Scope::OwnedBy(UserId::new(3)));
    assert_eq!(scope::<Commission>(&ADMIN), Scope::All);
    assert!(scope::<Commission>(&Actor::Anonymous).is_empty());
    assert!(authorize::<Commission>(&Actor::Anonymous, Action::Index, Target::Collection).is_err());
}

#[test]
fn test_only_admins_fire_transitions() {
    let mine = commission(3);
    assert!(authorize(&CUSTOMER, Action::Transition, Target::Record(&mine)).is_err());
    assert!(authorize(&ADMIN, Action::Transition, Target::Record(&mine)).is_ok());
}

#[test]
fn test_internal_updates_stay_internal() {
    let mine = commission(3);
    let visible = update(&mine, true);
    let internal = update(&mine, false);

    let show = |actor: &Actor, u: &CommissionUpdate| {
        authorize(actor, Action::Show, Target::Record(&UpdateContext::new(&mine, u))).is_ok()
    };
    assert!(show(&CUSTOMER, &visible));
    assert!(!show(&CUSTOMER, &internal));
    assert!(!show(&OTHER_CUSTOMER, &visible));
    assert!(show(&ADMIN, &internal));
    assert!(
        authorize::<UpdateContext<'_>>(&CUSTOMER, Action::Create, Target::Collection).is_err()
    );
}

// ============================================================================
// Inquiries and accounts
// ============================================================================

#[test]
fn test_anyone_may_submit_inquiries_but_only_admins_read_them() {
    for actor in [Actor::Anonymous, CUSTOMER, ADMIN] {
        assert!(authorize::<ContactInquiry>(&actor, Action::Create, Target::Collection).is_ok());
    }
    for action in [Action::Index, Action::MarkResponded, Action::Archive] {
        assert!(authorize::<ContactInquiry>(&CUSTOMER, action, Target::Collection).is_err());
        assert!(authorize::<ContactInquiry>(&ADMIN, action, Target::Collection).is_ok());
    }
    assert!(scope::<ContactInquiry>(&CUSTOMER).is_empty());
}

#[test]
fn test_admins_cannot_delete_themselves() {
    let admin = user(1, Role::Admin);
    let customer = user(3, Role::Customer);

    assert!(authorize(&ADMIN, Action::Destroy, Target::Record(&customer)).is_ok());
    assert!(authorize(&ADMIN, Action::Destroy, Target::Record(&admin)).is_err());
    assert!(authorize(&CUSTOMER, Action::Update, Target::Record(&customer)).is_ok());
    assert!(authorize(&OTHER_CUSTOMER, Action::Show, Target::Record(&customer)).is_err());
    assert_eq!(scope::<User>(&CUSTOMER), Scope::Only(UserId::new(3)));
}
