//! Authorization: who may do what to which record, and which records a
//! listing may reveal.
//!
//! Every resource type has one [`Policy`] holding an explicit table of
//! `(action, rule)` grants. Lookups go through [`Policy::of`]; an action a
//! table does not mention is denied.
//!
//! ```
//! use cocos_glass_core::policy::{self, Action, Target};
//! use cocos_glass_core::{Actor, Commission, UserId};
//!
//! let customer = Actor::Customer(UserId::new(7));
//! // Signed-in users may list commissions (the listing is then scoped).
//! assert!(policy::authorize::<Commission>(&customer, Action::Index, Target::Collection).is_ok());
//! // Only admins may fire lifecycle events.
//! assert!(policy::authorize::<Commission>(&customer, Action::Transition, Target::Collection).is_err());
//! ```

mod rules;

use std::fmt;

use serde::Serialize;

use crate::catalog::{Category, Work};
use crate::commission::{Commission, UpdateContext};
use crate::inquiry::ContactInquiry;
use crate::types::UserId;
use crate::user::User;
use crate::Actor;

/// An operation an actor asks to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Index,
    Show,
    Create,
    Update,
    Destroy,
    Transition,
    Publish,
    Unpublish,
    Feature,
    Unfeature,
    Reorder,
    MarkResponded,
    Archive,
}

impl Action {
    pub const ALL: [Self; 13] = [
        Self::Index,
        Self::Show,
        Self::Create,
        Self::Update,
        Self::Destroy,
        Self::Transition,
        Self::Publish,
        Self::Unpublish,
        Self::Feature,
        Self::Unfeature,
        Self::Reorder,
        Self::MarkResponded,
        Self::Archive,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Show => "show",
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
            Self::Transition => "transition",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Feature => "feature",
            Self::Unfeature => "unfeature",
            Self::Reorder => "reorder",
            Self::MarkResponded => "mark_responded",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource types under access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Work,
    Category,
    Commission,
    CommissionUpdate,
    ContactInquiry,
    User,
}

impl ResourceKind {
    pub const ALL: [Self; 6] = [
        Self::Work,
        Self::Category,
        Self::Commission,
        Self::CommissionUpdate,
        Self::ContactInquiry,
        Self::User,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Category => "category",
            Self::Commission => "commission",
            Self::CommissionUpdate => "commission_update",
            Self::ContactInquiry => "contact_inquiry",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The condition attached to a granted action.
///
/// Rules that inspect a record only let admins through when checked
/// against a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Anyone,
    SignedIn,
    Admin,
    /// Admin, or the record's owner.
    AdminOrOwner,
    /// Admin, or the record is published.
    AdminOrPublished,
    /// Admin, or the record's owner when it is marked visible to customers.
    AdminOrVisibleToOwner,
    /// Admin, or the record is the actor's own account.
    AdminOrSelf,
    /// Admin, and the record is not the actor's own account.
    AdminExceptSelf,
}

/// What a listing may show to each kind of actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeRule {
    All,
    PublishedUnlessAdmin,
    OwnedUnlessAdmin,
    VisibleOwnedUnlessAdmin,
    AdminOnly,
    SelfUnlessAdmin,
}

/// The record facts authorization rules look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facts {
    /// The customer who owns the record (for updates: owns the parent).
    pub owner_id: Option<UserId>,
    pub published: bool,
    pub visible_to_customer: bool,
    /// For user records, the account itself.
    pub account_id: Option<UserId>,
}

/// A record type that can be authorized and scoped.
pub trait Authorizable {
    const KIND: ResourceKind;

    fn facts(&self) -> Facts;
}

/// What an action is checked against.
#[derive(Debug)]
pub enum Target<'a, R> {
    /// The record type as a whole (index, create, bulk actions).
    Collection,
    Record(&'a R),
}

impl<R> Clone for Target<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Target<'_, R> {}

/// Authorization was denied.
///
/// Carries what was attempted for logging; clients only ever see a generic
/// access-denied message.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("not authorized to {action} {resource}")]
pub struct NotAuthorized {
    pub action: Action,
    pub resource: ResourceKind,
}

/// The subset of a record type an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Scope {
    All,
    /// Nothing at all.
    None,
    Published,
    OwnedBy(UserId),
    /// Owned by the user and visible to customers.
    VisibleToOwner(UserId),
    /// Only the user's own account.
    Only(UserId),
}

impl Scope {
    /// Whether a record falls inside the scope.
    #[must_use]
    pub fn permits<R: Authorizable>(&self, record: &R) -> bool {
        let facts = record.facts();
        match *self {
            Self::All => true,
            Self::None => false,
            Self::Published => facts.published,
            Self::OwnedBy(id) => facts.owner_id == Some(id),
            Self::VisibleToOwner(id) => facts.owner_id == Some(id) && facts.visible_to_customer,
            Self::Only(id) => facts.account_id == Some(id),
        }
    }

    /// Keep only the records inside the scope.
    pub fn filter<'a, R: Authorizable + 'a>(
        self,
        records: impl IntoIterator<Item = &'a R>,
    ) -> impl Iterator<Item = &'a R> {
        records.into_iter().filter(move |record| self.permits(*record))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Access rules for one resource type.
#[derive(Debug)]
pub struct Policy {
    kind: ResourceKind,
    rules: &'static [(Action, Rule)],
    scope: ScopeRule,
}

impl Policy {
    /// The policy registered for a resource type.
    #[must_use]
    pub fn of(kind: ResourceKind) -> &'static Self {
        match kind {
            ResourceKind::Work => &rules::WORK,
            ResourceKind::Category => &rules::CATEGORY,
            ResourceKind::Commission => &rules::COMMISSION,
            ResourceKind::CommissionUpdate => &rules::COMMISSION_UPDATE,
            ResourceKind::ContactInquiry => &rules::CONTACT_INQUIRY,
            ResourceKind::User => &rules::USER,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The rule granting `action`, if the table lists one.
    #[must_use]
    pub fn rule(&self, action: Action) -> Option<Rule> {
        self.rules
            .iter()
            .find(|(granted, _)| *granted == action)
            .map(|(_, rule)| *rule)
    }

    /// Decide `action` for `actor`. `facts` is `None` for collection-level
    /// checks.
    #[must_use]
    pub fn allows(&self, actor: &Actor, action: Action, facts: Option<&Facts>) -> bool {
        let Some(rule) = self.rule(action) else {
            return false;
        };
        let admin = actor.is_admin();
        let is_actor = |id: Option<UserId>| id.is_some() && id == actor.user_id();

        match (rule, facts) {
            (Rule::Anyone, _) => true,
            (Rule::SignedIn, _) => actor.is_signed_in(),
            (Rule::Admin, _) => admin,
            (Rule::AdminOrOwner, Some(facts)) => admin || is_actor(facts.owner_id),
            (Rule::AdminOrPublished, Some(facts)) => admin || facts.published,
            (Rule::AdminOrVisibleToOwner, Some(facts)) => {
                admin || (is_actor(facts.owner_id) && facts.visible_to_customer)
            }
            (Rule::AdminOrSelf, Some(facts)) => admin || is_actor(facts.account_id),
            (Rule::AdminExceptSelf, Some(facts)) => admin && !is_actor(facts.account_id),
            (
                Rule::AdminOrOwner
                | Rule::AdminOrPublished
                | Rule::AdminOrVisibleToOwner
                | Rule::AdminOrSelf
                | Rule::AdminExceptSelf,
                None,
            ) => admin,
        }
    }

    /// The listing scope for `actor`. Never fails; actors with no
    /// visibility get [`Scope::None`].
    #[must_use]
    pub const fn scope(&self, actor: &Actor) -> Scope {
        match (self.scope, *actor) {
            (ScopeRule::All, _) | (_, Actor::Admin(_)) => Scope::All,
            (ScopeRule::PublishedUnlessAdmin, _) => Scope::Published,
            (ScopeRule::OwnedUnlessAdmin, Actor::Customer(id)) => Scope::OwnedBy(id),
            (ScopeRule::VisibleOwnedUnlessAdmin, Actor::Customer(id)) => Scope::VisibleToOwner(id),
            (ScopeRule::SelfUnlessAdmin, Actor::Customer(id)) => Scope::Only(id),
            (
                ScopeRule::OwnedUnlessAdmin
                | ScopeRule::VisibleOwnedUnlessAdmin
                | ScopeRule::SelfUnlessAdmin,
                Actor::Anonymous,
            )
            | (ScopeRule::AdminOnly, _) => Scope::None,
        }
    }
}

/// Check `action` on `target` for `actor`.
///
/// # Errors
///
/// Returns [`NotAuthorized`] when the policy for `R` does not grant the
/// action.
pub fn authorize<R: Authorizable>(
    actor: &Actor,
    action: Action,
    target: Target<'_, R>,
) -> Result<(), NotAuthorized> {
    let facts = match target {
        Target::Collection => None,
        Target::Record(record) => Some(record.facts()),
    };
    if Policy::of(R::KIND).allows(actor, action, facts.as_ref()) {
        Ok(())
    } else {
        Err(NotAuthorized {
            action,
            resource: R::KIND,
        })
    }
}

/// The listing scope of `R` for `actor`.
#[must_use]
pub fn scope<R: Authorizable>(actor: &Actor) -> Scope {
    Policy::of(R::KIND).scope(actor)
}

impl Authorizable for Work {
    const KIND: ResourceKind = ResourceKind::Work;

    fn facts(&self) -> Facts {
        Facts {
            published: self.published,
            ..Facts::default()
        }
    }
}

impl Authorizable for Category {
    const KIND: ResourceKind = ResourceKind::Category;

    fn facts(&self) -> Facts {
        Facts::default()
    }
}

impl Authorizable for Commission {
    const KIND: ResourceKind = ResourceKind::Commission;

    fn facts(&self) -> Facts {
        Facts {
            owner_id: Some(self.user_id),
            ..Facts::default()
        }
    }
}

impl Authorizable for UpdateContext<'_> {
    const KIND: ResourceKind = ResourceKind::CommissionUpdate;

    fn facts(&self) -> Facts {
        Facts {
            owner_id: Some(self.commission.user_id),
            visible_to_customer: self.update.visible_to_customer,
            ..Facts::default()
        }
    }
}

impl Authorizable for ContactInquiry {
    const KIND: ResourceKind = ResourceKind::ContactInquiry;

    fn facts(&self) -> Facts {
        Facts::default()
    }
}

impl Authorizable for User {
    const KIND: ResourceKind = ResourceKind::User;

    fn facts(&self) -> Facts {
        Facts {
            account_id: Some(self.id),
            ..Facts::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::commission::tests::commission;
    use crate::commission::{CommissionStatus, CommissionUpdate};
    use crate::types::{CommissionUpdateId, Email, Role};
    use crate::user::UserProfile;

    const ANON: Actor = Actor::Anonymous;
    const ADMIN: Actor = Actor::Admin(UserId::new(1));
    const ALICE: Actor = Actor::Customer(UserId::new(10));
    const BOB: Actor = Actor::Customer(UserId::new(20));

    fn update(commission: &Commission, visible: bool) -> CommissionUpdate {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        CommissionUpdate {
            id: CommissionUpdateId::new(1),
            commission_id: commission.id,
            user_id: Some(UserId::new(1)),
            title: "Leading done".to_owned(),
            body: None,
            notify_customer: true,
            visible_to_customer: visible,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: i64) -> User {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        User {
            id: UserId::new(id),
            email: Email::parse(&format!("user{id}@example.com")).unwrap(),
            profile: UserProfile::default(),
            role: Role::Customer,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_commission_show() {
        let alices = commission(10, CommissionStatus::Quoted);
        let target = Target::Record(&alices);

        assert_eq!(
            authorize(&ANON, Action::Show, target),
            Err(NotAuthorized {
                action: Action::Show,
                resource: ResourceKind::Commission
            })
        );
        assert!(authorize(&ALICE, Action::Show, target).is_ok());
        assert!(authorize(&BOB, Action::Show, target).is_err());
        assert!(authorize(&ADMIN, Action::Show, target).is_ok());
        assert!(authorize(&ALICE, Action::Transition, target).is_err());
        assert!(authorize(&ADMIN, Action::Transition, target).is_ok());
    }

    #[test]
    fn test_commission_scope() {
        let records = [
            commission(10, CommissionStatus::Inquiry),
            commission(20, CommissionStatus::InProgress),
            commission(1, CommissionStatus::Delivered),
        ];

        let alice_scope = scope::<Commission>(&ALICE);
        assert_eq!(alice_scope, Scope::OwnedBy(UserId::new(10)));
        let visible: Vec<_> = alice_scope.filter(&records).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible.first().unwrap().user_id, UserId::new(10));

        assert_eq!(scope::<Commission>(&ADMIN).filter(&records).count(), 3);
        assert_eq!(scope::<Commission>(&ANON).filter(&records).count(), 0);
    }

    #[test]
    fn test_update_visibility() {
        let alices = commission(10, CommissionStatus::InProgress);
        let public = update(&alices, true);
        let internal = update(&alices, false);
        let public = UpdateContext::new(&alices, &public);
        let internal = UpdateContext::new(&alices, &internal);

        assert!(authorize(&ALICE, Action::Show, Target::Record(&public)).is_ok());
        assert!(authorize(&ALICE, Action::Show, Target::Record(&internal)).is_err());
        assert!(authorize(&BOB, Action::Show, Target::Record(&public)).is_err());
        assert!(authorize(&ADMIN, Action::Show, Target::Record(&internal)).is_ok());
        assert!(authorize(&ALICE, Action::Create, Target::Record(&public)).is_err());

        let timeline = [public, internal];
        assert_eq!(scope::<UpdateContext<'_>>(&ALICE).filter(&timeline).count(), 1);
        assert_eq!(scope::<UpdateContext<'_>>(&BOB).filter(&timeline).count(), 0);
        assert_eq!(scope::<UpdateContext<'_>>(&ANON), Scope::None);
    }

    #[test]
    fn test_user_rules() {
        let alice = user(10);
        let admin = user(1);

        assert!(authorize(&ALICE, Action::Show, Target::Record(&alice)).is_ok());
        assert!(authorize(&BOB, Action::Show, Target::Record(&alice)).is_err());
        assert!(authorize(&ALICE, Action::Update, Target::Record(&alice)).is_ok());
        assert!(authorize(&ALICE, Action::Destroy, Target::Record(&alice)).is_err());
        assert!(authorize(&ADMIN, Action::Destroy, Target::Record(&alice)).is_ok());
        assert!(authorize(&ADMIN, Action::Destroy, Target::Record(&admin)).is_err());
        assert!(authorize::<User>(&ALICE, Action::Index, Target::Collection).is_err());

        assert_eq!(scope::<User>(&ALICE), Scope::Only(UserId::new(10)));
        assert!(scope::<User>(&ALICE).permits(&alice));
        assert!(!scope::<User>(&BOB).permits(&alice));
        assert!(scope::<User>(&ANON).is_empty());
    }

    #[test]
    fn test_inquiries_are_admin_only_except_create() {
        for actor in [ANON, ALICE] {
            for action in Action::ALL {
                let allowed =
                    authorize::<ContactInquiry>(&actor, action, Target::Collection).is_ok();
                assert_eq!(allowed, action == Action::Create, "{actor} {action}");
            }
            assert_eq!(scope::<ContactInquiry>(&actor), Scope::None);
        }
        assert_eq!(scope::<ContactInquiry>(&ADMIN), Scope::All);
    }

    #[test]
    fn test_work_and_category_listings_are_public() {
        assert!(authorize::<Work>(&ANON, Action::Index, Target::Collection).is_ok());
        assert!(authorize::<Category>(&ANON, Action::Show, Target::Collection).is_ok());
        assert_eq!(scope::<Work>(&ANON), Scope::Published);
        assert_eq!(scope::<Work>(&ALICE), Scope::Published);
        assert_eq!(scope::<Work>(&ADMIN), Scope::All);
        assert_eq!(scope::<Category>(&ANON), Scope::All);
        for action in [Action::Publish, Action::Feature, Action::Reorder, Action::Destroy] {
            assert!(authorize::<Work>(&ALICE, action, Target::Collection).is_err());
            assert!(authorize::<Work>(&ADMIN, action, Target::Collection).is_ok());
        }
    }

    #[test]
    fn test_unlisted_actions_are_denied_even_for_admin() {
        let unlisted = [
            (ResourceKind::Category, Action::Publish),
            (ResourceKind::Commission, Action::Archive),
            (ResourceKind::CommissionUpdate, Action::Index),
            (ResourceKind::User, Action::Transition),
        ];
        for (kind, action) in unlisted {
            assert!(!Policy::of(kind).allows(&ADMIN, action, None), "{kind} {action}");
        }
    }

    #[test]
    fn test_registry_is_keyed_by_kind() {
        for kind in ResourceKind::ALL {
            assert_eq!(Policy::of(kind).kind(), kind);
        }
    }
}
