//! Per-resource rule tables.
//!
//! Each resource lists the actions it grants and the condition attached to
//! each. Anything not listed is denied.

use super::{Action, Policy, ResourceKind, Rule, ScopeRule};

use Action as A;

pub(super) static WORK: Policy = Policy {
    kind: ResourceKind::Work,
    rules: &[
        (A::Index, Rule::Anyone),
        (A::Show, Rule::AdminOrPublished),
        (A::Create, Rule::Admin),
        (A::Update, Rule::Admin),
        (A::Destroy, Rule::Admin),
        (A::Publish, Rule::Admin),
        (A::Unpublish, Rule::Admin),
        (A::Feature, Rule::Admin),
        (A::Unfeature, Rule::Admin),
        (A::Reorder, Rule::Admin),
    ],
    scope: ScopeRule::PublishedUnlessAdmin,
};

pub(super) static CATEGORY: Policy = Policy {
    kind: ResourceKind::Category,
    rules: &[
        (A::Index, Rule::Anyone),
        (A::Show, Rule::Anyone),
        (A::Create, Rule::Admin),
        (A::Update, Rule::Admin),
        (A::Destroy, Rule::Admin),
    ],
    scope: ScopeRule::All,
};

pub(super) static COMMISSION: Policy = Policy {
    kind: ResourceKind::Commission,
    rules: &[
        (A::Index, Rule::SignedIn),
        (A::Show, Rule::AdminOrOwner),
        (A::Create, Rule::Admin),
        (A::Update, Rule::Admin),
        (A::Destroy, Rule::Admin),
        (A::Transition, Rule::Admin),
    ],
    scope: ScopeRule::OwnedUnlessAdmin,
};

// Listed under their commission; there is no standalone index.
pub(super) static COMMISSION_UPDATE: Policy = Policy {
    kind: ResourceKind::CommissionUpdate,
    rules: &[
        (A::Show, Rule::AdminOrVisibleToOwner),
        (A::Create, Rule::Admin),
        (A::Update, Rule::Admin),
        (A::Destroy, Rule::Admin),
    ],
    scope: ScopeRule::VisibleOwnedUnlessAdmin,
};

pub(super) static CONTACT_INQUIRY: Policy = Policy {
    kind: ResourceKind::ContactInquiry,
    rules: &[
        (A::Index, Rule::Admin),
        (A::Show, Rule::Admin),
        (A::Create, Rule::Anyone),
        (A::Update, Rule::Admin),
        (A::Destroy, Rule::Admin),
        (A::MarkResponded, Rule::Admin),
        (A::Archive, Rule::Admin),
    ],
    scope: ScopeRule::AdminOnly,
};

pub(super) static USER: Policy = Policy {
    kind: ResourceKind::User,
    rules: &[
        (A::Index, Rule::Admin),
        (A::Show, Rule::AdminOrSelf),
        (A::Create, Rule::AdminOrSelf),
        (A::Update, Rule::AdminOrSelf),
        (A::Destroy, Rule::AdminExceptSelf),
    ],
    scope: ScopeRule::SelfUnlessAdmin,
};
