//! The entity issuing a request.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// Who is acting: an anonymous visitor or a signed-in user at one of the
/// two capability levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    /// Not signed in.
    #[default]
    Anonymous,
    /// Signed-in customer; restricted to records they own.
    Customer(UserId),
    /// Signed-in admin; unrestricted.
    Admin(UserId),
}

impl Actor {
    /// Build the actor for a signed-in user.
    #[must_use]
    pub const fn signed_in(user_id: UserId, role: Role) -> Self {
        match role {
            Role::Customer => Self::Customer(user_id),
            Role::Admin => Self::Admin(user_id),
        }
    }

    /// Build an actor from an optional session identity.
    #[must_use]
    pub fn from_session(identity: Option<(UserId, Role)>) -> Self {
        identity.map_or(Self::Anonymous, |(id, role)| Self::signed_in(id, role))
    }

    /// The signed-in user's ID, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Customer(id) | Self::Admin(id) => Some(*id),
        }
    }

    /// Whether the actor is an admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Whether the actor is signed in at all.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// Whether the actor is the given user.
    #[must_use]
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id() == Some(user_id)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Customer(id) => write!(f, "customer:{id}"),
            Self::Admin(id) => write!(f, "admin:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session() {
        assert_eq!(Actor::from_session(None), Actor::Anonymous);
        assert_eq!(
            Actor::from_session(Some((UserId::new(3), Role::Admin))),
            Actor::Admin(UserId::new(3))
        );
    }

    #[test]
    fn test_identity_helpers() {
        let customer = Actor::Customer(UserId::new(9));
        assert!(customer.is_signed_in());
        assert!(!customer.is_admin());
        assert!(customer.is(UserId::new(9)));
        assert!(!customer.is(UserId::new(10)));
        assert!(!Actor::Anonymous.is_signed_in());
        assert_eq!(Actor::Anonymous.user_id(), None);
    }
}
