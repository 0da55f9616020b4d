//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, Role, UserId};
use crate::validation::{Validate, ValidationErrors};

/// A customer or admin account. Password hashes stay in the web crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// `first last`, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.profile.full_name()
    }

    /// Full name, or the email address when no name is on file.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() {
            self.email.to_string()
        } else {
            name
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Name and phone, editable by the user or an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl UserProfile {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_owned()
    }
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("first_name", &self.first_name);
        errors.max_len("first_name", &self.first_name, 100);
        errors.required("last_name", &self.last_name);
        errors.max_len("last_name", &self.last_name, 100);
        errors.max_len_opt("phone", self.phone.as_deref(), 20);
        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        User {
            id: UserId::new(1),
            email: Email::parse("coco@example.com").unwrap(),
            profile: UserProfile {
                first_name: first.to_owned(),
                last_name: last.to_owned(),
                phone: None,
            },
            role: Role::Customer,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(user("Coco", "Marsh").full_name(), "Coco Marsh");
        assert_eq!(user("Coco", "").full_name(), "Coco");
        assert_eq!(user("", "").display_name(), "coco@example.com");
    }

    #[test]
    fn test_profile_validation() {
        let profile = UserProfile {
            first_name: "Coco".to_owned(),
            last_name: " ".to_owned(),
            phone: Some("5".repeat(21)),
        };
        let errors = profile.validate().unwrap_err();
        assert_eq!(errors.on("last_name").len(), 1);
        assert_eq!(errors.on("phone").len(), 1);
        assert!(errors.on("first_name").is_empty());
    }
}
