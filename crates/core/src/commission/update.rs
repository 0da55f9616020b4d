//! Progress notes posted on a commission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Commission;
use crate::types::{CommissionId, CommissionUpdateId, UserId};
use crate::validation::{Validate, ValidationErrors};

/// A timestamped note on a commission's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionUpdate {
    pub id: CommissionUpdateId,
    pub commission_id: CommissionId,
    /// Admin who wrote the note; `None` for system-authored notes.
    pub user_id: Option<UserId>,
    pub title: String,
    pub body: Option<String>,
    pub notify_customer: bool,
    /// Internal notes (`false`) never appear in the customer timeline.
    pub visible_to_customer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionUpdate {
    /// Whether creating this update should email the commission's owner.
    ///
    /// Checked once, when the update is created. Later edits to either flag
    /// never send anything.
    #[must_use]
    pub const fn wants_notification(&self) -> bool {
        self.notify_customer && self.visible_to_customer
    }
}

/// Editable fields of a commission update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCommissionUpdate {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_true")]
    pub notify_customer: bool,
    #[serde(default = "default_true")]
    pub visible_to_customer: bool,
}

const fn default_true() -> bool {
    true
}

impl Validate for NewCommissionUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &self.title);
        errors.max_len("title", &self.title, 200);
        errors.max_len_opt("body", self.body.as_deref(), 5000);
        errors.into_result()
    }
}

/// An update together with the commission it belongs to.
///
/// Update visibility depends on who owns the parent commission, so
/// authorization always sees both.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub commission: &'a Commission,
    pub update: &'a CommissionUpdate,
}

impl<'a> UpdateContext<'a> {
    #[must_use]
    pub const fn new(commission: &'a Commission, update: &'a CommissionUpdate) -> Self {
        Self { commission, update }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_to_true() {
        let update: NewCommissionUpdate =
            serde_json::from_str(r#"{"title": "Glass cut"}"#).unwrap();
        assert!(update.notify_customer);
        assert!(update.visible_to_customer);
    }

    #[test]
    fn test_validation() {
        let update = NewCommissionUpdate {
            title: " ".to_owned(),
            body: Some("b".repeat(5001)),
            notify_customer: true,
            visible_to_customer: true,
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.on("title").len(), 1);
        assert_eq!(errors.on("body").len(), 1);
    }
}
