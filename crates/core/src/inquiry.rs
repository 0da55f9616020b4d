//! Contact-form submissions.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContactInquiryId, Email, InquiryStatus};
use crate::validation::{Validate, ValidationErrors};

/// A message sent through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInquiry {
    pub id: ContactInquiryId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    /// Admin-only.
    pub admin_notes: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactInquiry {
    /// Mark the inquiry answered. `responded_at` keeps the first response
    /// time if this is called again.
    pub fn mark_responded(&mut self, now: DateTime<Utc>) {
        self.status = InquiryStatus::Responded;
        self.responded_at.get_or_insert(now);
    }

    pub const fn archive(&mut self) {
        self.status = InquiryStatus::Archived;
    }

    /// Time between submission and first response.
    #[must_use]
    pub fn response_time(&self) -> Option<TimeDelta> {
        self.responded_at.map(|at| at - self.created_at)
    }

    /// Subject line for admin mail, falling back when none was given.
    #[must_use]
    pub fn subject_or_default(&self) -> &str {
        self.subject
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Contact Form Submission")
    }
}

/// A submission as received from the form, before it is stored.
///
/// `email` stays a raw string here so a malformed address is reported as a
/// field error alongside the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactInquiry {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

impl NewContactInquiry {
    /// Validate and return the parsed sender address.
    ///
    /// # Errors
    ///
    /// Returns every violated field constraint.
    pub fn validated_email(&self) -> Result<Email, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        let email = Email::parse(&self.email);
        if let Err(err) = &email {
            errors.add("email", err.to_string());
        }
        match email {
            Ok(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }

    fn check(&self, errors: &mut ValidationErrors) {
        errors.required("name", &self.name);
        errors.max_len("name", &self.name, 100);
        errors.max_len_opt("phone", self.phone.as_deref(), 20);
        errors.max_len_opt("subject", self.subject.as_deref(), 200);
        errors.required("message", &self.message);
        errors.min_len("message", &self.message, 10);
        errors.max_len("message", &self.message, 5000);
    }
}

impl Validate for NewContactInquiry {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.validated_email().map(|_| ())
    }
}

/// Admin notes are the only field editable after submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryNotes {
    pub admin_notes: Option<String>,
}

impl Validate for InquiryNotes {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.max_len_opt("admin_notes", self.admin_notes.as_deref(), 2000);
        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn inquiry() -> ContactInquiry {
        let created_at = DateTime::<Utc>::from_timestamp(1_750_000_000, 0).unwrap();
        ContactInquiry {
            id: ContactInquiryId::new(1),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            phone: None,
            subject: None,
            message: "I'd like a window for my stairwell.".to_owned(),
            status: InquiryStatus::Pending,
            admin_notes: None,
            responded_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_mark_responded_sets_timestamp_once() {
        let mut inquiry = inquiry();
        assert_eq!(inquiry.response_time(), None);

        let first = inquiry.created_at + TimeDelta::hours(1);
        inquiry.mark_responded(first);
        assert_eq!(inquiry.status, InquiryStatus::Responded);
        assert_eq!(inquiry.response_time(), Some(TimeDelta::hours(1)));

        inquiry.archive();
        inquiry.mark_responded(first + TimeDelta::days(2));
        assert_eq!(inquiry.responded_at, Some(first));
    }

    #[test]
    fn test_subject_fallback() {
        let mut inquiry = inquiry();
        assert_eq!(inquiry.subject_or_default(), "Contact Form Submission");
        inquiry.subject = Some("Repair quote".to_owned());
        assert_eq!(inquiry.subject_or_default(), "Repair quote");
    }

    #[test]
    fn test_new_inquiry_validation() {
        let form = NewContactInquiry {
            name: "Ada".to_owned(),
            email: "invalid-email".to_owned(),
            message: "too short".to_owned(),
            ..NewContactInquiry::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(!errors.on("email").is_empty());
        assert_eq!(errors.on("message").len(), 1);

        let form = NewContactInquiry {
            email: " Ada@Example.com ".to_owned(),
            message: "Please quote a six-panel door.".to_owned(),
            ..form
        };
        assert_eq!(form.validated_email().unwrap().as_str(), "ada@example.com");
    }

    #[test]
    fn test_notes_length() {
        let notes = InquiryNotes {
            admin_notes: Some("n".repeat(2001)),
        };
        assert!(notes.validate().is_err());
    }
}
