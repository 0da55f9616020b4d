//! Record-level field validation.
//!
//! Validation failures are local to create/update flows and are kept apart
//! from authorization and transition failures: callers re-render or respond
//! with the per-field messages collected here.

use std::collections::BTreeMap;

use serde::Serialize;

/// Field-keyed validation messages for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    /// An empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Whether no messages were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded against `field`.
    #[must_use]
    pub fn on(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Iterate over `(field, messages)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any were recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Require a non-blank value.
    pub fn required(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "can't be blank");
        }
    }

    /// Cap the length (in characters) of a value.
    pub fn max_len(&mut self, field: &'static str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("is too long (maximum is {max} characters)"));
        }
    }

    /// Cap the length of an optional value.
    pub fn max_len_opt(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            self.max_len(field, value, max);
        }
    }

    /// Require a minimum length (in characters).
    pub fn min_len(&mut self, field: &'static str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(field, format!("is too short (minimum is {min} characters)"));
        }
    }

    fn summary(&self) -> String {
        self.fields
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field} {m}")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: {}", self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

/// Types whose field constraints can be checked before persisting.
pub trait Validate {
    /// Check every field constraint.
    ///
    /// # Errors
    ///
    /// Returns all violated constraints, keyed by field.
    fn validate(&self) -> Result<(), ValidationErrors>;
}
