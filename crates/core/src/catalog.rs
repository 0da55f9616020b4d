//! Portfolio works and the categories that group them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, WorkId};
use crate::validation::{Validate, ValidationErrors};

/// Turn a title or name into a URL slug: lowercase ASCII alphanumerics
/// separated by single hyphens.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch != '\'' {
            pending_dash = true;
        }
    }
    slug
}

/// A slug that does not collide with `taken`, appending `-2`, `-3`, ...
#[must_use]
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_owned();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_owned())
}

/// A piece in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub id: WorkId,
    pub slug: String,
    #[serde(flatten)]
    pub details: WorkDetails,
    pub published: bool,
    pub featured: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDetails {
    pub title: String,
    pub description: Option<String>,
    pub dimensions: Option<String>,
    pub medium: Option<String>,
    pub year_created: Option<i32>,
}

impl WorkDetails {
    /// Validate against the current date.
    ///
    /// # Errors
    ///
    /// Returns every violated field constraint.
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &self.title);
        errors.max_len("title", &self.title, 200);
        errors.max_len_opt("description", self.description.as_deref(), 2000);
        errors.max_len_opt("dimensions", self.dimensions.as_deref(), 100);
        errors.max_len_opt("medium", self.medium.as_deref(), 200);
        if let Some(year) = self.year_created {
            if year <= 1900 {
                errors.add("year_created", "must be greater than 1900");
            } else if year > today.year() {
                errors.add(
                    "year_created",
                    format!("must be less than or equal to {}", today.year()),
                );
            }
        }
        errors.into_result()
    }
}

impl Validate for WorkDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_on(Utc::now().date_naive())
    }
}

impl Work {
    /// Title with the year appended when known.
    #[must_use]
    pub fn full_title(&self) -> String {
        match self.details.year_created {
            Some(year) => format!("{} ({year})", self.details.title),
            None => self.details.title.clone(),
        }
    }

    /// Short description for search engines, at most 160 characters.
    #[must_use]
    pub fn meta_description(&self) -> String {
        match self.details.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => truncate(description, 160),
            _ => format!(
                "{} - Handcrafted stained glass art by Coco",
                self.details.title
            ),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// A gallery grouping such as "Windows" or "Lamps".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    #[serde(flatten)]
    pub details: CategoryDetails,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetails {
    pub name: String,
    pub description: Option<String>,
}

impl Validate for CategoryDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("name", &self.name);
        errors.max_len("name", &self.name, 100);
        errors.max_len_opt("description", self.description.as_deref(), 500);
        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn work(title: &str, year: Option<i32>, description: Option<&str>) -> Work {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        Work {
            id: WorkId::new(1),
            slug: slugify(title),
            details: WorkDetails {
                title: title.to_owned(),
                description: description.map(str::to_owned),
                year_created: year,
                ..WorkDetails::default()
            },
            published: true,
            featured: false,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Tiffany-Style Lamp"), "tiffany-style-lamp");
        assert_eq!(slugify("  Coco's  Rose Window! "), "cocos-rose-window");
        assert_eq!(slugify("Panel #3 (2024)"), "panel-3-2024");
    }

    #[test]
    fn test_unique_slug() {
        let taken = vec!["rose".to_owned(), "rose-2".to_owned()];
        assert_eq!(unique_slug("rose", &taken), "rose-3");
        assert_eq!(unique_slug("iris", &taken), "iris");
    }

    #[test]
    fn test_full_title() {
        assert_eq!(work("Rose", Some(2024), None).full_title(), "Rose (2024)");
        assert_eq!(work("Rose", None, None).full_title(), "Rose");
    }

    #[test]
    fn test_meta_description() {
        assert_eq!(
            work("Rose", None, None).meta_description(),
            "Rose - Handcrafted stained glass art by Coco"
        );
        let long = "a".repeat(300);
        let meta = work("Rose", None, Some(&long)).meta_description();
        assert_eq!(meta.chars().count(), 160);
        assert!(meta.ends_with("..."));
    }

    #[test]
    fn test_year_bounds() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let mut details = WorkDetails {
            title: "Rose".to_owned(),
            year_created: Some(1900),
            ..WorkDetails::default()
        };
        assert!(details.validate_on(today).is_err());
        details.year_created = Some(2026);
        assert!(details.validate_on(today).is_ok());
        details.year_created = Some(2027);
        assert!(details.validate_on(today).is_err());
    }

    #[test]
    fn test_category_validation() {
        let details = CategoryDetails {
            name: String::new(),
            description: Some("d".repeat(501)),
        };
        let errors = details.validate().unwrap_err();
        assert_eq!(errors.iter().count(), 2);
    }
}
