//! Seed the default gallery categories.
//!
//! Safe to run repeatedly: categories that already exist (matched by slug)
//! are left untouched.

use cocos_glass_core::CategoryDetails;
use cocos_glass_core::catalog::slugify;
use cocos_glass_web::db::{CategoryRepository, RepositoryError};
use tracing::info;

use crate::ConnectError;

/// Name and description of each default category, in display order.
const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("Windows", "Stained glass windows for homes and churches"),
    ("Panels", "Decorative hanging panels"),
    ("Lamps", "Tiffany-style lamps and lighting"),
    ("Mirrors", "Decorative mirrors with stained glass borders"),
    ("Custom", "Custom commissioned pieces"),
];

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A category could not be read or written.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Insert any missing default categories.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn categories() -> Result<(), SeedError> {
    let pool = crate::connect().await?;
    let repo = CategoryRepository::new(&pool);

    let mut created = 0_usize;
    for (position, (name, description)) in (0_i32..).zip(DEFAULT_CATEGORIES) {
        if repo.get_by_slug(&slugify(name)).await?.is_some() {
            info!("  {name}: already present");
            continue;
        }

        let details = CategoryDetails {
            name: name.to_owned(),
            description: Some(description.to_owned()),
        };
        repo.create(&details, position).await?;
        created += 1;
        info!("  {name}: created");
    }

    info!("Seeding complete! {created} categories created");
    Ok(())
}
