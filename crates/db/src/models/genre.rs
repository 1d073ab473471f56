//! Genre entity model and DTOs.

use marquee_core::types::{DbId, Timestamp};
use marquee_core::validation::{first_letter_uppercase, max_length, required, ValidationErrors, Validator};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum length of a genre name.
pub const GENRE_NAME_MAX: usize = 50;

/// A row from the `genres` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Genre {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or updating a genre.
#[derive(Debug, Clone, Deserialize)]
pub struct GenreInput {
    #[serde(default)]
    pub name: String,
}

impl GenreInput {
    /// Name is required, at most 50 characters, and starts uppercase.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let name = Some(self.name.as_str());
        Validator::new()
            .check(required("name", name))
            .check(max_length("name", name, GENRE_NAME_MAX))
            .check(first_letter_uppercase("name", name))
            .finish()
    }
}
