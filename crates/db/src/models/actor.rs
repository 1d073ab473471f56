//! Actor entity model and DTOs.

use chrono::NaiveDate;
use marquee_core::types::{DbId, Timestamp};
use marquee_core::validation::{max_length, required, ValidationErrors, Validator};
use serde::Serialize;
use sqlx::FromRow;

/// Maximum length of an actor name.
pub const ACTOR_NAME_MAX: usize = 200;

/// A row from the `actors` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Actor {
    pub id: DbId,
    pub name: String,
    pub biography: Option<String>,
    pub birth_date: NaiveDate,
    pub photo_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or updating an actor.
///
/// On update, a `None` photo keeps the stored one.
#[derive(Debug, Clone)]
pub struct ActorInput {
    pub name: String,
    pub biography: Option<String>,
    pub birth_date: NaiveDate,
    pub photo_url: Option<String>,
}

impl ActorInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let name = Some(self.name.as_str());
        Validator::new()
            .check(required("name", name))
            .check(max_length("name", name, ACTOR_NAME_MAX))
            .finish()
    }
}
